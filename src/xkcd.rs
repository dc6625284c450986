// Comic source client for the xkcd JSON API.
//   {base}/info.0.json       latest comic, its `num` is the catalog size
//   {base}/{n}/info.0.json   a single comic

use crate::error::{PublishError, PublishResult};
use crate::transport::Transport;
use rand::Rng;
use serde::Deserialize;

/// xkcd never published a comic #404; requesting it returns HTTP 404.
pub const MISSING_COMIC: u32 = 404;

/// A comic picked for publishing. Read-only, dropped after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comic {
    pub num: u32,
    pub img_url: String,
    pub title: String,
}

#[derive(Deserialize)]
struct CatalogInfo {
    num: u32,
}

#[derive(Deserialize)]
struct ComicInfo {
    img: Option<String>,
    safe_title: Option<String>,
}

pub struct XkcdClient<'a, T: Transport> {
    transport: &'a T,
    base_url: String,
}

impl<'a, T: Transport> XkcdClient<'a, T> {
    pub fn new(transport: &'a T, base_url: &str) -> Self {
        XkcdClient {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Number of the newest comic, i.e. how many comics have been published.
    pub fn catalog_size(&self) -> PublishResult<u32> {
        let url = format!("{}/info.0.json", self.base_url);
        let body = self.transport.get_bytes(&url, &[])?;
        let info: CatalogInfo = serde_json::from_slice(&body)
            .map_err(|e| PublishError::parse("xkcd catalog info", e))?;
        Ok(info.num)
    }

    /// Uniform pick in `[1, catalog_size]`, skipping the missing #404.
    pub fn pick_random_identifier<R: Rng + ?Sized>(&self, rng: &mut R) -> PublishResult<u32> {
        let size = self.catalog_size()?;
        pick_in_catalog(size, rng)
    }

    pub fn fetch(&self, num: u32) -> PublishResult<Comic> {
        let url = format!("{}/{}/info.0.json", self.base_url, num);
        let body = self.transport.get_bytes(&url, &[])?;
        let context = format!("xkcd comic #{}", num);
        let info: ComicInfo =
            serde_json::from_slice(&body).map_err(|e| PublishError::parse(&context, e))?;

        let img_url = non_empty(info.img).ok_or_else(|| PublishError::parse(&context, "missing `img`"))?;
        let title = non_empty(info.safe_title)
            .ok_or_else(|| PublishError::parse(&context, "missing `safe_title`"))?;

        Ok(Comic {
            num,
            img_url,
            title,
        })
    }
}

/// Draws from `[1, size]` until the draw is not the missing comic.
pub fn pick_in_catalog<R: Rng + ?Sized>(size: u32, rng: &mut R) -> PublishResult<u32> {
    if size == 0 {
        return Err(PublishError::parse("xkcd catalog info", "catalog is empty"));
    }
    if size == 1 {
        return Ok(1);
    }
    loop {
        let num = rng.gen_range(1..=size);
        if num != MISSING_COMIC {
            return Ok(num);
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
