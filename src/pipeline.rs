// Orchestrator: runs the publishing steps strictly in order, threading each
// step's output into the next. The first failure aborts the run; the staged
// image is removed whatever happened after it was downloaded.

use crate::config::Config;
use crate::error::{PipelineError, PublishError, PublishResult, Step};
use crate::stager::StagedFile;
use crate::transport::Transport;
use crate::vk::{RegisteredMedia, VkClient};
use crate::xkcd::{Comic, XkcdClient};
use rand::Rng;
use reqwest::Url;

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub comic_num: u32,
    pub title: String,
    pub attachment: String,
    pub post_id: i64,
}

pub struct Publisher<'a, T: Transport> {
    config: &'a Config,
    xkcd: XkcdClient<'a, T>,
    vk: VkClient<'a, T>,
    transport: &'a T,
}

impl<'a, T: Transport> Publisher<'a, T> {
    pub fn new(config: &'a Config, transport: &'a T) -> Self {
        Publisher {
            config,
            xkcd: XkcdClient::new(transport, &config.xkcd_base_url),
            vk: VkClient::new(
                transport,
                &config.vk_api_url,
                &config.vk_token,
                &config.api_version,
            ),
            transport,
        }
    }

    /// Pick a random comic and publish it.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<PublishReport, PipelineError> {
        let num = self
            .xkcd
            .pick_random_identifier(rng)
            .map_err(|e| PipelineError::new(Step::PickComic, e))?;
        log::info!("Picked comic #{}", num);
        self.publish(num)
    }

    /// Publish comic `num` to the configured community wall.
    pub fn publish(&self, num: u32) -> Result<PublishReport, PipelineError> {
        let comic = self
            .xkcd
            .fetch(num)
            .map_err(|e| PipelineError::new(Step::FetchComic, e).with_detail(format!("comic #{}", num)))?;
        log::info!("Fetched comic #{} \"{}\" ({})", comic.num, comic.title, comic.img_url);

        let staged = StagedFile::download(self.transport, &comic.img_url, &self.config.staged_file)
            .map_err(|e| {
                PipelineError::new(Step::Download, e)
                    .with_detail(format!("comic #{}, {}", comic.num, comic.img_url))
            })?;
        log::info!(
            "Downloaded {} bytes to {}",
            staged.len(),
            staged.path().display()
        );

        let outcome = self.post_staged(&comic, &staged);
        let path = staged.path().to_path_buf();
        let cleanup = staged.cleanup();

        match (outcome, cleanup) {
            (Ok(report), Ok(())) => {
                log::debug!("Removed {}", path.display());
                Ok(report)
            }
            (Ok(_), Err(e)) => Err(PipelineError::new(Step::Cleanup, e)
                .with_detail(path.display().to_string())),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(e)) => {
                log::warn!("Failed to remove {} after failed run: {}", path.display(), e);
                Err(err)
            }
        }
    }

    /// Steps that need the staged file: ticket, upload, register, post.
    fn post_staged(&self, comic: &Comic, staged: &StagedFile) -> Result<PublishReport, PipelineError> {
        let at = |step: Step| {
            let num = comic.num;
            move |e: PublishError| PipelineError::new(step, e).with_detail(format!("comic #{}", num))
        };

        let ticket = self.vk.get_upload_ticket().map_err(at(Step::UploadTicket))?;
        log::info!("Got upload server {}", host_of(&ticket.upload_url));

        let asset = self.vk.upload(&ticket, staged).map_err(at(Step::Upload))?;
        log::info!("Uploaded photo to server {}", asset.server);

        let media = self.vk.register(&asset).map_err(at(Step::Register))?;
        log::info!("Saved wall photo {}", media.attachment());

        let post = self.publish_media(&media, &comic.title).map_err(|e| {
            PipelineError::new(Step::Post, e)
                .with_detail(format!("comic #{}, {}", comic.num, media.attachment()))
        })?;
        log::info!(
            "Published comic #{} to group {} as post {}",
            comic.num,
            self.config.group_id,
            post
        );

        Ok(PublishReport {
            comic_num: comic.num,
            title: comic.title.clone(),
            attachment: media.attachment(),
            post_id: post,
        })
    }

    fn publish_media(&self, media: &RegisteredMedia, title: &str) -> PublishResult<i64> {
        self.vk
            .publish_post(self.config.group_id, media, title)
            .map(|created| created.post_id)
    }
}

/// Upload URLs carry signed query strings and may carry userinfo; only the
/// host is worth logging.
fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| "<invalid url>".to_string())
}
