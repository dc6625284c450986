// Runtime configuration, read once from the environment at start-up.
// The binary loads `.env` first (see main.rs); the library only sees values.

use crate::error::{PublishError, PublishResult};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_VERSION: &str = "5.131";
pub const DEFAULT_VK_API_URL: &str = "https://api.vk.com/method";
pub const DEFAULT_XKCD_BASE_URL: &str = "https://xkcd.com";
pub const DEFAULT_COMIC_FILENAME: &str = "comic.png";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything a publishing run needs. Passed explicitly to the clients.
#[derive(Clone)]
pub struct Config {
    /// VK access token (`VK_TOKEN`).
    pub vk_token: String,
    /// Community id without the leading minus (`GROUP_ID`).
    pub group_id: u64,
    pub api_version: String,
    pub vk_api_url: String,
    pub xkcd_base_url: String,
    /// Where the image is staged between download and upload.
    pub staged_file: PathBuf,
    pub http_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("vk_token", &"<redacted>")
            .field("group_id", &self.group_id)
            .field("api_version", &self.api_version)
            .field("vk_api_url", &self.vk_api_url)
            .field("xkcd_base_url", &self.xkcd_base_url)
            .field("staged_file", &self.staged_file)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl Config {
    /// Build the config from process environment variables.
    pub fn from_env() -> PublishResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> PublishResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| PublishError::Config(format!("{} is not set", key)))
        };

        let vk_token = require("VK_TOKEN")?;
        let group_id = parse_group_id(&require("GROUP_ID")?)?;

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    PublishError::Config(format!("HTTP_TIMEOUT_SECS is not a number: {}", raw))
                })?;
                if secs == 0 {
                    return Err(PublishError::Config(
                        "HTTP_TIMEOUT_SECS must be greater than zero".into(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Config {
            vk_token,
            group_id,
            api_version: get("VK_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.into()),
            vk_api_url: trim_slash(get("VK_API_URL").unwrap_or_else(|| DEFAULT_VK_API_URL.into())),
            xkcd_base_url: trim_slash(
                get("XKCD_BASE_URL").unwrap_or_else(|| DEFAULT_XKCD_BASE_URL.into()),
            ),
            staged_file: PathBuf::from(
                get("COMIC_FILENAME").unwrap_or_else(|| DEFAULT_COMIC_FILENAME.into()),
            ),
            http_timeout,
        })
    }
}

/// Accepts `123` as well as the wall-owner form `-123`.
fn parse_group_id(raw: &str) -> PublishResult<u64> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    match digits.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(PublishError::Config(format!(
            "GROUP_ID must be a positive integer, got {}",
            raw
        ))),
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
