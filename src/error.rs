// Error taxonomy shared by every client and the orchestrator.
// - `PublishError` is what a single call can fail with.
// - `PipelineError` adds which step of the run was executing.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    /// Network failure or a non-2xx HTTP status.
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// HTTP succeeded but the platform embedded an `error` object in the body.
    #[error("VK API error {code}: {message}")]
    PlatformApi { code: i64, message: String },

    #[error("failed to parse {context}: {reason}")]
    Parse { context: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type PublishResult<T> = Result<T, PublishError>;

impl PublishError {
    pub fn transport(url: &str, reason: impl fmt::Display) -> Self {
        Self::Transport {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(context: &str, reason: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn platform(code: i64, message: &str) -> Self {
        Self::PlatformApi {
            code,
            message: message.to_string(),
        }
    }
}

/// One stage of a publishing run, used to label failures and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    PickComic,
    FetchComic,
    Download,
    UploadTicket,
    Upload,
    Register,
    Post,
    Cleanup,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::PickComic => "pick comic",
            Step::FetchComic => "fetch comic",
            Step::Download => "download image",
            Step::UploadTicket => "get upload server",
            Step::Upload => "upload photo",
            Step::Register => "save wall photo",
            Step::Post => "wall post",
            Step::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// A run aborted at `step`. `detail` carries identifiers known at that point
/// (comic number, upload server, media reference) for diagnosis.
#[derive(Error, Debug)]
#[error("step '{step}' failed{}: {source}", fmt_detail(.detail))]
pub struct PipelineError {
    pub step: Step,
    pub detail: Option<String>,
    #[source]
    pub source: PublishError,
}

fn fmt_detail(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default()
}

impl PipelineError {
    pub fn new(step: Step, source: PublishError) -> Self {
        Self {
            step,
            detail: None,
            source,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
