// Library root
// ------------
// Republishes a random xkcd comic to a VK community wall. The binary
// (`main.rs`) loads configuration, builds the HTTP transport and hands both
// to `pipeline::Publisher`.
//
// Module responsibilities:
// - `config`: environment-derived settings (token, group id, endpoints).
// - `error`: the error taxonomy and the step labels used in failures.
// - `transport`: the blocking HTTP seam all clients talk through.
// - `xkcd`: comic catalog lookup, random pick and metadata fetch.
// - `stager`: the local file holding the image between download and upload.
// - `vk`: VK upload server, photo registration and wall post calls.
// - `pipeline`: runs the steps in order and guarantees cleanup.
pub mod config;
pub mod error;
pub mod pipeline;
pub mod stager;
pub mod transport;
pub mod vk;
pub mod xkcd;

pub use config::Config;
pub use error::{PipelineError, PublishError, PublishResult, Step};
pub use pipeline::{PublishReport, Publisher};
