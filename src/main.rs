// Entrypoint: load `.env`, set up logging, publish one comic.
// - Any failure is logged with the step that produced it and the process
//   exits non-zero; the staged image is already gone by then.

use anyhow::Context;
use std::process::ExitCode;
use xkcd_vk_publisher::{transport::HttpTransport, Config, PublishReport, Publisher};

fn run() -> anyhow::Result<PublishReport> {
    let config = Config::from_env().context("Failed to load configuration")?;
    log::debug!("Loaded {:?}", config);

    let transport =
        HttpTransport::new(config.http_timeout).context("Failed to build HTTP client")?;
    let publisher = Publisher::new(&config, &transport);

    let report = publisher
        .run(&mut rand::thread_rng())
        .context("Publishing run aborted")?;
    Ok(report)
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(report) => {
            log::info!(
                "Done: comic #{} \"{}\" posted as {} (post {})",
                report.comic_num,
                report.title,
                report.attachment,
                report.post_id
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
