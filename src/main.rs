//! Command-line entry point
//!
//! Moderates a single video file and prints the resulting report as
//! JSON. Exit code is non-zero when the pipeline itself fails (decode,
//! engine or collaborator errors), zero for any reached verdict
//! including rejections.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use moderation_core::logic::pipeline::moderate_video;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args_os().skip(1);
    let path = match (args.next(), args.next()) {
        (Some(path), None) => PathBuf::from(path),
        _ => {
            eprintln!("usage: moderation-core <video-file>");
            return ExitCode::from(2);
        }
    };

    let started = Instant::now();
    match moderate_video(path).await {
        Ok(outcome) => {
            log::info!(
                "moderation finished in {:.2}s",
                started.elapsed().as_secs_f64()
            );
            match serde_json::to_string_pretty(&outcome) {
                Ok(json) => println!("{}", json),
                Err(_) => println!("{}", outcome.message()),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("moderation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
