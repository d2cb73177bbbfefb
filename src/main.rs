use anyhow::{Context, Result};
use overtime_report::{
    cli::Cli, create_default_processing_engine, logging::init_logging,
};
use std::process::ExitCode;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 使い方の誤りはclapがusageを表示して終了する
    let cli = Cli::parse_normalized(std::env::args_os()).unwrap_or_else(|e| e.exit());
    init_logging(cli.verbose)?;

    let target = cli
        .target()
        .context("Error: -dir OR -demo flag is required")?;

    let engine = create_default_processing_engine(cli.max_concurrent);
    let summary = engine
        .process_target(target)
        .await
        .context("batch processing failed")?;

    if summary.has_failures() {
        warn!(failed = summary.failed_files, "some demos could not be processed");
        if cli.fail_on_error {
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}
