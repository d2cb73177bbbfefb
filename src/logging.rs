// ログ初期化

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// tracingサブスクライバーを初期化する
///
/// RUST_LOGが設定されていればそちらを優先する。出力は標準エラー。
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_directives = if verbose {
        "overtime_report=debug,warn"
    } else {
        "overtime_report=info,warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))
}
