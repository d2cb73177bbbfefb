// バッチ処理システムのトレイト定義

use super::types::{DiscoveryTarget, ProcessingSummary};
use async_trait::async_trait;
use mockall::automock;
use std::path::Path;

/// バッチ処理の設定を抽象化するトレイト
#[automock]
pub trait ProcessingConfig: Send + Sync {
    /// 同時に処理するファイル数の上限
    fn max_concurrent_workers(&self) -> usize;

    /// チャンネルバッファサイズを取得
    fn channel_buffer_size(&self) -> usize;

    /// 処理対象ファイルの拡張子（ドットなし）
    fn demo_extension(&self) -> &'static str;

    /// 出力レポートの拡張子（ドットなし）
    fn report_extension(&self) -> &'static str;
}

/// 進捗報告の抽象化トレイト
#[automock]
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// 処理開始時の報告
    async fn report_started(&self, target: &DiscoveryTarget);

    /// ファイルがワーカーに割り当てられた時の報告
    async fn report_dispatched(&self, file_path: &Path);

    /// ファイル単位の処理成功の報告
    async fn report_file_completed(&self, file_path: &Path);

    /// エラー発生時の報告
    async fn report_error(&self, file_path: &Path, error: &str);

    /// 処理完了時の報告
    async fn report_completed(&self, summary: &ProcessingSummary);
}

// ProgressReporter for Box<dyn ProgressReporter>
#[async_trait]
impl ProgressReporter for Box<dyn ProgressReporter> {
    async fn report_started(&self, target: &DiscoveryTarget) {
        self.as_ref().report_started(target).await
    }

    async fn report_dispatched(&self, file_path: &Path) {
        self.as_ref().report_dispatched(file_path).await
    }

    async fn report_file_completed(&self, file_path: &Path) {
        self.as_ref().report_file_completed(file_path).await
    }

    async fn report_error(&self, file_path: &Path, error: &str) {
        self.as_ref().report_error(file_path, error).await
    }

    async fn report_completed(&self, summary: &ProcessingSummary) {
        self.as_ref().report_completed(summary).await
    }
}
