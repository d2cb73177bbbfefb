// Pipeline - Producer / Dispatcher / Collector パイプライン
// メインパイプライン機能とオーケストレーション

use super::{dispatcher::spawn_dispatcher, producer::spawn_discovery};
use crate::{
    core::{
        DiscoveryTarget, ProcessingConfig, ProcessingError, ProcessingOutcome, ProcessingResult,
        ProcessingSummary, ProgressReporter, WorkItem,
    },
    demo::DemoDecoder,
    file_scanner::FileScanner,
    services::spawn_result_collector,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

/// 発見・処理・集約をつなぐパイプライン
pub struct ProcessingPipeline<D: ?Sized> {
    decoder: Arc<D>,
}

impl<D> ProcessingPipeline<D>
where
    D: DemoDecoder + ?Sized + 'static,
{
    /// 新しいパイプラインを作成
    pub fn new(decoder: Arc<D>) -> Self {
        Self { decoder }
    }

    /// 対象を走査して全ファイルを処理
    ///
    /// 走査エラーの場合も、発見済みのファイルは最後まで処理してからエラーを返す。
    /// 完了報告はどの場合も1回だけ出る。
    pub async fn execute<C, R>(
        &self,
        target: DiscoveryTarget,
        config: &C,
        reporter: Arc<R>,
    ) -> ProcessingResult<ProcessingSummary>
    where
        C: ProcessingConfig + ?Sized,
        R: ProgressReporter + ?Sized + 'static,
    {
        let start_time = Instant::now();

        // Producer-Dispatcher-Collectorチャンネル構築
        let (work_tx, work_rx) = mpsc::channel::<WorkItem>(config.channel_buffer_size());
        let (result_tx, result_rx) =
            mpsc::channel::<ProcessingOutcome>(config.channel_buffer_size());
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_workers()));

        reporter.report_started(&target).await;

        // Producer起動
        let producer_handle = spawn_discovery(
            target,
            FileScanner::new(config.demo_extension()),
            work_tx,
        );

        // Dispatcher起動（result_txの所有権ごと渡す）
        let dispatcher_handle = spawn_dispatcher(
            Arc::clone(&self.decoder),
            Arc::clone(&reporter),
            work_rx,
            result_tx,
            semaphore,
            config.report_extension(),
        );

        // Collector起動
        let collector_handle = spawn_result_collector(result_rx, Arc::clone(&reporter));

        // 3つのタスクは全て待ち切る。エラーはその後で返す
        let (discovery, dispatched, collected) =
            tokio::join!(producer_handle, dispatcher_handle, collector_handle);
        let counts = collected.as_ref().copied().unwrap_or_default();

        if let Ok(&dispatched) = dispatched.as_ref() {
            if counts.total() != dispatched {
                warn!(dispatched, collected = counts.total(), "result count mismatch");
            }
        }

        let summary = ProcessingSummary {
            total_files: counts.total(),
            succeeded_files: counts.succeeded,
            failed_files: counts.failed,
            total_processing_time_ms: start_time.elapsed().as_millis() as u64,
        };

        reporter.report_completed(&summary).await;
        info!(
            total = summary.total_files,
            succeeded = summary.succeeded_files,
            failed = summary.failed_files,
            elapsed_ms = summary.total_processing_time_ms,
            "batch finished"
        );

        collected.map_err(ProcessingError::task)?;
        dispatched.map_err(ProcessingError::task)?;
        discovery.map_err(ProcessingError::task)??;
        Ok(summary)
    }
}
