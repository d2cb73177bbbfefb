// Collector - 結果収集機能

use crate::core::{ProcessingOutcome, ProgressReporter};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// 集計結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectedCounts {
    pub succeeded: usize,
    pub failed: usize,
}

impl CollectedCounts {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Collector: チャンネルが閉じるまで結果を受け取り続ける
///
/// 失敗はファイル単位で報告するだけで、バッチを止めない。
pub fn spawn_result_collector<R>(
    mut result_rx: mpsc::Receiver<ProcessingOutcome>,
    reporter: Arc<R>,
) -> tokio::task::JoinHandle<CollectedCounts>
where
    R: ProgressReporter + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut counts = CollectedCounts::default();

        while let Some(outcome) = result_rx.recv().await {
            match outcome {
                ProcessingOutcome::Success { file_path } => {
                    debug!(path = %file_path.display(), "file succeeded");
                    reporter.report_file_completed(&file_path).await;
                    counts.succeeded += 1;
                }
                ProcessingOutcome::Failure { file_path, error: failure } => {
                    // ファイル起因でない失敗 (セマフォ停止など) は目立たせる
                    if failure.is_recoverable() {
                        warn!(
                            path = %file_path.display(),
                            severity = failure.severity().as_str(),
                            error = %failure,
                            "file failed"
                        );
                    } else {
                        error!(
                            path = %file_path.display(),
                            severity = failure.severity().as_str(),
                            error = %failure,
                            "file failed outside the decoder"
                        );
                    }
                    reporter.report_error(&file_path, &failure.to_string()).await;
                    counts.failed += 1;
                }
            }
        }

        counts
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::MockProgressReporter;
    use crate::core::ProcessingError;
    use crate::services::monitoring::NoOpProgressReporter;
    use std::path::PathBuf;

    fn failure(path: &str) -> ProcessingOutcome {
        ProcessingOutcome::Failure {
            file_path: PathBuf::from(path),
            error: ProcessingError::open(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            ),
        }
    }

    #[tokio::test]
    async fn test_result_collector_counts_results() {
        let (result_tx, result_rx) = mpsc::channel::<ProcessingOutcome>(10);
        let collector_handle =
            spawn_result_collector(result_rx, Arc::new(NoOpProgressReporter::new()));

        for i in 0..3 {
            result_tx
                .send(ProcessingOutcome::Success {
                    file_path: PathBuf::from(format!("/demos/{i}.dem")),
                })
                .await
                .unwrap();
        }
        result_tx.send(failure("/demos/bad.dem")).await.unwrap();
        drop(result_tx); // チャンネル終了

        let counts = collector_handle.await.unwrap();
        assert_eq!(
            counts,
            CollectedCounts {
                succeeded: 3,
                failed: 1
            }
        );
        assert_eq!(counts.total(), 4);
    }

    #[tokio::test]
    async fn test_result_collector_reports_each_outcome() {
        let mut reporter = MockProgressReporter::new();
        reporter
            .expect_report_file_completed()
            .withf(|path| path.ends_with("good.dem"))
            .times(1)
            .return_const(());
        reporter
            .expect_report_error()
            .withf(|path, error| path.ends_with("bad.dem") && error.contains("gone"))
            .times(1)
            .return_const(());

        let (result_tx, result_rx) = mpsc::channel::<ProcessingOutcome>(10);
        let collector_handle = spawn_result_collector(result_rx, Arc::new(reporter));

        result_tx
            .send(ProcessingOutcome::Success {
                file_path: PathBuf::from("/demos/good.dem"),
            })
            .await
            .unwrap();
        result_tx.send(failure("/demos/bad.dem")).await.unwrap();
        drop(result_tx);

        collector_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_result_collector_empty_channel() {
        let (result_tx, result_rx) = mpsc::channel::<ProcessingOutcome>(1);
        drop(result_tx);

        let counts = spawn_result_collector(result_rx, Arc::new(NoOpProgressReporter::new()))
            .await
            .unwrap();
        assert_eq!(counts, CollectedCounts::default());
    }
}
