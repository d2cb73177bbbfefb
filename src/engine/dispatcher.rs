// Dispatcher - 並列ワーカーの起動と回収

use crate::{
    core::{ProcessingError, ProcessingOutcome, ProgressReporter, WorkItem},
    demo::DemoDecoder,
    services::processing::process_demo_file,
};
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Dispatcher: アイテムごとにパーミットを取得してワーカーを起動する
///
/// 全ワーカーの終了を待ってから戻るので、戻った時点で
/// 結果チャンネルの送信側は全て閉じている。戻り値は起動したワーカー数。
pub fn spawn_dispatcher<D, R>(
    decoder: Arc<D>,
    reporter: Arc<R>,
    mut work_rx: mpsc::Receiver<WorkItem>,
    result_tx: mpsc::Sender<ProcessingOutcome>,
    semaphore: Arc<Semaphore>,
    report_extension: &'static str,
) -> tokio::task::JoinHandle<usize>
where
    D: DemoDecoder + ?Sized + 'static,
    R: ProgressReporter + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut workers = JoinSet::new();
        let mut dispatched = 0;

        while let Some(item) = work_rx.recv().await {
            // セマフォで同時実行数制御
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(closed) => {
                    // セマフォは閉じないので到達しない想定
                    let error = ProcessingError::channel(format!("semaphore closed: {closed}"));
                    error!(path = %item.path().display(), %error, "cannot dispatch");
                    let _ = result_tx
                        .send(ProcessingOutcome::Failure {
                            file_path: item.path().to_path_buf(),
                            error,
                        })
                        .await;
                    continue;
                }
            };

            reporter.report_dispatched(item.path()).await;
            workers.spawn(run_worker(
                Arc::clone(&decoder),
                item,
                report_extension,
                permit,
                result_tx.clone(),
            ));
            dispatched += 1;

            // 終わったワーカーを回収
            while let Some(joined) = workers.try_join_next() {
                log_join_failure(joined);
            }
        }

        while let Some(joined) = workers.join_next().await {
            log_join_failure(joined);
        }

        debug!(dispatched, "all workers finished");
        dispatched
    })
}

/// 1ファイル分のワーカー
///
/// どんな失敗でも必ず1つの結果を送る。
async fn run_worker<D>(
    decoder: Arc<D>,
    item: WorkItem,
    report_extension: &'static str,
    permit: OwnedSemaphorePermit,
    result_tx: mpsc::Sender<ProcessingOutcome>,
) where
    D: DemoDecoder + ?Sized + 'static,
{
    let file_path = item.path().to_path_buf();
    debug!(path = %file_path.display(), "worker started");

    let joined = tokio::task::spawn_blocking(move || {
        process_demo_file(decoder.as_ref(), &item, report_extension)
    })
    .await;
    drop(permit);

    let outcome = match joined {
        Ok(Ok(())) => ProcessingOutcome::Success { file_path },
        Ok(Err(error)) => ProcessingOutcome::Failure { file_path, error },
        Err(join_error) => {
            // 書きかけのレポートは巻き戻し中に削除済み
            error!(path = %file_path.display(), "worker panicked");
            let error =
                ProcessingError::worker_panicked(file_path.display().to_string(), join_error);
            ProcessingOutcome::Failure { file_path, error }
        }
    };

    if result_tx.send(outcome).await.is_err() {
        warn!("result channel closed before worker finished");
    }
}

fn log_join_failure(joined: Result<(), tokio::task::JoinError>) {
    if let Err(join_error) = joined {
        error!(error = %join_error, "worker task failed");
    }
}
