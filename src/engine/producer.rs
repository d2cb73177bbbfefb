// Producer - 作業アイテムの発見と配信

use crate::core::{DiscoveryTarget, ProcessingError, ProcessingResult, WorkItem};
use crate::file_scanner::FileScanner;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Producer: 発見したファイルを順次チャンネルへ流す
///
/// 走査はブロッキングスレッドで行い、処理と並行して進む。
/// 戻り値は配信したアイテム数。
pub fn spawn_discovery(
    target: DiscoveryTarget,
    scanner: FileScanner,
    work_tx: mpsc::Sender<WorkItem>,
) -> tokio::task::JoinHandle<ProcessingResult<usize>> {
    tokio::task::spawn_blocking(move || match target {
        DiscoveryTarget::SingleFile(path) => {
            // 形式チェックはワーカーに任せる
            let sent = usize::from(work_tx.blocking_send(WorkItem::new(path)).is_ok());
            Ok(sent)
        }
        DiscoveryTarget::Directory(root) => {
            let mut sent = 0;
            let walked = scanner.walk(&root, |item| {
                debug!(path = %item.path().display(), "discovered demo");
                if work_tx.blocking_send(item).is_err() {
                    // チャンネルが閉じられた場合は正常終了
                    return false;
                }
                sent += 1;
                true
            });

            match walked {
                Ok(found) => {
                    info!(root = %root.display(), found, "directory walk finished");
                    Ok(sent)
                }
                Err(error) => Err(ProcessingError::file_discovery(
                    root.display().to_string(),
                    error,
                )),
            }
        }
    })
}
