// 進捗監視機能
// 処理開始、ファイル単位の完了・エラー、全体完了の通知

pub mod implementations;

// 公開API
pub use implementations::{ConsoleProgressReporter, NoOpProgressReporter};
