// 結果集約機能
// ワーカーの結果を受け取り、成功・失敗を報告して集計する

pub mod collector;

// 公開API
pub use collector::{spawn_result_collector, CollectedCounts};
