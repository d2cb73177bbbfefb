// 設定管理
// 並列度、チャンネルバッファ、拡張子

pub mod implementations;

// 公開API
pub use implementations::{DefaultProcessingConfig, DEFAULT_MAX_CONCURRENT};
