// CLI層 - コマンドライン引数の定義と処理
// ユーザーインターフェースとアプリケーションロジックの橋渡し

pub mod args;

// 公開API
pub use args::{normalize_legacy_flags, Cli};
