// テストユーティリティとフェイク実装
// 統合テスト間で共有するデコーダー・レポーター・デモ生成ヘルパー
#![allow(dead_code, unused_imports)]

pub mod decoders;
pub mod demos;
pub mod reporters;

// 公開API
pub use decoders::*;
pub use demos::*;
pub use reporters::*;
