use crate::core::Team;
use mockall::automock;
use std::io::{self, Read};
use thiserror::Error;

pub mod detect;
pub mod events;
pub mod header;
pub mod hl2demo;
pub mod proto;
pub mod source2;
pub mod synth;

pub use detect::{AutoDetectDecoder, DemoFormat};
pub use events::MatchRules;

/// デコード中のエラー
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("不正なデモヘッダー: {0}")]
    InvalidHeader(String),

    #[error("デモが途中で終了しました (offset {offset})")]
    UnexpectedEof { offset: u64 },

    #[error("未知のフレームコマンド {command} (tick {tick})")]
    UnknownCommand { command: u8, tick: i32 },

    #[error("不正なメッセージ: {0}")]
    Malformed(String),

    #[error("protobufデコードエラー: {0}")]
    Protobuf(#[from] prost::DecodeError),

    #[error("snappy展開エラー: {0}")]
    Decompress(#[from] snap::Error),

    #[error("I/Oエラー: {0}")]
    Io(#[from] io::Error),
}

/// デコードセッションが返すドメインイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemoEvent {
    /// ラウンド終了
    RoundEnd { winner: Team },
    /// 試合の最終結果パネル表示
    WinPanelMatch,
}

/// 1ファイル分のデコードセッション
///
/// イベントは `next_event` で1つずつ取り出す（有限・再開不可）。
/// 状態の問い合わせは、直前に取り出したイベント時点の値を返す。
pub trait DecodeSession: Send {
    /// 次のイベント。ストリーム終端ではNone
    fn next_event(&mut self) -> Result<Option<DemoEvent>, DecodeError>;

    /// 現在の延長戦番号（規定ラウンド中は0）
    fn overtime_count(&self) -> u32;

    fn map_name(&self) -> &str;
}

/// デモデコーダーのトレイト
#[automock]
pub trait DemoDecoder: Send + Sync {
    /// 読み込み可能なストリームからセッションを開始する
    fn open(&self, source: Box<dyn Read + Send>) -> Result<Box<dyn DecodeSession>, DecodeError>;

    /// デコーダーの名前を取得
    fn name(&self) -> &'static str;
}
