//! CS:GO / CS2デモから延長戦の勝者を抽出し、ファイルごとにCSVレポートを書き出す
//!
//! ディレクトリ走査、セマフォで上限を設けた並列ワーカー、
//! ファイル単位の障害隔離を持つバッチ処理パイプライン。

pub mod cli;
pub mod core;
pub mod demo;
pub mod engine;
pub mod file_scanner;
pub mod logging;
pub mod services;

pub use crate::core::{
    DiscoveryTarget, ProcessingConfig, ProcessingError, ProcessingOutcome, ProcessingResult,
    ProcessingSummary, ProgressReporter, WorkItem,
};
pub use demo::{AutoDetectDecoder, DecodeError, DecodeSession, DemoDecoder, DemoEvent};
pub use engine::{create_default_processing_engine, create_quiet_processing_engine, ProcessingEngine};
pub use services::{ConsoleProgressReporter, DefaultProcessingConfig, NoOpProgressReporter};
