// 高レベル公開API
// 標準構成のProcessingEngineを簡単に作るための便利な関数

use super::ProcessingEngine;
use crate::{
    demo::AutoDetectDecoder,
    services::{ConsoleProgressReporter, DefaultProcessingConfig, NoOpProgressReporter},
};

/// ProcessingEngine作成のヘルパー関数
///
/// 形式自動判別デコーダーとコンソール出力の標準構成
pub fn create_default_processing_engine(
    max_concurrent: usize,
) -> ProcessingEngine<AutoDetectDecoder, DefaultProcessingConfig, ConsoleProgressReporter> {
    ProcessingEngine::new(
        AutoDetectDecoder::new(),
        DefaultProcessingConfig::new(max_concurrent),
        ConsoleProgressReporter::new(),
    )
}

/// ProcessingEngine作成のヘルパー関数（静音版）
///
/// テストやバックグラウンド処理用
pub fn create_quiet_processing_engine(
    max_concurrent: usize,
) -> ProcessingEngine<AutoDetectDecoder, DefaultProcessingConfig, NoOpProgressReporter> {
    ProcessingEngine::new(
        AutoDetectDecoder::new(),
        DefaultProcessingConfig::new(max_concurrent),
        NoOpProgressReporter::new(),
    )
}
