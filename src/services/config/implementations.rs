// 設定管理の具象実装

use crate::core::ProcessingConfig;

/// 同時処理数のデフォルト
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

const DEFAULT_BUFFER_SIZE: usize = 100;
const DEMO_EXTENSION: &str = "dem";
const REPORT_EXTENSION: &str = "csv";

/// デフォルト設定実装
#[derive(Debug, Clone)]
pub struct DefaultProcessingConfig {
    max_concurrent: usize,
    buffer_size: usize,
}

impl DefaultProcessingConfig {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

impl Default for DefaultProcessingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

impl ProcessingConfig for DefaultProcessingConfig {
    fn max_concurrent_workers(&self) -> usize {
        self.max_concurrent
    }

    fn channel_buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn demo_extension(&self) -> &'static str {
        DEMO_EXTENSION
    }

    fn report_extension(&self) -> &'static str {
        REPORT_EXTENSION
    }
}
