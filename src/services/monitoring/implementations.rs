// 進捗監視の具象実装

use crate::core::{DiscoveryTarget, ProcessingSummary, ProgressReporter};
use async_trait::async_trait;
use std::path::Path;

/// コンソール出力による進捗報告実装
///
/// 既存の運用スクリプトが読む行形式をそのまま出力する。
#[derive(Debug, Default, Clone)]
pub struct ConsoleProgressReporter {
    quiet: bool,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

#[async_trait]
impl ProgressReporter for ConsoleProgressReporter {
    async fn report_started(&self, target: &DiscoveryTarget) {
        if self.quiet {
            return;
        }
        match target {
            DiscoveryTarget::Directory(path) => println!("Parsing dir {}", path.display()),
            DiscoveryTarget::SingleFile(_) => {}
        }
    }

    async fn report_dispatched(&self, file_path: &Path) {
        if !self.quiet {
            println!("Parsing demo file: {}", file_path.display());
        }
    }

    async fn report_file_completed(&self, file_path: &Path) {
        if !self.quiet {
            println!("Parsing done for {}", file_path.display());
        }
    }

    async fn report_error(&self, file_path: &Path, error: &str) {
        if !self.quiet {
            eprintln!("Failed: Path={}, Error: {error}", file_path.display());
        }
    }

    async fn report_completed(&self, _summary: &ProcessingSummary) {
        if !self.quiet {
            println!("Parsing done.");
        }
    }
}

/// 何もしない進捗報告実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for NoOpProgressReporter {
    async fn report_started(&self, _target: &DiscoveryTarget) {
        // 何もしない
    }

    async fn report_dispatched(&self, _file_path: &Path) {
        // 何もしない
    }

    async fn report_file_completed(&self, _file_path: &Path) {
        // 何もしない
    }

    async fn report_error(&self, _file_path: &Path, _error: &str) {
        // 何もしない
    }

    async fn report_completed(&self, _summary: &ProcessingSummary) {
        // 何もしない
    }
}
