// 呼び出しを記録するレポーター

use async_trait::async_trait;
use overtime_report::core::{DiscoveryTarget, ProcessingSummary, ProgressReporter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Started(DiscoveryTarget),
    Dispatched(PathBuf),
    FileCompleted(PathBuf),
    Error(PathBuf, String),
    Completed(ProcessingSummary),
}

#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<ReportEvent>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<(PathBuf, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Error(path, message) => Some((path, message)),
                _ => None,
            })
            .collect()
    }

    pub fn completed_files(&self) -> Vec<PathBuf> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::FileCompleted(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ReportEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ProgressReporter for RecordingReporter {
    async fn report_started(&self, target: &DiscoveryTarget) {
        self.push(ReportEvent::Started(target.clone()));
    }

    async fn report_dispatched(&self, file_path: &Path) {
        self.push(ReportEvent::Dispatched(file_path.to_path_buf()));
    }

    async fn report_file_completed(&self, file_path: &Path) {
        self.push(ReportEvent::FileCompleted(file_path.to_path_buf()));
    }

    async fn report_error(&self, file_path: &Path, error: &str) {
        self.push(ReportEvent::Error(file_path.to_path_buf(), error.to_string()));
    }

    async fn report_completed(&self, summary: &ProcessingSummary) {
        self.push(ReportEvent::Completed(summary.clone()));
    }
}
