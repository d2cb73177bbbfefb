// Worker - 単一デモファイル処理機能

use super::extractor::OvertimeExtractor;
use super::report_writer::ReportWriter;
use crate::core::{FileContext, ProcessingError, ProcessingResult, WorkItem};
use crate::demo::DemoDecoder;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// 書きかけのレポートを片付けるガード
///
/// `disarm` されないまま破棄されると出力ファイルを削除する。
/// パニックによる巻き戻しでも動作する。
pub struct PartialReportGuard {
    path: PathBuf,
    armed: bool,
}

impl PartialReportGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    /// レポートが完成したので削除しない
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialReportGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed partial report"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => warn!(
                path = %self.path.display(),
                %error,
                "failed to remove partial report"
            ),
        }
    }
}

/// 単一デモファイルの処理
///
/// 同期I/Oを行うため、ブロッキングスレッド上で呼び出す。
pub fn process_demo_file<D>(
    decoder: &D,
    item: &WorkItem,
    report_extension: &str,
) -> ProcessingResult<()>
where
    D: DemoDecoder + ?Sized,
{
    let start_time = Instant::now();
    let input_path = item.path();
    let output_path = item.output_path(report_extension);
    let path_str = display(input_path);

    // 入力を開き、更新日時を取得
    let input = File::open(input_path).map_err(|e| ProcessingError::open(&path_str, e))?;
    let modified = input
        .metadata()
        .and_then(|metadata| metadata.modified())
        .map_err(|e| ProcessingError::open(&path_str, e))?;

    // 出力を作成（以降の失敗では削除される）
    let output = File::create(&output_path)
        .map_err(|e| ProcessingError::write_setup(display(&output_path), e))?;
    let guard = PartialReportGuard::new(&output_path);

    let mut session = decoder
        .open(Box::new(input))
        .map_err(|e| ProcessingError::decode(&path_str, e))?;

    let context = FileContext::from_system_time(modified, session.map_name());
    let mut writer = ReportWriter::new(BufWriter::new(output));
    let mut extractor = OvertimeExtractor::new();

    debug!(path = %path_str, decoder = decoder.name(), map = context.map_name(), "decoding demo");

    loop {
        match session.next_event() {
            Ok(Some(event)) => {
                if extractor.observe(&event, session.overtime_count()) {
                    extractor
                        .flush(&mut writer, &context)
                        .map_err(|e| ProcessingError::report_write(&path_str, e))?;
                }
            }
            Ok(None) => break,
            Err(error) if extractor.is_flushed() => {
                // 最終結果は書き出し済みなのでレポートは残すが、ファイルは失敗扱い
                warn!(path = %path_str, %error, "decode error after final result, keeping report");
                guard.disarm();
                return Err(ProcessingError::decode(&path_str, error));
            }
            Err(error) => return Err(ProcessingError::decode(&path_str, error)),
        }
    }

    extractor
        .flush(&mut writer, &context)
        .map_err(|e| ProcessingError::report_write(&path_str, e))?;
    guard.disarm();

    debug!(
        path = %path_str,
        overtime_rounds = extractor.outcomes().len(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "report written"
    );
    Ok(())
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
