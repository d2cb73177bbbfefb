// デモ処理機能
// 単一デモファイルのデコード、延長戦の抽出、レポート出力

pub mod extractor;
pub mod report_writer;
pub mod worker;

// 公開API
pub use extractor::OvertimeExtractor;
pub use report_writer::{ReportWriter, REPORT_HEADER};
pub use worker::{process_demo_file, PartialReportGuard};
