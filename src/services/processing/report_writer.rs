// CSVレポートの書き出し

use crate::core::{FileContext, OvertimeOutcome};
use std::io::{self, Write};

/// レポートのヘッダー行
pub const REPORT_HEADER: &str = "Date,Map,Overtime,Winner";

/// 1ファイル分のレポートを書き出すライター
pub struct ReportWriter<W: Write> {
    out: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// ヘッダーと延長戦ごとの行を書き出す
    ///
    /// 延長戦が無ければヘッダーのみ。
    pub fn write_report(
        &mut self,
        context: &FileContext,
        outcomes: &[OvertimeOutcome],
    ) -> io::Result<()> {
        writeln!(self.out, "{REPORT_HEADER}")?;

        let date = context.formatted_modified();
        for outcome in outcomes {
            writeln!(
                self.out,
                "{},{},{},{}",
                date,
                context.map_name(),
                outcome.overtime_count,
                outcome.winner
            )?;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Team;
    use chrono::{Local, TimeZone};
    use std::num::NonZeroU32;

    fn context() -> FileContext {
        let modified = Local.with_ymd_and_hms(2019, 9, 14, 21, 3, 7).unwrap();
        FileContext::new(modified, "de_inferno")
    }

    fn outcome(overtime: u32, winner: Team) -> OvertimeOutcome {
        OvertimeOutcome {
            overtime_count: NonZeroU32::new(overtime).unwrap(),
            winner,
        }
    }

    #[test]
    fn test_header_only_report() {
        let mut out = Vec::new();
        ReportWriter::new(&mut out)
            .write_report(&context(), &[])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Date,Map,Overtime,Winner\n");
    }

    #[test]
    fn test_report_rows_keep_order() {
        let mut out = Vec::new();
        ReportWriter::new(&mut out)
            .write_report(
                &context(),
                &[
                    outcome(1, Team::CounterTerrorists),
                    outcome(1, Team::Terrorists),
                    outcome(2, Team::Unknown(7)),
                ],
            )
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Date,Map,Overtime,Winner",
                "2019-09-14 21:03:07,de_inferno,1,Counter-Terrorists",
                "2019-09-14 21:03:07,de_inferno,1,Terrorists",
                "2019-09-14 21:03:07,de_inferno,2,Unknown",
            ]
        );
    }
}
