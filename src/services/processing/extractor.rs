// イベント抽出
// デコードセッションのイベント列から延長戦の勝者を集める

use super::report_writer::ReportWriter;
use crate::core::{FileContext, OvertimeOutcome};
use crate::demo::DemoEvent;
use std::io::{self, Write};
use std::num::NonZeroU32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractorState {
    Accumulating,
    /// 書き出し済み。以降は何も書かない
    Flushed,
}

/// 1ファイル分の延長戦結果を蓄積する
#[derive(Debug)]
pub struct OvertimeExtractor {
    outcomes: Vec<OvertimeOutcome>,
    state: ExtractorState,
}

impl Default for OvertimeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl OvertimeExtractor {
    pub fn new() -> Self {
        Self {
            outcomes: Vec::new(),
            state: ExtractorState::Accumulating,
        }
    }

    /// イベントを1つ取り込む
    ///
    /// `overtime_count` はイベント取得直後のセッションの延長戦番号。
    /// 即時の書き出しが必要な場合（最終結果の表示）にtrueを返す。
    pub fn observe(&mut self, event: &DemoEvent, overtime_count: u32) -> bool {
        if self.is_flushed() {
            return false;
        }

        match event {
            DemoEvent::RoundEnd { winner } => {
                // 規定ラウンドは対象外
                if let Some(overtime_count) = NonZeroU32::new(overtime_count) {
                    self.outcomes.push(OvertimeOutcome {
                        overtime_count,
                        winner: *winner,
                    });
                }
                false
            }
            DemoEvent::WinPanelMatch => true,
        }
    }

    /// レポートを書き出す。2回目以降は何もしない
    ///
    /// 実際に書き出した場合にtrue。
    pub fn flush<W: Write>(
        &mut self,
        writer: &mut ReportWriter<W>,
        context: &FileContext,
    ) -> io::Result<bool> {
        if self.is_flushed() {
            return Ok(false);
        }
        writer.write_report(context, &self.outcomes)?;
        self.state = ExtractorState::Flushed;
        Ok(true)
    }

    pub fn is_flushed(&self) -> bool {
        self.state == ExtractorState::Flushed
    }

    pub fn outcomes(&self) -> &[OvertimeOutcome] {
        &self.outcomes
    }
}
