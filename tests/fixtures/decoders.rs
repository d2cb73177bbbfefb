// スクリプトで動作を指定するフェイクデコーダー
//
// 入力ファイルはテキストで、1行1命令:
//   map <name>          マップ名（先頭のみ）
//   round <ot> <team>   ラウンド終了。<ot> はその時点の延長戦番号
//   win                 最終結果の表示
//   fail <message>      デコードエラー
//   panic <message>     パニック
//   sleep <ms>          指定ミリ秒ブロック

use overtime_report::core::Team;
use overtime_report::demo::{DecodeError, DecodeSession, DemoDecoder, DemoEvent};
use std::collections::VecDeque;
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 同時に開いているセッション数を記録する
#[derive(Debug, Default, Clone)]
pub struct ConcurrencyGauge {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
}

impl ConcurrencyGauge {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default, Clone)]
pub struct ScriptedDecoder {
    gauge: ConcurrencyGauge,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gauge(&self) -> ConcurrencyGauge {
        self.gauge.clone()
    }
}

impl DemoDecoder for ScriptedDecoder {
    fn open(&self, mut source: Box<dyn Read + Send>) -> Result<Box<dyn DecodeSession>, DecodeError> {
        let mut text = String::new();
        source.read_to_string(&mut text)?;

        let mut lines: VecDeque<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        let map_name = match lines.front() {
            Some(line) if line.starts_with("map ") => {
                let name = line["map ".len()..].to_string();
                lines.pop_front();
                name
            }
            Some(line) if line == "invalid" => {
                return Err(DecodeError::InvalidHeader("scripted invalid header".to_string()))
            }
            _ => "de_scripted".to_string(),
        };

        self.gauge.enter();
        Ok(Box::new(ScriptedSession {
            lines,
            map_name,
            overtime_count: 0,
            gauge: self.gauge.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct ScriptedSession {
    lines: VecDeque<String>,
    map_name: String,
    overtime_count: u32,
    gauge: ConcurrencyGauge,
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.gauge.leave();
    }
}

impl DecodeSession for ScriptedSession {
    fn next_event(&mut self) -> Result<Option<DemoEvent>, DecodeError> {
        while let Some(line) = self.lines.pop_front() {
            let mut parts = line.splitn(2, ' ');
            let command = parts.next().unwrap_or_default();
            let rest = parts.next().unwrap_or_default();

            match command {
                "round" => {
                    let mut fields = rest.split_whitespace();
                    let overtime = fields.next().and_then(|v| v.parse().ok()).unwrap_or(0);
                    let team = fields.next().and_then(|v| v.parse().ok()).unwrap_or(0);
                    self.overtime_count = overtime;
                    return Ok(Some(DemoEvent::RoundEnd {
                        winner: Team::from(team),
                    }));
                }
                "win" => return Ok(Some(DemoEvent::WinPanelMatch)),
                "fail" => return Err(DecodeError::Malformed(rest.to_string())),
                "panic" => panic!("{}", rest),
                "sleep" => {
                    let millis = rest.trim().parse().unwrap_or(0);
                    std::thread::sleep(Duration::from_millis(millis));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn overtime_count(&self) -> u32 {
        self.overtime_count
    }

    fn map_name(&self) -> &str {
        &self.map_name
    }
}
