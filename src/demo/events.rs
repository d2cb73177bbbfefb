// ゲームイベントの解釈
// イベント記述子とConVarを覚え、ラウンド数から延長戦番号を求める

use super::proto::{EventDescriptor, GameEvent, GameEventList, SetConVar};
use super::{DecodeError, DemoEvent};
use crate::core::Team;
use prost::Message;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

/// 規定ラウンド数と延長1回あたりのラウンド数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRules {
    pub max_rounds: u32,
    pub overtime_rounds: u32,
}

impl MatchRules {
    /// CS:GO競技設定 (MR15)
    pub const fn csgo() -> Self {
        Self {
            max_rounds: 30,
            overtime_rounds: 6,
        }
    }

    /// CS2競技設定 (MR12)
    pub const fn cs2() -> Self {
        Self {
            max_rounds: 24,
            overtime_rounds: 6,
        }
    }

    /// `rounds_played` 本目のラウンドが属する延長戦番号（規定内は0）
    pub fn overtime_for_round(&self, rounds_played: u32) -> u32 {
        if self.max_rounds == 0 || rounds_played <= self.max_rounds {
            return 0;
        }
        (rounds_played - self.max_rounds - 1) / self.overtime_rounds.max(1) + 1
    }
}

/// コンテナ形式に依存しないメッセージ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageKind {
    SetConVar,
    GameEventList,
    GameEvent,
}

/// 名前解決済みのゲームイベント
#[derive(Debug, Clone)]
struct ResolvedEvent {
    name: String,
    winner: Option<i32>,
}

/// デコードセッション共通のイベント状態
#[derive(Debug)]
pub(crate) struct GameEventTracker {
    descriptors: HashMap<i32, EventDescriptor>,
    pending: VecDeque<ResolvedEvent>,
    rules: MatchRules,
    rounds_played: u32,
    overtime_count: u32,
}

impl GameEventTracker {
    pub fn new(rules: MatchRules) -> Self {
        Self {
            descriptors: HashMap::new(),
            pending: VecDeque::new(),
            rules,
            rounds_played: 0,
            overtime_count: 0,
        }
    }

    pub fn rules(&self) -> MatchRules {
        self.rules
    }

    pub fn overtime_count(&self) -> u32 {
        self.overtime_count
    }

    /// メッセージ本体をデコードして状態に取り込む
    pub fn handle(&mut self, kind: MessageKind, body: &[u8]) -> Result<(), DecodeError> {
        match kind {
            MessageKind::SetConVar => self.apply_convars(SetConVar::decode(body)?),
            MessageKind::GameEventList => self.load_descriptors(GameEventList::decode(body)?),
            MessageKind::GameEvent => self.queue_event(GameEvent::decode(body)?),
        }
        Ok(())
    }

    /// 保留中のイベントを1つ取り出し、ラウンド状態に反映する
    pub fn next_event(&mut self) -> Option<DemoEvent> {
        while let Some(event) = self.pending.pop_front() {
            if let Some(event) = self.apply(event) {
                return Some(event);
            }
        }
        None
    }

    fn apply_convars(&mut self, message: SetConVar) {
        for cvar in message.convars.into_iter().flat_map(|convars| convars.cvars) {
            let target = match cvar.name.as_str() {
                "mp_maxrounds" => &mut self.rules.max_rounds,
                "mp_overtime_maxrounds" => &mut self.rules.overtime_rounds,
                _ => continue,
            };
            match cvar.value.trim().parse() {
                Ok(parsed) => {
                    *target = parsed;
                    debug!(convar = %cvar.name, value = %cvar.value, "match rule updated");
                }
                Err(_) => trace!(convar = %cvar.name, value = %cvar.value, "ignoring unparsable convar"),
            }
        }
    }

    fn load_descriptors(&mut self, list: GameEventList) {
        for descriptor in list.descriptors {
            self.descriptors.insert(descriptor.event_id, descriptor);
        }
        debug!(count = self.descriptors.len(), "game event descriptors loaded");
    }

    fn queue_event(&mut self, event: GameEvent) {
        let descriptor = self.descriptors.get(&event.event_id);
        let name = match descriptor {
            Some(descriptor) => descriptor.name.clone(),
            None if !event.event_name.is_empty() => event.event_name,
            None => {
                trace!(event_id = event.event_id, "game event without descriptor");
                return;
            }
        };

        // 値は記述子のキー順に並んでいる
        let winner = descriptor.and_then(|descriptor| {
            descriptor
                .keys
                .iter()
                .zip(&event.keys)
                .find(|(key, _)| key.name == "winner")
                .and_then(|(_, value)| value.as_i32())
        });

        self.pending.push_back(ResolvedEvent { name, winner });
    }

    fn apply(&mut self, event: ResolvedEvent) -> Option<DemoEvent> {
        match event.name.as_str() {
            "round_announce_match_start" | "begin_new_match" => {
                self.rounds_played = 0;
                self.overtime_count = 0;
                None
            }
            "round_end" => {
                self.rounds_played += 1;
                self.overtime_count = self.rules.overtime_for_round(self.rounds_played);
                let winner = event.winner.map(Team::from).unwrap_or(Team::Unassigned);
                trace!(
                    round = self.rounds_played,
                    overtime = self.overtime_count,
                    %winner,
                    "round_end"
                );
                Some(DemoEvent::RoundEnd { winner })
            }
            "cs_win_panel_match" => Some(DemoEvent::WinPanelMatch),
            _ => None,
        }
    }
}
