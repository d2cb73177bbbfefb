//! 合成デモの組み立て
//!
//! 実際のコンテナ形式 (CS:GOのHL2DEMO、CS2のPBDEMS2) でバイト列を作る。
//! テストとベンチマークで本物のデコーダーを通すために使う。

use super::detect::DemoFormat;
use super::header::DemoHeader;
use super::hl2demo::{
    CMD_INFO_SIZE, CMD_PACKET, CMD_SIGNON, CMD_STOP, CMD_SYNCTICK, NET_SET_CONVAR,
    SVC_GAME_EVENT, SVC_GAME_EVENT_LIST,
};
use super::proto::{
    ConVar, ConVars, DemoFileHeader, DemoPacket, DescriptorKey, EventDescriptor, EventKey,
    GameEvent, GameEventList, SetConVar,
};
use super::source2;
use prost::Message;
use std::io;
use std::path::Path;

const KEY_TYPE_STRING: i32 = 1;
const KEY_TYPE_BYTE: i32 = 5;

const EVENT_ROUND_END: i32 = 42;
const EVENT_WIN_PANEL_MATCH: i32 = 43;
const EVENT_MATCH_START: i32 = 44;

/// ゲームイベント記述子テーブル
const EVENT_TABLE: &[(i32, &str, &[(&str, i32)])] = &[
    (
        EVENT_ROUND_END,
        "round_end",
        &[
            ("winner", KEY_TYPE_BYTE),
            ("reason", KEY_TYPE_BYTE),
            ("message", KEY_TYPE_STRING),
        ],
    ),
    (EVENT_WIN_PANEL_MATCH, "cs_win_panel_match", &[]),
    (EVENT_MATCH_START, "round_announce_match_start", &[]),
];

const TICKS_PER_EVENT: u32 = 64;

/// 合成デモのビルダー
#[derive(Debug, Clone)]
pub struct DemoBuilder {
    format: DemoFormat,
    map_name: String,
    convars: Vec<(String, String)>,
    events: Vec<GameEvent>,
    compressed: bool,
}

impl DemoBuilder {
    /// CS:GO (HL2DEMO) 形式
    pub fn new(map_name: &str) -> Self {
        Self::with_format(DemoFormat::Hl2Demo, map_name)
    }

    /// CS2 (PBDEMS2) 形式
    pub fn source2(map_name: &str) -> Self {
        Self::with_format(DemoFormat::Source2, map_name)
    }

    pub fn with_format(format: DemoFormat, map_name: &str) -> Self {
        Self {
            format,
            map_name: map_name.to_string(),
            convars: Vec::new(),
            events: Vec::new(),
            compressed: false,
        }
    }

    /// コマンド本体をsnappy圧縮する (PBDEMS2のみ)
    pub fn compressed(mut self) -> Self {
        self.compressed = true;
        self
    }

    /// signon時に送られるConVar
    pub fn convar(mut self, name: &str, value: &str) -> Self {
        self.convars.push((name.to_string(), value.to_string()));
        self
    }

    pub fn match_start(mut self) -> Self {
        self.events.push(game_event(EVENT_MATCH_START, Vec::new()));
        self
    }

    /// 勝者のチーム番号付きでラウンド終了
    pub fn round_end(mut self, winner: i32) -> Self {
        let byte_key = |value| EventKey {
            r#type: KEY_TYPE_BYTE,
            val_byte: Some(value),
            ..EventKey::default()
        };
        let message_key = EventKey {
            r#type: KEY_TYPE_STRING,
            val_string: Some("#SFUI_Notice_Round_Win".to_string()),
            ..EventKey::default()
        };

        self.events.push(game_event(
            EVENT_ROUND_END,
            vec![byte_key(winner), byte_key(9), message_key],
        ));
        self
    }

    pub fn rounds(self, winners: impl IntoIterator<Item = i32>) -> Self {
        winners
            .into_iter()
            .fold(self, |builder, winner| builder.round_end(winner))
    }

    pub fn win_panel_match(mut self) -> Self {
        self.events.push(game_event(EVENT_WIN_PANEL_MATCH, Vec::new()));
        self
    }

    /// 終端コマンドで終わる完全なデモ
    pub fn build(&self) -> Vec<u8> {
        self.assemble(true)
    }

    /// 終端コマンドの無い（途中で切れた）デモ
    pub fn build_without_stop(&self) -> Vec<u8> {
        self.assemble(false)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(path, self.build())
    }

    fn assemble(&self, with_stop: bool) -> Vec<u8> {
        match self.format {
            DemoFormat::Hl2Demo => self.assemble_hl2demo(with_stop),
            DemoFormat::Source2 => self.assemble_source2(with_stop),
        }
    }

    fn stop_tick(&self) -> u32 {
        (self.events.len() as u32 + 1) * TICKS_PER_EVENT
    }

    fn assemble_hl2demo(&self, with_stop: bool) -> Vec<u8> {
        let mut out = DemoHeader::for_map(&self.map_name).to_bytes();

        let mut signon = Vec::new();
        push_message(&mut signon, SVC_GAME_EVENT_LIST, &event_list().encode_to_vec());
        if !self.convars.is_empty() {
            push_message(
                &mut signon,
                NET_SET_CONVAR,
                &convar_message(&self.convars).encode_to_vec(),
            );
        }
        push_packet_frame(&mut out, CMD_SIGNON, 0, &signon);
        push_bare_frame(&mut out, CMD_SYNCTICK, 0);

        for (index, event) in self.events.iter().enumerate() {
            let mut packet = Vec::new();
            push_message(&mut packet, SVC_GAME_EVENT, &event.encode_to_vec());
            let tick = (index as u32 + 1) * TICKS_PER_EVENT;
            push_packet_frame(&mut out, CMD_PACKET, tick as i32, &packet);
        }

        if with_stop {
            push_bare_frame(&mut out, CMD_STOP, self.stop_tick() as i32);
        }
        out
    }

    fn assemble_source2(&self, with_stop: bool) -> Vec<u8> {
        let mut out = source2::SOURCE2_MAGIC.to_vec();
        // fileinfo / spawngroups のオフセットは使わない
        out.extend_from_slice(&[0u8; source2::PREAMBLE_SIZE - 8]);

        let header = DemoFileHeader {
            demo_file_stamp: "PBDEMS2".to_string(),
            network_protocol: 14_000,
            map_name: self.map_name.clone(),
            game_directory: "csgo".to_string(),
            ..DemoFileHeader::default()
        };
        self.push_command(&mut out, source2::DEM_FILE_HEADER, 0, header.encode_to_vec());

        let mut signon = BitWriter::default();
        signon.write_message(source2::GE_LEGACY_GAME_EVENT_LIST, &event_list().encode_to_vec());
        if !self.convars.is_empty() {
            signon.write_message(
                source2::NET_SET_CONVAR,
                &convar_message(&self.convars).encode_to_vec(),
            );
        }
        self.push_packet(&mut out, source2::DEM_SIGNON_PACKET, 0, signon);
        self.push_command(&mut out, source2::DEM_SYNC_TICK, 0, Vec::new());

        for (index, event) in self.events.iter().enumerate() {
            let mut packet = BitWriter::default();
            packet.write_message(source2::GE_LEGACY_GAME_EVENT, &event.encode_to_vec());
            let tick = (index as u32 + 1) * TICKS_PER_EVENT;
            self.push_packet(&mut out, source2::DEM_PACKET, tick, packet);
        }

        if with_stop {
            self.push_command(&mut out, source2::DEM_STOP, self.stop_tick(), Vec::new());
        }
        out
    }

    fn push_packet(&self, out: &mut Vec<u8>, kind: u32, tick: u32, bits: BitWriter) {
        let packet = DemoPacket {
            data: bits.into_bytes(),
        };
        self.push_command(out, kind, tick, packet.encode_to_vec());
    }

    fn push_command(&self, out: &mut Vec<u8>, kind: u32, tick: u32, data: Vec<u8>) {
        // 圧縮できなければ非圧縮のまま書く
        let packed = self
            .compressed
            .then(|| snap::raw::Encoder::new().compress_vec(&data).ok())
            .flatten();
        let (kind, data) = match packed {
            Some(packed) => (kind | source2::DEM_IS_COMPRESSED, packed),
            None => (kind, data),
        };

        prost::encoding::encode_varint(u64::from(kind), out);
        prost::encoding::encode_varint(u64::from(tick), out);
        prost::encoding::encode_varint(data.len() as u64, out);
        out.extend_from_slice(&data);
    }
}

fn game_event(event_id: i32, keys: Vec<EventKey>) -> GameEvent {
    GameEvent {
        event_id,
        keys,
        ..GameEvent::default()
    }
}

fn event_list() -> GameEventList {
    GameEventList {
        descriptors: EVENT_TABLE
            .iter()
            .map(|(event_id, name, keys)| EventDescriptor {
                event_id: *event_id,
                name: name.to_string(),
                keys: keys
                    .iter()
                    .map(|(key_name, key_type)| DescriptorKey {
                        r#type: *key_type,
                        name: key_name.to_string(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn convar_message(convars: &[(String, String)]) -> SetConVar {
    SetConVar {
        convars: Some(ConVars {
            cvars: convars
                .iter()
                .map(|(name, value)| ConVar {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
        }),
    }
}

/// HL2DEMOのメッセージ: varint id + varint長 + 本体
fn push_message(buf: &mut Vec<u8>, message_id: u64, body: &[u8]) {
    prost::encoding::encode_varint(message_id, buf);
    prost::encoding::encode_varint(body.len() as u64, buf);
    buf.extend_from_slice(body);
}

fn push_bare_frame(out: &mut Vec<u8>, command: u8, tick: i32) {
    out.push(command);
    out.extend_from_slice(&tick.to_le_bytes());
    out.push(0);
}

fn push_packet_frame(out: &mut Vec<u8>, command: u8, tick: i32, payload: &[u8]) {
    push_bare_frame(out, command, tick);
    // コマンド情報とシーケンス番号はゼロ埋め
    out.extend_from_slice(&[0u8; CMD_INFO_SIZE + 8]);
    out.extend_from_slice(&(payload.len() as i32).to_le_bytes());
    out.extend_from_slice(payload);
}

/// LSB優先のビットライター
#[derive(Debug, Default)]
struct BitWriter {
    buf: Vec<u8>,
    bits: usize,
}

impl BitWriter {
    fn write_bits(&mut self, value: u32, count: u32) {
        for index in 0..count {
            if self.bits % 8 == 0 {
                self.buf.push(0);
            }
            let bit = ((value >> index) & 1) as u8;
            let last = self.buf.len() - 1;
            self.buf[last] |= bit << (self.bits % 8);
            self.bits += 1;
        }
    }

    fn write_ubitvar(&mut self, value: u32) {
        match value >> 4 {
            0 => self.write_bits(value, 6),
            high if high < 16 => {
                self.write_bits((value & 15) | 16, 6);
                self.write_bits(high, 4);
            }
            high if high < 256 => {
                self.write_bits((value & 15) | 32, 6);
                self.write_bits(high, 8);
            }
            high => {
                self.write_bits((value & 15) | 48, 6);
                self.write_bits(high, 28);
            }
        }
    }

    /// ubitvarのid + varint長 + 本体
    fn write_message(&mut self, message_id: u32, body: &[u8]) {
        self.write_ubitvar(message_id);
        let mut size = Vec::new();
        prost::encoding::encode_varint(body.len() as u64, &mut size);
        for byte in size.iter().chain(body) {
            self.write_bits(u32::from(*byte), 8);
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
