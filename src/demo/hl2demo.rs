// CS:GO (Source 1) のデモコンテナを読むデコーダー
// フレームを順に読み、パケット内のゲームイベントだけを取り出す

use super::events::{GameEventTracker, MatchRules, MessageKind};
use super::header::{DemoHeader, HEADER_SIZE};
use super::{DecodeError, DecodeSession, DemoDecoder, DemoEvent};
use std::io::{self, BufReader, Read};
use tracing::{debug, trace};

// フレームコマンド
pub(crate) const CMD_SIGNON: u8 = 1;
pub(crate) const CMD_PACKET: u8 = 2;
pub(crate) const CMD_SYNCTICK: u8 = 3;
pub(crate) const CMD_CONSOLECMD: u8 = 4;
pub(crate) const CMD_USERCMD: u8 = 5;
pub(crate) const CMD_DATATABLES: u8 = 6;
pub(crate) const CMD_STOP: u8 = 7;
pub(crate) const CMD_CUSTOMDATA: u8 = 8;
pub(crate) const CMD_STRINGTABLES: u8 = 9;

/// signon/packetフレームのコマンド情報 (split screen 2人分)
pub(crate) const CMD_INFO_SIZE: usize = 152;

/// 1フレームのペイロード上限
const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

// ネットメッセージID
pub(crate) const NET_SET_CONVAR: u64 = 6;
pub(crate) const SVC_GAME_EVENT: u64 = 25;
pub(crate) const SVC_GAME_EVENT_LIST: u64 = 30;

fn message_kind(message_id: u64) -> Option<MessageKind> {
    match message_id {
        NET_SET_CONVAR => Some(MessageKind::SetConVar),
        SVC_GAME_EVENT_LIST => Some(MessageKind::GameEventList),
        SVC_GAME_EVENT => Some(MessageKind::GameEvent),
        _ => None,
    }
}

/// HL2DEMOコンテナのデコーダー
#[derive(Debug, Clone, Copy, Default)]
pub struct Hl2DemoDecoder;

impl Hl2DemoDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl DemoDecoder for Hl2DemoDecoder {
    fn open(&self, source: Box<dyn Read + Send>) -> Result<Box<dyn DecodeSession>, DecodeError> {
        Ok(Box::new(Hl2DemoSession::new(BufReader::new(source))?))
    }

    fn name(&self) -> &'static str {
        "hl2demo"
    }
}

/// 1ファイル分のデコード状態
pub struct Hl2DemoSession<R> {
    reader: R,
    header: DemoHeader,
    offset: u64,
    tracker: GameEventTracker,
    finished: bool,
}

impl<R: Read> Hl2DemoSession<R> {
    /// ヘッダーを読んでセッションを開始
    pub fn new(mut reader: R) -> Result<Self, DecodeError> {
        let header = DemoHeader::read_from(&mut reader)?;
        debug!(
            map = %header.map_name,
            demo_protocol = header.demo_protocol,
            network_protocol = header.network_protocol,
            "demo header decoded"
        );

        Ok(Self {
            reader,
            header,
            offset: HEADER_SIZE as u64,
            tracker: GameEventTracker::new(MatchRules::csgo()),
            finished: false,
        })
    }

    pub fn header(&self) -> &DemoHeader {
        &self.header
    }

    pub fn rules(&self) -> MatchRules {
        self.tracker.rules()
    }

    fn read_frame(&mut self) -> Result<(), DecodeError> {
        let command = self.read_u8()?;
        let tick = self.read_i32()?;
        let _player_slot = self.read_u8()?;

        match command {
            CMD_SIGNON | CMD_PACKET => {
                // コマンド情報 + in/outシーケンス番号
                self.skip(CMD_INFO_SIZE as u64 + 8)?;
                let payload = self.read_payload()?;
                self.decode_packet(&payload)?;
            }
            CMD_SYNCTICK => {}
            CMD_CONSOLECMD | CMD_DATATABLES | CMD_STRINGTABLES => self.skip_payload()?,
            CMD_USERCMD | CMD_CUSTOMDATA => {
                self.skip(4)?;
                self.skip_payload()?;
            }
            CMD_STOP => {
                trace!(tick, "stop frame");
                self.finished = true;
            }
            _ => return Err(DecodeError::UnknownCommand { command, tick }),
        }
        Ok(())
    }

    /// varint id + varint長 + 本体 の並び
    fn decode_packet(&mut self, payload: &[u8]) -> Result<(), DecodeError> {
        let mut buf = payload;
        while !buf.is_empty() {
            let message_id = prost::encoding::decode_varint(&mut buf)?;
            let length = usize::try_from(prost::encoding::decode_varint(&mut buf)?)
                .ok()
                .filter(|length| *length <= buf.len())
                .ok_or_else(|| {
                    DecodeError::Malformed(format!(
                        "net message {message_id} overruns packet before offset {}",
                        self.offset
                    ))
                })?;
            let (body, rest) = buf.split_at(length);
            buf = rest;

            if let Some(kind) = message_kind(message_id) {
                self.tracker.handle(kind, body)?;
            }
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn read_length(&mut self) -> Result<usize, DecodeError> {
        let length = self.read_i32()?;
        usize::try_from(length)
            .ok()
            .filter(|len| *len <= MAX_PAYLOAD_SIZE)
            .ok_or_else(|| {
                DecodeError::Malformed(format!(
                    "invalid payload length {length} at offset {}",
                    self.offset
                ))
            })
    }

    fn read_payload(&mut self) -> Result<Vec<u8>, DecodeError> {
        let length = self.read_length()?;
        let mut payload = vec![0u8; length];
        self.read_exact(&mut payload)?;
        Ok(payload)
    }

    fn skip_payload(&mut self) -> Result<(), DecodeError> {
        let length = self.read_length()?;
        self.skip(length as u64)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        let offset = self.offset;
        self.reader.read_exact(buf).map_err(|error| {
            if error.kind() == io::ErrorKind::UnexpectedEof {
                DecodeError::UnexpectedEof { offset }
            } else {
                DecodeError::Io(error)
            }
        })?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    fn skip(&mut self, len: u64) -> Result<(), DecodeError> {
        let skipped = io::copy(&mut (&mut self.reader).take(len), &mut io::sink())?;
        self.offset += skipped;
        if skipped < len {
            return Err(DecodeError::UnexpectedEof {
                offset: self.offset,
            });
        }
        Ok(())
    }
}

impl<R: Read + Send> DecodeSession for Hl2DemoSession<R> {
    fn next_event(&mut self) -> Result<Option<DemoEvent>, DecodeError> {
        loop {
            if let Some(event) = self.tracker.next_event() {
                return Ok(Some(event));
            }
            if self.finished {
                return Ok(None);
            }
            self.read_frame()?;
        }
    }

    fn overtime_count(&self) -> u32 {
        self.tracker.overtime_count()
    }

    fn map_name(&self) -> &str {
        &self.header.map_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Team;
    use crate::demo::synth::DemoBuilder;
    use std::io::Cursor;

    fn open(bytes: Vec<u8>) -> Hl2DemoSession<Cursor<Vec<u8>>> {
        Hl2DemoSession::new(Cursor::new(bytes)).unwrap()
    }

    /// 全イベントと、その時点の延長戦番号
    fn drain(session: &mut Hl2DemoSession<Cursor<Vec<u8>>>) -> Vec<(DemoEvent, u32)> {
        let mut events = Vec::new();
        while let Some(event) = session.next_event().unwrap() {
            events.push((event, session.overtime_count()));
        }
        events
    }

    #[test]
    fn test_header_and_map_name() {
        let session = open(DemoBuilder::new("de_overpass").build());
        assert_eq!(session.map_name(), "de_overpass");
        assert_eq!(session.header().game_directory, "csgo");
    }

    #[test]
    fn test_regulation_rounds_have_no_overtime() {
        let mut session = open(DemoBuilder::new("de_dust2").rounds([2, 3, 3]).build());
        let events = drain(&mut session);

        assert_eq!(
            events,
            vec![
                (DemoEvent::RoundEnd { winner: Team::Terrorists }, 0),
                (DemoEvent::RoundEnd { winner: Team::CounterTerrorists }, 0),
                (DemoEvent::RoundEnd { winner: Team::CounterTerrorists }, 0),
            ]
        );
        assert!(session.next_event().unwrap().is_none());
    }

    #[test]
    fn test_overtime_rounds_are_numbered() {
        let bytes = DemoBuilder::new("de_inferno")
            .match_start()
            .rounds(std::iter::repeat(2).take(30))
            .rounds([3, 3, 2, 2, 3, 3])
            .rounds([2])
            .win_panel_match()
            .build();
        let mut session = open(bytes);
        let events = drain(&mut session);

        assert_eq!(events.len(), 38);
        assert_eq!(events[29].1, 0);
        assert_eq!(events[30], (DemoEvent::RoundEnd { winner: Team::CounterTerrorists }, 1));
        assert_eq!(events[35].1, 1);
        assert_eq!(events[36], (DemoEvent::RoundEnd { winner: Team::Terrorists }, 2));
        assert_eq!(events[37].0, DemoEvent::WinPanelMatch);
    }

    #[test]
    fn test_convars_change_rules() {
        let bytes = DemoBuilder::new("de_ancient")
            .convar("mp_maxrounds", "24")
            .convar("mp_overtime_maxrounds", "6")
            .rounds(std::iter::repeat(3).take(25))
            .build();
        let mut session = open(bytes);
        let events = drain(&mut session);

        assert_eq!(
            session.rules(),
            MatchRules {
                max_rounds: 24,
                overtime_rounds: 6
            }
        );
        assert_eq!(events[23].1, 0);
        assert_eq!(events[24].1, 1);
    }

    #[test]
    fn test_match_start_resets_round_counter() {
        // ウォームアップ中のラウンドは数えない
        let bytes = DemoBuilder::new("de_vertigo")
            .rounds(std::iter::repeat(2).take(31))
            .match_start()
            .rounds([3])
            .build();
        let mut session = open(bytes);
        let events = drain(&mut session);

        assert_eq!(events[30].1, 1);
        assert_eq!(events[31].1, 0);
    }

    #[test]
    fn test_unknown_winner_value() {
        let mut session = open(DemoBuilder::new("de_train").round_end(9).build());
        let events = drain(&mut session);
        assert_eq!(events[0].0, DemoEvent::RoundEnd { winner: Team::Unknown(9) });
    }

    #[test]
    fn test_missing_stop_frame_is_unexpected_eof() {
        let mut session = open(DemoBuilder::new("de_mirage").rounds([2]).build_without_stop());

        assert!(matches!(
            session.next_event(),
            Ok(Some(DemoEvent::RoundEnd { .. }))
        ));
        assert!(matches!(
            session.next_event(),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let mut bytes = DemoBuilder::new("de_mirage").build_without_stop();
        bytes.push(0x2a);
        bytes.extend_from_slice(&128i32.to_le_bytes());
        bytes.push(0);

        let mut session = open(bytes);
        let error = session.next_event().unwrap_err();
        assert!(matches!(
            error,
            DecodeError::UnknownCommand {
                command: 0x2a,
                tick: 128
            }
        ));
    }

    #[test]
    fn test_skips_non_packet_frames() {
        let mut bytes = DemoBuilder::new("de_cache").build_without_stop();
        // consolecmd
        bytes.push(CMD_CONSOLECMD);
        bytes.extend_from_slice(&10i32.to_le_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&5i32.to_le_bytes());
        bytes.extend_from_slice(b"echo\0");
        // usercmd
        bytes.push(CMD_USERCMD);
        bytes.extend_from_slice(&11i32.to_le_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&7i32.to_le_bytes());
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2]);
        // stop
        bytes.push(CMD_STOP);
        bytes.extend_from_slice(&12i32.to_le_bytes());
        bytes.push(0);

        let mut session = open(bytes);
        assert!(session.next_event().unwrap().is_none());
    }

    #[test]
    fn test_decoder_open_rejects_garbage() {
        let decoder = Hl2DemoDecoder::new();
        let result = decoder.open(Box::new(Cursor::new(b"definitely not a demo".to_vec())));
        assert!(matches!(result, Err(DecodeError::InvalidHeader(_))));
        assert_eq!(decoder.name(), "hl2demo");
    }
}
