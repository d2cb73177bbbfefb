// CS2 (Source 2) のデモコンテナを読むデコーダー
//
// PBDEMS2\0 + オフセット2つの後に、varintで区切られたコマンドが続く。
// コマンド本体はsnappy圧縮されている場合がある。パケット内のネットメッセージは
// ビット単位で詰められている。

use super::events::{GameEventTracker, MatchRules, MessageKind};
use super::proto::{DemoFileHeader, DemoFullPacket, DemoPacket};
use super::{DecodeError, DecodeSession, DemoDecoder, DemoEvent};
use prost::Message;
use std::io::{self, BufReader, Read};
use tracing::{debug, trace};

/// ファイル先頭のマジック
pub const SOURCE2_MAGIC: &[u8; 8] = b"PBDEMS2\0";

/// マジック + fileinfo/spawngroupsのオフセット
pub(crate) const PREAMBLE_SIZE: usize = 16;

// デモコマンド
pub(crate) const DEM_STOP: u32 = 0;
pub(crate) const DEM_FILE_HEADER: u32 = 1;
pub(crate) const DEM_SYNC_TICK: u32 = 3;
pub(crate) const DEM_PACKET: u32 = 7;
pub(crate) const DEM_SIGNON_PACKET: u32 = 8;
pub(crate) const DEM_FULL_PACKET: u32 = 13;
const DEM_MAX: u32 = 18;
pub(crate) const DEM_IS_COMPRESSED: u32 = 64;

// ネットメッセージID
pub(crate) const NET_SET_CONVAR: u32 = 6;
pub(crate) const GE_LEGACY_GAME_EVENT_LIST: u32 = 205;
pub(crate) const GE_LEGACY_GAME_EVENT: u32 = 207;

/// 1コマンドの本体上限
const MAX_COMMAND_SIZE: usize = 64 * 1024 * 1024;

const MAX_VARINT32_BYTES: usize = 5;

fn message_kind(message_id: u32) -> Option<MessageKind> {
    match message_id {
        NET_SET_CONVAR => Some(MessageKind::SetConVar),
        GE_LEGACY_GAME_EVENT_LIST => Some(MessageKind::GameEventList),
        GE_LEGACY_GAME_EVENT => Some(MessageKind::GameEvent),
        _ => None,
    }
}

/// バイト供給元から32bit varintを読む
fn read_varint32<F>(mut next_byte: F) -> Result<u32, DecodeError>
where
    F: FnMut() -> Result<u8, DecodeError>,
{
    let mut bytes = Vec::with_capacity(MAX_VARINT32_BYTES);
    loop {
        let byte = next_byte()?;
        bytes.push(byte);
        if byte & 0x80 == 0 {
            break;
        }
        if bytes.len() == MAX_VARINT32_BYTES {
            return Err(DecodeError::Malformed("varint32 too long".to_string()));
        }
    }
    let value = prost::encoding::decode_varint(&mut bytes.as_slice())?;
    u32::try_from(value)
        .map_err(|_| DecodeError::Malformed(format!("varint32 out of range: {value}")))
}

/// Source 2コンテナのデコーダー
#[derive(Debug, Clone, Copy, Default)]
pub struct Source2DemoDecoder;

impl Source2DemoDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl DemoDecoder for Source2DemoDecoder {
    fn open(&self, source: Box<dyn Read + Send>) -> Result<Box<dyn DecodeSession>, DecodeError> {
        Ok(Box::new(Source2DemoSession::new(BufReader::new(source))?))
    }

    fn name(&self) -> &'static str {
        "source2"
    }
}

struct Command {
    kind: u32,
    tick: u32,
    data: Vec<u8>,
}

/// 1ファイル分のデコード状態
pub struct Source2DemoSession<R> {
    reader: R,
    header: DemoFileHeader,
    offset: u64,
    tracker: GameEventTracker,
    finished: bool,
}

impl<R: Read> Source2DemoSession<R> {
    /// プリアンブルとファイルヘッダーコマンドを読んでセッションを開始
    pub fn new(mut reader: R) -> Result<Self, DecodeError> {
        let mut preamble = [0u8; PREAMBLE_SIZE];
        reader.read_exact(&mut preamble).map_err(|error| {
            if error.kind() == io::ErrorKind::UnexpectedEof {
                DecodeError::InvalidHeader(format!(
                    "file is shorter than the {PREAMBLE_SIZE} byte preamble"
                ))
            } else {
                DecodeError::Io(error)
            }
        })?;
        if &preamble[..SOURCE2_MAGIC.len()] != SOURCE2_MAGIC {
            return Err(DecodeError::InvalidHeader(format!(
                "unexpected magic {:?}",
                String::from_utf8_lossy(&preamble[..SOURCE2_MAGIC.len()])
            )));
        }

        let mut session = Self {
            reader,
            header: DemoFileHeader::default(),
            offset: PREAMBLE_SIZE as u64,
            tracker: GameEventTracker::new(MatchRules::cs2()),
            finished: false,
        };

        // 先頭のコマンドは必ずファイルヘッダー
        let first = session.read_command()?;
        if first.kind != DEM_FILE_HEADER {
            return Err(DecodeError::InvalidHeader(format!(
                "expected file header command, found {}",
                first.kind
            )));
        }
        session.header = DemoFileHeader::decode(first.data.as_slice())?;
        debug!(
            map = %session.header.map_name,
            network_protocol = session.header.network_protocol,
            "source2 file header decoded"
        );

        Ok(session)
    }

    pub fn header(&self) -> &DemoFileHeader {
        &self.header
    }

    pub fn rules(&self) -> MatchRules {
        self.tracker.rules()
    }

    fn read_command(&mut self) -> Result<Command, DecodeError> {
        let raw_kind = self.read_varint()?;
        let tick = self.read_varint()?;
        let size = self.read_varint()? as usize;
        if size > MAX_COMMAND_SIZE {
            return Err(DecodeError::Malformed(format!(
                "invalid command size {size} at offset {}",
                self.offset
            )));
        }

        let mut data = vec![0u8; size];
        self.read_exact(&mut data)?;

        let kind = raw_kind & !DEM_IS_COMPRESSED;
        let data = if raw_kind & DEM_IS_COMPRESSED != 0 {
            snap::raw::Decoder::new().decompress_vec(&data)?
        } else {
            data
        };

        Ok(Command { kind, tick, data })
    }

    fn read_next(&mut self) -> Result<(), DecodeError> {
        let command = self.read_command()?;
        match command.kind {
            DEM_STOP => {
                trace!(tick = command.tick, "stop command");
                self.finished = true;
            }
            DEM_PACKET | DEM_SIGNON_PACKET => {
                let packet = DemoPacket::decode(command.data.as_slice())?;
                self.decode_messages(&packet.data)?;
            }
            DEM_FULL_PACKET => {
                let full = DemoFullPacket::decode(command.data.as_slice())?;
                if let Some(packet) = full.packet {
                    self.decode_messages(&packet.data)?;
                }
            }
            kind if kind < DEM_MAX => {}
            kind => {
                return Err(DecodeError::UnknownCommand {
                    command: kind as u8,
                    tick: command.tick as i32,
                })
            }
        }
        Ok(())
    }

    /// ubitvarのid + varint長 + 本体 の並び
    fn decode_messages(&mut self, data: &[u8]) -> Result<(), DecodeError> {
        let mut bits = BitReader::new(data);
        // 末尾の8bit未満はパディング
        while bits.remaining_bits() >= 8 {
            let message_id = bits.read_ubitvar()?;
            let length = bits.read_varint32()? as usize;
            let body = bits.read_bytes(length)?;

            if let Some(kind) = message_kind(message_id) {
                self.tracker.handle(kind, &body)?;
            }
        }
        Ok(())
    }

    fn read_varint(&mut self) -> Result<u32, DecodeError> {
        read_varint32(|| {
            let mut byte = [0u8; 1];
            self.read_exact(&mut byte)?;
            Ok(byte[0])
        })
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
}

impl<R: Read + Send> DecodeSession for Source2DemoSession<R> {
    fn next_event(&mut self) -> Result<Option<DemoEvent>, DecodeError> {
        loop {
            if let Some(event) = self.tracker.next_event() {
                return Ok(Some(event));
            }
            if self.finished {
                return Ok(None);
            }
            self.read_next()?;
        }
    }

    fn overtime_count(&self) -> u32 {
        self.tracker.overtime_count()
    }

    fn map_name(&self) -> &str {
        &self.header.map_name
    }
}

/// LSB優先のビットリーダー
struct BitReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining_bits(&self) -> usize {
        self.buf.len() * 8 - self.pos
    }

    fn read_bits(&mut self, count: u32) -> Result<u32, DecodeError> {
        if count as usize > self.remaining_bits() {
            return Err(DecodeError::Malformed(format!(
                "bit stream overrun reading {count} bits at bit {}",
                self.pos
            )));
        }
        let mut value = 0u32;
        for index in 0..count {
            let bit = (self.buf[self.pos / 8] >> (self.pos % 8)) & 1;
            value |= u32::from(bit) << index;
            self.pos += 1;
        }
        Ok(value)
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bits(8)? as u8)
    }

    fn read_ubitvar(&mut self) -> Result<u32, DecodeError> {
        let value = self.read_bits(6)?;
        let extra = match value & 0x30 {
            16 => 4,
            32 => 8,
            48 => 28,
            _ => return Ok(value),
        };
        Ok((value & 15) | (self.read_bits(extra)? << 4))
    }

    fn read_varint32(&mut self) -> Result<u32, DecodeError> {
        read_varint32(|| self.read_byte())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        if len.saturating_mul(8) > self.remaining_bits() {
            return Err(DecodeError::Malformed(format!(
                "net message of {len} bytes overruns packet at bit {}",
                self.pos
            )));
        }
        if self.pos % 8 == 0 {
            let start = self.pos / 8;
            self.pos += len * 8;
            return Ok(self.buf[start..start + len].to_vec());
        }
        (0..len).map(|_| self.read_byte()).collect()
    }
}
