// デモファイルヘッダー (HL2DEMO)

use super::DecodeError;
use std::io::Read;

/// ファイル先頭のマジック
pub const HEADER_MAGIC: &[u8; 8] = b"HL2DEMO\0";

/// ヘッダー全体のバイト数
pub const HEADER_SIZE: usize = 1072;

/// サーバー名・マップ名などの固定長文字列フィールド
const PATH_LENGTH: usize = 260;

/// デモヘッダー
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DemoHeader {
    pub demo_protocol: i32,
    pub network_protocol: i32,
    pub server_name: String,
    pub client_name: String,
    pub map_name: String,
    pub game_directory: String,
    pub playback_time: f32,
    pub playback_ticks: i32,
    pub playback_frames: i32,
    pub signon_length: i32,
}

impl DemoHeader {
    /// マップ名だけを指定したヘッダー
    pub fn for_map(map_name: impl Into<String>) -> Self {
        Self {
            demo_protocol: 4,
            network_protocol: 13_881,
            map_name: map_name.into(),
            game_directory: "csgo".to_string(),
            ..Self::default()
        }
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf).map_err(|error| {
            if error.kind() == std::io::ErrorKind::UnexpectedEof {
                DecodeError::InvalidHeader(format!(
                    "file is shorter than the {HEADER_SIZE} byte header"
                ))
            } else {
                DecodeError::Io(error)
            }
        })?;

        if &buf[..HEADER_MAGIC.len()] != HEADER_MAGIC {
            return Err(DecodeError::InvalidHeader(format!(
                "unexpected magic {:?}",
                String::from_utf8_lossy(&buf[..HEADER_MAGIC.len()])
            )));
        }

        let mut fields = FieldReader {
            buf: &buf,
            pos: HEADER_MAGIC.len(),
        };
        Ok(Self {
            demo_protocol: fields.i32(),
            network_protocol: fields.i32(),
            server_name: fields.fixed_string(),
            client_name: fields.fixed_string(),
            map_name: fields.fixed_string(),
            game_directory: fields.fixed_string(),
            playback_time: f32::from_bits(fields.i32() as u32),
            playback_ticks: fields.i32(),
            playback_frames: fields.i32(),
            signon_length: fields.i32(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE);
        buf.extend_from_slice(HEADER_MAGIC);
        buf.extend_from_slice(&self.demo_protocol.to_le_bytes());
        buf.extend_from_slice(&self.network_protocol.to_le_bytes());
        for text in [
            &self.server_name,
            &self.client_name,
            &self.map_name,
            &self.game_directory,
        ] {
            let mut field = [0u8; PATH_LENGTH];
            // 終端のNULを残す
            let len = text.len().min(PATH_LENGTH - 1);
            field[..len].copy_from_slice(&text.as_bytes()[..len]);
            buf.extend_from_slice(&field);
        }
        buf.extend_from_slice(&self.playback_time.to_le_bytes());
        buf.extend_from_slice(&self.playback_ticks.to_le_bytes());
        buf.extend_from_slice(&self.playback_frames.to_le_bytes());
        buf.extend_from_slice(&self.signon_length.to_le_bytes());
        buf
    }
}

// 長さはHEADER_SIZEで保証済み
struct FieldReader<'a> {
    buf: &'a [u8; HEADER_SIZE],
    pos: usize,
}

impl FieldReader<'_> {
    fn i32(&mut self) -> i32 {
        let bytes = &self.buf[self.pos..self.pos + 4];
        self.pos += 4;
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn fixed_string(&mut self) -> String {
        let field = &self.buf[self.pos..self.pos + PATH_LENGTH];
        self.pos += PATH_LENGTH;
        let end = field.iter().position(|&b| b == 0).unwrap_or(PATH_LENGTH);
        String::from_utf8_lossy(&field[..end]).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_layout() {
        let header = DemoHeader::for_map("de_mirage");
        assert_eq!(header.to_bytes().len(), HEADER_SIZE);
    }

    #[test]
    fn test_read_header() {
        let header = DemoHeader {
            server_name: "FACEIT Server".to_string(),
            playback_time: 2_714.5,
            playback_ticks: 347_456,
            ..DemoHeader::for_map("de_nuke")
        };
        let bytes = header.to_bytes();

        let parsed = DemoHeader::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.map_name, "de_nuke");
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = DemoHeader::for_map("de_nuke").to_bytes();
        bytes[..8].copy_from_slice(b"PBDEMS2\0");

        let error = DemoHeader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(error, DecodeError::InvalidHeader(_)));
    }

    #[test]
    fn test_short_file() {
        let error = DemoHeader::read_from(&mut Cursor::new(b"HL2DEMO\0".to_vec())).unwrap_err();
        assert!(matches!(error, DecodeError::InvalidHeader(_)));
    }
}
