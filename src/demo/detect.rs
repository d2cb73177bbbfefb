// 先頭のマジックでコンテナ形式を判別する

use super::header::HEADER_MAGIC;
use super::hl2demo::Hl2DemoSession;
use super::source2::{Source2DemoSession, SOURCE2_MAGIC};
use super::{DecodeError, DecodeSession, DemoDecoder};
use std::io::{self, BufReader, Cursor, Read};
use tracing::debug;

/// 判別に使う先頭バイト数
pub const MAGIC_LEN: usize = 8;

/// デモのコンテナ形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoFormat {
    /// CS:GO (HL2DEMO)
    Hl2Demo,
    /// CS2 (PBDEMS2)
    Source2,
}

impl DemoFormat {
    pub fn detect(magic: &[u8]) -> Option<Self> {
        if magic.starts_with(HEADER_MAGIC) {
            Some(Self::Hl2Demo)
        } else if magic.starts_with(SOURCE2_MAGIC) {
            Some(Self::Source2)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hl2Demo => "hl2demo",
            Self::Source2 => "source2",
        }
    }
}

/// CS:GOとCS2の両方を読めるデコーダー
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDetectDecoder;

impl AutoDetectDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl DemoDecoder for AutoDetectDecoder {
    fn open(&self, mut source: Box<dyn Read + Send>) -> Result<Box<dyn DecodeSession>, DecodeError> {
        let mut magic = [0u8; MAGIC_LEN];
        source.read_exact(&mut magic).map_err(|error| {
            if error.kind() == io::ErrorKind::UnexpectedEof {
                DecodeError::InvalidHeader("file is shorter than the demo magic".to_string())
            } else {
                DecodeError::Io(error)
            }
        })?;

        let format = DemoFormat::detect(&magic).ok_or_else(|| {
            DecodeError::InvalidHeader(format!(
                "unknown demo magic {:?}",
                String::from_utf8_lossy(&magic)
            ))
        })?;
        debug!(format = format.as_str(), "demo format detected");

        // 読んだマジックを先頭に戻す
        let replay = BufReader::new(Cursor::new(magic).chain(source));
        match format {
            DemoFormat::Hl2Demo => Ok(Box::new(Hl2DemoSession::new(replay)?)),
            DemoFormat::Source2 => Ok(Box::new(Source2DemoSession::new(replay)?)),
        }
    }

    fn name(&self) -> &'static str {
        "auto"
    }
}
