// 処理に関連するデータ型定義

use super::error::ProcessingError;
use chrono::{DateTime, Local};
use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// レポートの日時列フォーマット
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 処理対象の指定（ディレクトリ走査 or 単一ファイル）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryTarget {
    Directory(PathBuf),
    SingleFile(PathBuf),
}

impl DiscoveryTarget {
    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(path) | Self::SingleFile(path) => path,
        }
    }
}

/// 1つの入力ファイル（発見時に作成され、1つのワーカーだけが消費する）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    path: PathBuf,
}

impl WorkItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 拡張子をレポート用に差し替えた出力先
    pub fn output_path(&self, report_extension: &str) -> PathBuf {
        self.path.with_extension(report_extension)
    }
}

/// ラウンド勝者のチーム
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    Unassigned,
    Spectators,
    Terrorists,
    CounterTerrorists,
    /// 未知のチーム番号
    Unknown(i32),
}

impl From<i32> for Team {
    fn from(raw: i32) -> Self {
        match raw {
            0 => Self::Unassigned,
            1 => Self::Spectators,
            2 => Self::Terrorists,
            3 => Self::CounterTerrorists,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unassigned => "Unassigned",
            Self::Spectators => "Spectators",
            Self::Terrorists => "Terrorists",
            Self::CounterTerrorists => "Counter-Terrorists",
            Self::Unknown(_) => "Unknown",
        };
        f.write_str(label)
    }
}

/// 延長ラウンド1件の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OvertimeOutcome {
    pub overtime_count: NonZeroU32,
    pub winner: Team,
}

/// ファイル単位のメタデータ（オープン時に一度だけ取得）
#[derive(Debug, Clone, PartialEq)]
pub struct FileContext {
    modified: DateTime<Local>,
    map_name: String,
}

impl FileContext {
    pub fn new(modified: impl Into<DateTime<Local>>, map_name: impl Into<String>) -> Self {
        Self {
            modified: modified.into(),
            map_name: map_name.into(),
        }
    }

    pub fn from_system_time(modified: SystemTime, map_name: impl Into<String>) -> Self {
        Self::new(DateTime::<Local>::from(modified), map_name)
    }

    pub fn modified(&self) -> DateTime<Local> {
        self.modified
    }

    /// "YYYY-MM-DD HH:MM:SS" 形式の更新日時
    pub fn formatted_modified(&self) -> String {
        self.modified.format(REPORT_DATE_FORMAT).to_string()
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }
}

/// バッチ全体のサマリー
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingSummary {
    pub total_files: usize,
    pub succeeded_files: usize,
    pub failed_files: usize,
    pub total_processing_time_ms: u64,
}

impl ProcessingSummary {
    pub fn has_failures(&self) -> bool {
        self.failed_files > 0
    }
}

/// 個別ファイルの最終結果（ワーカー1つにつき必ず1つ）
#[derive(Debug)]
pub enum ProcessingOutcome {
    Success {
        file_path: PathBuf,
    },
    Failure {
        file_path: PathBuf,
        error: ProcessingError,
    },
}

impl ProcessingOutcome {
    pub fn file_path(&self) -> &Path {
        match self {
            Self::Success { file_path } | Self::Failure { file_path, .. } => file_path,
        }
    }

    pub fn error(&self) -> Option<&ProcessingError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
