// Custom error types for batch processing
// バッチ処理専用のカスタムエラー型定義

use crate::demo::DecodeError;
use std::any::Any;
use std::io;
use thiserror::Error;

/// バッチ処理固有のエラー型
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("ファイル発見エラー: {path} - {source}")]
    FileDiscoveryError {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("入力オープンエラー: {path} - {source}")]
    OpenError {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("出力作成エラー: {path} - {source}")]
    WriteSetupError {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("デコードエラー: {path} - {source}")]
    DecodeError {
        path: String,
        #[source]
        source: DecodeError,
    },

    #[error("レポート書き込みエラー: {path} - {source}")]
    ReportWriteError {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("ワーカー異常終了: {path} - {message}")]
    WorkerPanicked { path: String, message: String },

    #[error("設定エラー: {message}")]
    ConfigurationError { message: String },

    #[error("チャンネルエラー: {message}")]
    ChannelError { message: String },

    #[error("タスクエラー: {source}")]
    TaskError {
        #[source]
        source: tokio::task::JoinError,
    },
}

impl ProcessingError {
    /// ファイル発見エラーの作成
    pub fn file_discovery(path: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::FileDiscoveryError {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn open(path: impl Into<String>, source: io::Error) -> Self {
        Self::OpenError {
            path: path.into(),
            source,
        }
    }

    pub fn write_setup(path: impl Into<String>, source: io::Error) -> Self {
        Self::WriteSetupError {
            path: path.into(),
            source,
        }
    }

    pub fn decode(path: impl Into<String>, source: DecodeError) -> Self {
        Self::DecodeError {
            path: path.into(),
            source,
        }
    }

    pub fn report_write(path: impl Into<String>, source: io::Error) -> Self {
        Self::ReportWriteError {
            path: path.into(),
            source,
        }
    }

    /// パニックしたワーカーのJoinErrorからエラーを作成
    pub fn worker_panicked(path: impl Into<String>, error: tokio::task::JoinError) -> Self {
        let message = if error.is_panic() {
            panic_message(error.into_panic())
        } else {
            error.to_string()
        };

        Self::WorkerPanicked {
            path: path.into(),
            message,
        }
    }

    /// 設定エラーの作成
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// チャンネルエラーの作成
    pub fn channel(message: impl Into<String>) -> Self {
        Self::ChannelError {
            message: message.into(),
        }
    }

    /// タスクエラーの作成
    pub fn task(source: tokio::task::JoinError) -> Self {
        Self::TaskError { source }
    }

    /// エラーの重要度を取得
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConfigurationError { .. } => ErrorSeverity::Critical,
            Self::FileDiscoveryError { .. } | Self::ChannelError { .. } | Self::TaskError { .. } => {
                ErrorSeverity::High
            }
            Self::WorkerPanicked { .. } | Self::WriteSetupError { .. } => ErrorSeverity::Medium,
            Self::OpenError { .. } | Self::DecodeError { .. } | Self::ReportWriteError { .. } => {
                ErrorSeverity::Low
            }
        }
    }

    /// ファイル単位で閉じ込められるエラーかどうか
    ///
    /// falseのエラーはバッチ全体を停止させる。
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::OpenError { .. }
            | Self::WriteSetupError { .. }
            | Self::DecodeError { .. }
            | Self::ReportWriteError { .. }
            | Self::WorkerPanicked { .. } => true,
            Self::FileDiscoveryError { .. }
            | Self::ConfigurationError { .. }
            | Self::ChannelError { .. }
            | Self::TaskError { .. } => false,
        }
    }
}

/// エラーの重要度レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 低重要度 - 入力ファイル起因
    Low,
    /// 中重要度 - 警告レベル
    Medium,
    /// 高重要度 - 要対応
    High,
    /// 致命的 - システム停止レベル
    Critical,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// バッチ処理の結果型
pub type ProcessingResult<T> = std::result::Result<T, ProcessingError>;

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl From<tokio::task::JoinError> for ProcessingError {
    fn from(error: tokio::task::JoinError) -> Self {
        ProcessingError::TaskError { source: error }
    }
}
