// ProcessingEngine - 依存性注入による並列処理エンジン
// デコーダー・設定・レポーターをコンストラクタで受け取る

use super::pipeline::ProcessingPipeline;
use crate::{
    core::{
        DiscoveryTarget, ProcessingConfig, ProcessingError, ProcessingResult, ProcessingSummary,
        ProgressReporter,
    },
    demo::DemoDecoder,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

/// バッチ処理エンジン
///
/// ワーカー間で共有する依存関係はArcで保持する。
pub struct ProcessingEngine<D, C, R> {
    decoder: Arc<D>,
    config: Arc<C>,
    reporter: Arc<R>,
}

impl<D, C, R> ProcessingEngine<D, C, R>
where
    D: DemoDecoder + 'static,
    C: ProcessingConfig,
    R: ProgressReporter + 'static,
{
    /// 新しい処理エンジンを作成
    pub fn new(decoder: D, config: C, reporter: R) -> Self {
        Self {
            decoder: Arc::new(decoder),
            config: Arc::new(config),
            reporter: Arc::new(reporter),
        }
    }

    /// ディレクトリ配下のデモを全て処理
    pub async fn process_directory(
        &self,
        directory: impl AsRef<Path>,
    ) -> ProcessingResult<ProcessingSummary> {
        self.process_target(DiscoveryTarget::Directory(directory.as_ref().to_path_buf()))
            .await
    }

    /// 単一のデモファイルを処理
    pub async fn process_file(&self, file: impl AsRef<Path>) -> ProcessingResult<ProcessingSummary> {
        self.process_target(DiscoveryTarget::SingleFile(file.as_ref().to_path_buf()))
            .await
    }

    /// 処理対象を指定して実行
    pub async fn process_target(
        &self,
        target: DiscoveryTarget,
    ) -> ProcessingResult<ProcessingSummary> {
        self.validate_config()?;

        info!(
            target = %target.path().display(),
            decoder = self.decoder.name(),
            max_concurrent = self.config.max_concurrent_workers(),
            "starting batch"
        );

        ProcessingPipeline::new(Arc::clone(&self.decoder))
            .execute(target, self.config.as_ref(), Arc::clone(&self.reporter))
            .await
    }

    /// 設定検証
    fn validate_config(&self) -> ProcessingResult<()> {
        let workers = self.config.max_concurrent_workers();
        if workers == 0 {
            return Err(ProcessingError::configuration(
                "並列ワーカー数は1以上である必要があります",
            ));
        }
        if workers > Semaphore::MAX_PERMITS {
            return Err(ProcessingError::configuration(format!(
                "並列ワーカー数が大きすぎます: {workers}"
            )));
        }

        if self.config.channel_buffer_size() == 0 {
            return Err(ProcessingError::configuration(
                "チャンネルバッファサイズは1以上である必要があります",
            ));
        }

        Ok(())
    }

    /// 設定への参照を取得（読み取り専用アクセス）
    pub fn config(&self) -> &C {
        &self.config
    }

    /// レポーターへの参照を取得
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}
