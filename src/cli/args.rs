use crate::core::DiscoveryTarget;
use crate::services::DEFAULT_MAX_CONCURRENT;
use clap::{ArgGroup, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// 1ダッシュでも受け付けるロングオプション
const LEGACY_LONG_FLAGS: &[&str] = &["dir", "demo", "max-concurrent", "verbose", "fail-on-error"];

#[derive(Parser, Debug)]
#[command(name = "overtime_report")]
#[command(about = "Extract overtime round winners from CS:GO and CS2 demos into CSV reports")]
#[command(version)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["dir", "demo"]),
))]
pub struct Cli {
    /// Directory to process (every .dem file below it)
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Demo file path
    #[arg(long, value_name = "PATH")]
    pub demo: Option<PathBuf>,

    /// Maximum amount of demos parsed at the same time
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_CONCURRENT)]
    pub max_concurrent: usize,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Exit with status 1 when any demo failed
    #[arg(long)]
    pub fail_on_error: bool,
}

impl Cli {
    /// 1ダッシュ形式を正規化してからパースする
    pub fn parse_normalized<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_legacy_flags(args))
    }

    /// 処理対象（dirとdemoはどちらか一方だけ指定される）
    pub fn target(&self) -> Option<DiscoveryTarget> {
        match (&self.dir, &self.demo) {
            (Some(dir), None) => Some(DiscoveryTarget::Directory(dir.clone())),
            (None, Some(demo)) => Some(DiscoveryTarget::SingleFile(demo.clone())),
            _ => None,
        }
    }
}

/// `-dir x` や `-max-concurrent=4` を `--dir x` 形式に書き換える
///
/// 先頭（プログラム名）と `--` 以降はそのまま。
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut passthrough = false;

    for (index, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if index == 0 || passthrough {
            normalized.push(arg);
            continue;
        }

        let rewritten = arg.to_str().and_then(|text| {
            if text == "--" {
                return None;
            }
            let flag = text.strip_prefix('-')?;
            if flag.starts_with('-') {
                return None;
            }
            let name = flag.split('=').next().unwrap_or(flag);
            LEGACY_LONG_FLAGS
                .contains(&name)
                .then(|| OsString::from(format!("-{text}")))
        });

        if arg == "--" {
            passthrough = true;
        }
        normalized.push(rewritten.unwrap_or(arg));
    }

    normalized
}
