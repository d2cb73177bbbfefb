// テスト用デモファイルの生成

use overtime_report::demo::synth::DemoBuilder;
use std::fs;
use std::path::{Path, PathBuf};

pub const TERRORISTS: i32 = 2;
pub const COUNTER_TERRORISTS: i32 = 3;

/// 規定30ラウンド + 延長1回目 (CT, T, CT, CT, T, CT) + 延長2回目 (T)
pub fn overtime_match(map_name: &str) -> DemoBuilder {
    DemoBuilder::new(map_name)
        .match_start()
        .rounds(std::iter::repeat(TERRORISTS).take(30))
        .rounds([
            COUNTER_TERRORISTS,
            TERRORISTS,
            COUNTER_TERRORISTS,
            COUNTER_TERRORISTS,
            TERRORISTS,
            COUNTER_TERRORISTS,
        ])
        .rounds([TERRORISTS])
        .win_panel_match()
}

/// CS2 (MR12): 規定24ラウンド + 延長1回目 (CT, T, CT, CT, T, CT) + 延長2回目 (T)
pub fn cs2_overtime_match(map_name: &str) -> DemoBuilder {
    DemoBuilder::source2(map_name)
        .match_start()
        .rounds(std::iter::repeat(TERRORISTS).take(24))
        .rounds([
            COUNTER_TERRORISTS,
            TERRORISTS,
            COUNTER_TERRORISTS,
            COUNTER_TERRORISTS,
            TERRORISTS,
            COUNTER_TERRORISTS,
        ])
        .rounds([TERRORISTS])
        .win_panel_match()
}

/// 延長戦なしで決着した試合
pub fn regulation_match(map_name: &str) -> DemoBuilder {
    DemoBuilder::new(map_name)
        .match_start()
        .rounds(std::iter::repeat(COUNTER_TERRORISTS).take(16))
        .win_panel_match()
}

pub fn write_demo(dir: &Path, name: &str, builder: &DemoBuilder) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    builder.write_to(&path).unwrap();
    path
}

pub fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, bytes).unwrap();
    path
}

/// レポートを行単位で読む
pub fn read_report(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// 日付列を除いた "Map,Overtime,Winner" 部分
pub fn report_rows(path: &Path) -> Vec<String> {
    read_report(path)
        .into_iter()
        .skip(1)
        .map(|line| line.splitn(2, ',').nth(1).unwrap_or_default().to_string())
        .collect()
}
