use crate::core::WorkItem;
use std::path::Path;
use walkdir::WalkDir;

/// 拡張子でデモファイルを探すスキャナー
#[derive(Debug, Clone)]
pub struct FileScanner {
    extension: String,
}

impl FileScanner {
    /// `extension` はドットなし。比較は大文字小文字を区別しない
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_lowercase(),
        }
    }

    /// ディレクトリを再帰的に走査し、見つけたファイルを名前順に `on_item` へ渡す
    ///
    /// `on_item` がfalseを返したら走査を打ち切る。走査エラーはその時点で返す。
    pub fn walk<F>(&self, root: &Path, mut on_item: F) -> Result<usize, walkdir::Error>
    where
        F: FnMut(WorkItem) -> bool,
    {
        let mut found = 0;

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;

            if entry.file_type().is_file() && self.matches(entry.path()) {
                found += 1;
                if !on_item(WorkItem::new(entry.into_path())) {
                    break;
                }
            }
        }

        Ok(found)
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.is_demo_extension(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }

    fn is_demo_extension(&self, extension: &str) -> bool {
        extension == self.extension
    }
}
