use crate::core::{FileSystem, PathStats, PreviewError};
use std::path::{Path, PathBuf};

/// Files above this size are refused for preview and assembly.
pub const MAX_PREVIEW_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub path: PathBuf,
    pub stats: PathStats,
    pub content: String,
}

/// Stats `path` and refuses directories and oversized files.
pub async fn ensure_within_limit(fs: &dyn FileSystem, path: &Path) -> Result<PathStats, PreviewError> {
    let stats = fs.stat_path(path).await?;
    if stats.is_dir {
        return Err(PreviewError::IsDirectory(path.to_path_buf()));
    }
    if stats.size > MAX_PREVIEW_BYTES {
        return Err(PreviewError::TooLarge {
            path: path.to_path_buf(),
            size: stats.size,
            limit: MAX_PREVIEW_BYTES,
        });
    }
    Ok(stats)
}

pub async fn load_preview(fs: &dyn FileSystem, path: &Path) -> Result<Preview, PreviewError> {
    let stats = ensure_within_limit(fs, path).await?;
    let file = fs.read_file(path).await?;
    Ok(Preview {
        path: path.to_path_buf(),
        stats,
        content: file.content,
    })
}

/* ============================== Edit buffer ================================ */

/// In-memory edit of one file, tracking whether it differs from disk.
#[derive(Debug, Clone)]
pub struct EditorBuffer {
    path: PathBuf,
    original: String,
    text: String,
}

impl EditorBuffer {
    #[must_use]
    pub fn new(path: PathBuf, content: String) -> Self {
        Self {
            path,
            original: content.clone(),
            text: content,
        }
    }

    pub async fn open(fs: &dyn FileSystem, path: &Path) -> Result<Self, PreviewError> {
        let preview = load_preview(fs, path).await?;
        Ok(Self::new(preview.path, preview.content))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.text != self.original
    }

    pub fn revert(&mut self) {
        self.text.clone_from(&self.original);
    }

    /// Writes the buffer if dirty. Returns whether anything was written; on
    /// error the buffer stays dirty.
    pub async fn save(&mut self, fs: &dyn FileSystem) -> Result<bool, PreviewError> {
        if !self.is_dirty() {
            return Ok(false);
        }
        fs.write_file(&self.path, &self.text).await?;
        self.original.clone_from(&self.text);
        Ok(true)
    }
}
