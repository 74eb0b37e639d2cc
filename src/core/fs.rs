use crate::core::FsError;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/* ============================ Capability types ============================= */

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub is_file: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathStats {
    pub size: u64,
    pub is_dir: bool,
    pub is_file: bool,
    pub modified: Option<DateTime<Local>>,
    pub created: Option<DateTime<Local>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileContent {
    pub path: PathBuf,
    pub content: String,
}

/// Filesystem operations the tree, assembler and editor consume.
///
/// Implementations must be usable from a single-threaded runtime; nothing here
/// requires `Send`.
#[async_trait(?Send)]
pub trait FileSystem {
    /// Entries of `path` in the order the OS reports them.
    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, FsError>;

    async fn stat_path(&self, path: &Path) -> Result<PathStats, FsError>;

    /// Reads `path` as UTF-8 text.
    async fn read_file(&self, path: &Path) -> Result<FileContent, FsError>;

    async fn write_file(&self, path: &Path, content: &str) -> Result<(), FsError>;
}

/* ================================ Local disk =============================== */

/// [`FileSystem`] backed by the local disk through `tokio::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

#[async_trait(?Send)]
impl FileSystem for LocalFs {
    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let mut rd = tokio::fs::read_dir(path)
            .await
            .map_err(|e| FsError::directory_unreadable(path, &e))?;

        let mut out = Vec::new();
        while let Some(ent) = rd
            .next_entry()
            .await
            .map_err(|e| FsError::directory_unreadable(path, &e))?
        {
            let entry_path = ent.path();
            let name = ent.file_name().to_string_lossy().into_owned();

            let (is_dir, is_file) = match ent.file_type().await {
                Ok(ft) if ft.is_symlink() => match tokio::fs::metadata(&entry_path).await {
                    Ok(meta) => (meta.is_dir(), meta.is_file()),
                    // Dangling link: show it as a file so reading it reports the error.
                    Err(_) => (false, true),
                },
                Ok(ft) => (ft.is_dir(), ft.is_file()),
                Err(_) => (false, true),
            };

            out.push(DirEntry {
                name,
                path: entry_path,
                is_dir,
                is_file,
            });
        }

        debug!(dir = %path.display(), entries = out.len(), "listed directory");
        Ok(out)
    }

    async fn stat_path(&self, path: &Path) -> Result<PathStats, FsError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| FsError::path_unreadable(path, &e))?;

        Ok(PathStats {
            size: meta.len(),
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            modified: meta.modified().ok().map(DateTime::<Local>::from),
            created: meta.created().ok().map(DateTime::<Local>::from),
        })
    }

    async fn read_file(&self, path: &Path) -> Result<FileContent, FsError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FsError::file_unreadable(path, &e))?;
        Ok(FileContent {
            path: path.to_path_buf(),
            content,
        })
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<(), FsError> {
        tokio::fs::write(path, content)
            .await
            .map_err(|e| FsError::file_write_error(path, &e))
    }
}

/* =========================== Filesystem & paths ============================ */

#[must_use]
pub fn path_to_unix(p: &Path) -> String {
    let mut s = String::new();
    let mut first = true;

    for comp in p {
        if !first && !s.ends_with('/') {
            s.push('/');
        }
        first = false;

        let comp_str = comp.to_string_lossy();

        // Handle UNC paths on Windows
        #[cfg(windows)]
        if comp_str == "\\" && s.is_empty() {
            continue;
        }

        s.push_str(&comp_str);
    }

    // Handle UNC paths on Windows - convert \\server\share to //server/share
    #[cfg(windows)]
    if let Some(path_str) = p.to_str() {
        if path_str.starts_with(r"\\") && !path_str.starts_with(r"\\?") {
            return path_str.replace('\\', "/");
        }
    }

    s
}

/// Resolves `.` and `..` without touching the disk.
#[must_use]
pub fn lexical_normalize(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in p.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path of `p` relative to `root`, compared lexically. `None` when `p` is not
/// under `root`.
#[must_use]
pub fn relative_to(root: &Path, p: &Path) -> Option<PathBuf> {
    let root = lexical_normalize(root);
    let p = lexical_normalize(p);
    p.strip_prefix(&root).ok().map(Path::to_path_buf)
}

/// Canonical form of a user-supplied folder, falling back to the lexical form
/// when the path cannot be resolved.
#[must_use]
pub fn normalize_root(p: &Path) -> PathBuf {
    if p.as_os_str().is_empty() {
        return PathBuf::new();
    }
    dunce::canonicalize(p).unwrap_or_else(|_| lexical_normalize(p))
}
