#![allow(dead_code)]

use async_trait::async_trait;
use indexmap::IndexMap;
use promptloom::core::{DirEntry, FileContent, FileSystem, FsError, PathStats};
use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    io,
    path::{Path, PathBuf},
    rc::Rc,
};

enum MemEntry {
    File(String),
    Dir,
}

/// In-memory filesystem with listing order = creation order, per-path
/// failure injection and call counting. Every operation yields once so
/// concurrent callers actually interleave.
#[derive(Default)]
pub struct MemoryFs {
    entries: RefCell<IndexMap<PathBuf, MemEntry>>,
    denied: RefCell<HashSet<PathBuf>>,
    listings: RefCell<HashMap<PathBuf, usize>>,
    reads: Cell<usize>,
}

impl MemoryFs {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn dir(&self, path: &str) {
        let path = PathBuf::from(path);
        self.ensure_parents(&path);
        self.entries.borrow_mut().entry(path).or_insert(MemEntry::Dir);
    }

    pub fn file(&self, path: &str, content: &str) {
        let path = PathBuf::from(path);
        self.ensure_parents(&path);
        self.entries
            .borrow_mut()
            .insert(path, MemEntry::File(content.to_string()));
    }

    fn ensure_parents(&self, path: &Path) {
        let mut ancestors: Vec<PathBuf> = path
            .ancestors()
            .skip(1)
            .filter(|a| !a.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .collect();
        ancestors.reverse();
        let mut entries = self.entries.borrow_mut();
        for a in ancestors {
            entries.entry(a).or_insert(MemEntry::Dir);
        }
    }

    /// Removes `path` and everything below it.
    pub fn remove(&self, path: &str) {
        let path = Path::new(path);
        self.entries
            .borrow_mut()
            .retain(|p, _| !p.starts_with(path));
    }

    pub fn deny(&self, path: &str) {
        self.denied.borrow_mut().insert(PathBuf::from(path));
    }

    pub fn allow(&self, path: &str) {
        self.denied.borrow_mut().remove(Path::new(path));
    }

    pub fn listing_calls(&self, path: &str) -> usize {
        self.listings
            .borrow()
            .get(Path::new(path))
            .copied()
            .unwrap_or(0)
    }

    pub fn read_calls(&self) -> usize {
        self.reads.get()
    }

    fn check(&self, path: &Path) -> Result<(), io::Error> {
        if self.denied.borrow().contains(path) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        if !self.entries.borrow().contains_key(path) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl FileSystem for MemoryFs {
    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        *self
            .listings
            .borrow_mut()
            .entry(path.to_path_buf())
            .or_insert(0) += 1;
        tokio::task::yield_now().await;

        self.check(path)
            .map_err(|e| FsError::directory_unreadable(path, &e))?;
        let entries = self.entries.borrow();
        if !matches!(entries.get(path), Some(MemEntry::Dir)) {
            let e = io::Error::other("Not a directory");
            return Err(FsError::directory_unreadable(path, &e));
        }

        Ok(entries
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .map(|(p, e)| DirEntry {
                name: p
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: p.clone(),
                is_dir: matches!(e, MemEntry::Dir),
                is_file: matches!(e, MemEntry::File(_)),
            })
            .collect())
    }

    async fn stat_path(&self, path: &Path) -> Result<PathStats, FsError> {
        tokio::task::yield_now().await;
        self.check(path)
            .map_err(|e| FsError::path_unreadable(path, &e))?;
        let entries = self.entries.borrow();
        let (size, is_dir) = match entries.get(path) {
            Some(MemEntry::File(c)) => (c.len() as u64, false),
            _ => (0, true),
        };
        Ok(PathStats {
            size,
            is_dir,
            is_file: !is_dir,
            modified: None,
            created: None,
        })
    }

    async fn read_file(&self, path: &Path) -> Result<FileContent, FsError> {
        self.reads.set(self.reads.get() + 1);
        tokio::task::yield_now().await;
        self.check(path)
            .map_err(|e| FsError::file_unreadable(path, &e))?;
        match self.entries.borrow().get(path) {
            Some(MemEntry::File(c)) => Ok(FileContent {
                path: path.to_path_buf(),
                content: c.clone(),
            }),
            _ => Err(FsError::file_unreadable(
                path,
                &io::Error::other("Is a directory"),
            )),
        }
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<(), FsError> {
        tokio::task::yield_now().await;
        if self.denied.borrow().contains(path) {
            let e = io::Error::from(io::ErrorKind::PermissionDenied);
            return Err(FsError::file_write_error(path, &e));
        }
        self.file(&path.to_string_lossy(), content);
        Ok(())
    }
}

/// `/proj` with `a.txt`, `b.txt` and `sub/c.txt`, in that listing order.
pub fn sample_project() -> Rc<MemoryFs> {
    let fs = MemoryFs::new();
    fs.dir("/proj");
    fs.file("/proj/a.txt", "alpha");
    fs.file("/proj/b.txt", "beta");
    fs.dir("/proj/sub");
    fs.file("/proj/sub/c.txt", "gamma");
    fs
}

pub fn p(s: &str) -> PathBuf {
    PathBuf::from(s)
}
