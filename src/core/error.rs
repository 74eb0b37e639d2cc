use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Failures reported by a [`crate::core::FileSystem`] implementation.
///
/// Every variant keeps the offending path and the OS message so callers can
/// render them inline (the assembler does exactly that).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("cannot list directory {}: {message}", .path.display())]
    DirectoryUnreadable { path: PathBuf, message: String },

    #[error("cannot stat {}: {message}", .path.display())]
    PathUnreadable { path: PathBuf, message: String },

    #[error("cannot read file {}: {message}", .path.display())]
    FileUnreadable { path: PathBuf, message: String },

    #[error("cannot write file {}: {message}", .path.display())]
    FileWriteError { path: PathBuf, message: String },
}

impl FsError {
    pub fn directory_unreadable(path: &Path, err: &io::Error) -> Self {
        Self::DirectoryUnreadable {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn path_unreadable(path: &Path, err: &io::Error) -> Self {
        Self::PathUnreadable {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn file_unreadable(path: &Path, err: &io::Error) -> Self {
        Self::FileUnreadable {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn file_write_error(path: &Path, err: &io::Error) -> Self {
        Self::FileWriteError {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::DirectoryUnreadable { path, .. }
            | Self::PathUnreadable { path, .. }
            | Self::FileUnreadable { path, .. }
            | Self::FileWriteError { path, .. } => path,
        }
    }

    /// The bare OS message, without the path prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::DirectoryUnreadable { message, .. }
            | Self::PathUnreadable { message, .. }
            | Self::FileUnreadable { message, .. }
            | Self::FileWriteError { message, .. } => message,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("{} is not a file", .0.display())]
    NotAFile(PathBuf),

    #[error("{} is not in the tree", .0.display())]
    UnknownPath(PathBuf),

    #[error("no folder is open")]
    NoRoot,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    #[error("Selected item is a directory")]
    IsDirectory(PathBuf),

    #[error("File is too large to display (max {}MB)", mib(.limit))]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error(transparent)]
    Fs(#[from] FsError),
}

fn mib(bytes: &u64) -> u64 {
    bytes / (1024 * 1024)
}
