use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
    sync::mpsc,
};
use tracing::debug;

pub const DEFAULT_IGNORED_DIRS: [&str; 3] = [".git", "node_modules", "target"];

#[must_use]
pub fn default_ignored_dirs() -> HashSet<String> {
    DEFAULT_IGNORED_DIRS.iter().map(|s| (*s).to_string()).collect()
}

/// Whether a change at `abs_path` can affect the tree opened at `project_root`.
#[must_use]
pub fn is_event_path_relevant<S: ::std::hash::BuildHasher>(
    project_root: &Path,
    abs_path: &Path,
    ignored_dirs: &HashSet<String, S>,
) -> bool {
    let Ok(rel) = abs_path.strip_prefix(project_root) else {
        return false;
    };

    // Root itself: always relevant
    if rel.as_os_str().is_empty() {
        return true;
    }

    !rel.components().any(|comp| match comp {
        Component::Normal(os) => ignored_dirs.contains(os.to_string_lossy().as_ref()),
        _ => false,
    })
}

/// Recursive watch on a folder, polled from the event loop.
pub struct FolderWatcher {
    root: PathBuf,
    ignored_dirs: HashSet<String>,
    rx: mpsc::Receiver<notify::Result<notify::Event>>,
    _watcher: RecommendedWatcher,
}

impl FolderWatcher {
    pub fn start(root: &Path, ignored_dirs: HashSet<String>) -> notify::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watcher: RecommendedWatcher = notify::recommended_watcher(tx)?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            root: root.to_path_buf(),
            ignored_dirs,
            rx,
            _watcher: watcher,
        })
    }

    /// Drains pending events without blocking; true if any touched a
    /// relevant path.
    pub fn drain_relevant(&self) -> bool {
        let mut relevant = false;
        while let Ok(ev_res) = self.rx.try_recv() {
            let Ok(ev) = ev_res else {
                continue;
            };
            if !relevant
                && ev
                    .paths
                    .iter()
                    .any(|p| is_event_path_relevant(&self.root, p, &self.ignored_dirs))
            {
                debug!(kind = ?ev.kind, "relevant filesystem change");
                relevant = true;
            }
        }
        relevant
    }
}
