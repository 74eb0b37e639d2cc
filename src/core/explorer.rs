use crate::core::{
    CheckState, DirEntry, FileSystem, FolderCheckPolicy, FsError, LoadStep, LoadToken, NodeKind,
    RootLoaded, TreeError, TreeModel, TreeRow, relative_to,
};
use futures::future::{FutureExt, LocalBoxFuture, Shared, join_all};
use std::{
    cell::{Ref, RefCell},
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};
use tracing::{debug, info};

type Listing = Result<Vec<DirEntry>, FsError>;
type SharedListing = Shared<LocalBoxFuture<'static, Listing>>;

/// Recursive folder checks stop descending past this depth (symlink loops).
const MAX_RECURSIVE_DEPTH: usize = 32;

struct InflightListing {
    token: LoadToken,
    listing: SharedListing,
}

/// Outcome of [`Explorer::refresh`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub retained: Vec<PathBuf>,
    pub dropped: Vec<PathBuf>,
}

/// Drives a [`TreeModel`] from a [`FileSystem`].
///
/// All methods take `&self` so that several operations can be awaited at once
/// on one thread. At most one listing per directory is ever in flight: a
/// second `expand` of the same path awaits the first one's listing.
pub struct Explorer {
    fs: Rc<dyn FileSystem>,
    tree: RefCell<TreeModel>,
    inflight: RefCell<HashMap<PathBuf, InflightListing>>,
}

impl Explorer {
    pub fn new(fs: Rc<dyn FileSystem>) -> Self {
        Self::with_policy(fs, FolderCheckPolicy::default())
    }

    pub fn with_policy(fs: Rc<dyn FileSystem>, policy: FolderCheckPolicy) -> Self {
        Self {
            fs,
            tree: RefCell::new(TreeModel::new(policy)),
            inflight: RefCell::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn fs(&self) -> &Rc<dyn FileSystem> {
        &self.fs
    }

    /// Read access to the model. Do not hold the guard across an `.await`.
    pub fn tree(&self) -> Ref<'_, TreeModel> {
        self.tree.borrow()
    }

    #[must_use]
    pub fn root(&self) -> Option<PathBuf> {
        self.tree.borrow().root().map(Path::to_path_buf)
    }

    pub fn set_policy(&self, policy: FolderCheckPolicy) {
        self.tree.borrow_mut().set_policy(policy);
    }

    /* ------------------------------ Lifecycle ------------------------------ */

    /// Replaces the tree with a one-level listing of `path`. On failure the
    /// previous tree is left untouched.
    pub async fn open_root(&self, path: &Path) -> Result<RootLoaded, TreeError> {
        let entries = self.fs.list_directory(path).await?;
        let loaded = self.tree.borrow_mut().replace_root(path, entries);
        self.inflight.borrow_mut().clear();
        info!(root = %path.display(), entries = loaded.entries, "opened folder");
        Ok(loaded)
    }

    pub fn close(&self) {
        self.tree.borrow_mut().close();
        self.inflight.borrow_mut().clear();
    }

    /* ------------------------------ Expansion ------------------------------ */

    pub async fn expand(&self, path: &Path) -> Result<(), TreeError> {
        self.load(path, true).await
    }

    pub fn collapse(&self, path: &Path) -> Result<(), TreeError> {
        self.tree.borrow_mut().collapse(path)
    }

    /// Expands every directory between the root and `path` so that `path`
    /// itself gets a node.
    pub async fn reveal(&self, path: &Path) -> Result<(), TreeError> {
        self.load_ancestors(path, true).await
    }

    /// Loads every directory between the root and `path` (exclusive), top
    /// down, expanding them only when `expand` is set.
    async fn load_ancestors(&self, path: &Path, expand: bool) -> Result<(), TreeError> {
        let root = self.root().ok_or(TreeError::NoRoot)?;
        let rel = relative_to(&root, path).ok_or_else(|| TreeError::UnknownPath(path.to_path_buf()))?;

        let comps: Vec<_> = rel.components().collect();
        let mut cur = root;
        for comp in comps.iter().take(comps.len().saturating_sub(1)) {
            cur.push(comp);
            self.load(&cur, expand).await?;
        }
        Ok(())
    }

    async fn load(&self, path: &Path, expand: bool) -> Result<(), TreeError> {
        let step = self.tree.borrow_mut().begin_load(path, expand)?;

        let (token, listing) = match step {
            LoadStep::Ready => return Ok(()),
            LoadStep::Fetch(token) => (token, self.start_listing(path, token)),
            LoadStep::Pending(token) => {
                let existing = self
                    .inflight
                    .borrow()
                    .get(path)
                    .filter(|f| f.token == token)
                    .map(|f| f.listing.clone());
                match existing {
                    Some(listing) => {
                        debug!(dir = %path.display(), "joining outstanding listing");
                        (token, listing)
                    }
                    None => {
                        let token = self.tree.borrow_mut().reissue_load(path)?;
                        (token, self.start_listing(path, token))
                    }
                }
            }
        };

        let result = listing.await;
        self.finish_listing(path, token, result)
    }

    fn start_listing(&self, path: &Path, token: LoadToken) -> SharedListing {
        let fs = Rc::clone(&self.fs);
        let owned = path.to_path_buf();
        let listing = async move { fs.list_directory(&owned).await }
            .boxed_local()
            .shared();

        self.inflight.borrow_mut().insert(
            path.to_path_buf(),
            InflightListing {
                token,
                listing: listing.clone(),
            },
        );
        listing
    }

    fn finish_listing(&self, path: &Path, token: LoadToken, result: Listing) -> Result<(), TreeError> {
        {
            let mut inflight = self.inflight.borrow_mut();
            if inflight.get(path).is_some_and(|f| f.token == token) {
                inflight.remove(path);
            }
        }

        let mut tree = self.tree.borrow_mut();
        let applied = tree.complete_load(path, token, result.clone());
        if !applied && !tree.contains(path) {
            return Ok(());
        }
        result.map(|_| ()).map_err(TreeError::from)
    }

    /* ------------------------------- Checking ------------------------------ */

    pub fn set_file_checked(&self, path: &Path, checked: bool) {
        self.tree.borrow_mut().set_file_checked(path, checked);
    }

    /// Checks the files a folder covers. An unloaded folder is listed and
    /// expanded first. Paths that are not directories are ignored.
    pub async fn set_folder_checked(&self, path: &Path, checked: bool) -> Result<(), TreeError> {
        let (kind, loaded, policy) = {
            let tree = self.tree.borrow();
            match tree.node(path) {
                Some(n) => (n.kind, n.is_loaded(), tree.policy()),
                None => return Ok(()),
            }
        };
        if kind != NodeKind::Directory {
            return Ok(());
        }
        if !loaded {
            self.load(path, true).await?;
        }
        if policy == FolderCheckPolicy::Recursive {
            self.load_descendants(path).await;
        }

        self.tree.borrow_mut().set_folder_checked(path, checked);
        Ok(())
    }

    async fn load_descendants(&self, path: &Path) {
        for depth in 0..MAX_RECURSIVE_DEPTH {
            let pending = self.tree.borrow().unloaded_descendant_dirs(path);
            if pending.is_empty() {
                return;
            }
            let results = join_all(pending.iter().map(|dir| self.load(dir, false))).await;
            for (dir, res) in pending.iter().zip(results) {
                if let Err(e) = res {
                    debug!(dir = %dir.display(), depth, error = %e, "skipping unreadable subfolder");
                }
            }
        }
    }

    #[must_use]
    pub fn folder_display_state(&self, path: &Path) -> CheckState {
        self.tree.borrow().folder_display_state(path)
    }

    pub fn toggle_highlight(&self, path: &Path) -> Result<(), TreeError> {
        self.tree.borrow_mut().toggle_highlight(path)
    }

    pub fn clear_all(&self) {
        self.tree.borrow_mut().clear_all();
    }

    #[must_use]
    pub fn current_selection(&self) -> Vec<PathBuf> {
        self.tree.borrow().current_selection()
    }

    #[must_use]
    pub fn visible_rows(&self) -> Vec<TreeRow> {
        self.tree.borrow().visible_rows()
    }

    /* ------------------------------ Reconcile ------------------------------ */

    /// Rebuilds the tree from disk, re-expands what was expanded, and keeps
    /// every selected file that still exists.
    pub async fn refresh(&self) -> Result<ReconciliationReport, TreeError> {
        let (root, selected, expanded, highlighted) = {
            let tree = self.tree.borrow();
            let root = tree.root().ok_or(TreeError::NoRoot)?.to_path_buf();
            (
                root,
                tree.current_selection(),
                tree.expanded_dirs(),
                tree.highlighted().map(Path::to_path_buf),
            )
        };

        self.open_root(&root).await?;

        // Collapsed ancestors are listed but stay collapsed.
        for dir in &expanded {
            let reexpanded = match self.load_ancestors(dir, false).await {
                Ok(()) => self.expand(dir).await,
                Err(e) => Err(e),
            };
            if let Err(e) = reexpanded {
                debug!(dir = %dir.display(), error = %e, "expanded folder no longer listable");
                let _ = self.collapse(dir);
            }
        }

        let stats = join_all(selected.iter().map(|p| self.fs.stat_path(p))).await;

        let mut report = ReconciliationReport::default();
        {
            let mut tree = self.tree.borrow_mut();
            for (path, stat) in selected.into_iter().zip(stats) {
                match stat {
                    Ok(st) if st.is_file => {
                        tree.select_path(&path);
                        report.retained.push(path);
                    }
                    _ => report.dropped.push(path),
                }
            }

            if let Some(h) = highlighted
                && tree.node(&h).is_some_and(|n| n.is_file())
            {
                let _ = tree.toggle_highlight(&h);
            }
        }

        info!(
            retained = report.retained.len(),
            dropped = report.dropped.len(),
            "refreshed folder"
        );
        Ok(report)
    }
}
