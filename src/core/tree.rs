use crate::core::{DirEntry, FsError, TreeError};
use indexmap::IndexSet;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tracing::debug;

/* ================================ Node types ================================ */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Directory,
}

/// Identifies one listing request so a late completion can be told apart from
/// the one the node is currently waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadToken(u64);

/// Load state of a directory's children. Files stay `Unloaded` forever.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Children {
    Unloaded,
    Loading(LoadToken),
    Loaded(Vec<PathBuf>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckState {
    Checked,
    Indeterminate,
    Unchecked,
}

/// Which files a folder checkbox acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FolderCheckPolicy {
    /// Only the folder's direct file children.
    #[default]
    ImmediateFiles,
    /// Every file below the folder, loading subfolders as needed.
    Recursive,
}

#[derive(Clone, Debug)]
pub struct TreeNode {
    pub name: String,
    pub path: PathBuf,
    pub kind: NodeKind,
    pub parent: Option<PathBuf>,
    pub children: Children,
    pub expanded: bool,
    pub checked: bool,
    pub highlighted: bool,
}

impl TreeNode {
    fn new(name: String, path: PathBuf, kind: NodeKind, parent: Option<PathBuf>) -> Self {
        Self {
            name,
            path,
            kind,
            parent,
            children: Children::Unloaded,
            expanded: false,
            checked: false,
            highlighted: false,
        }
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self.children, Children::Loaded(_))
    }

    /// Child paths in listing order; empty until loaded.
    #[must_use]
    pub fn child_paths(&self) -> &[PathBuf] {
        match &self.children {
            Children::Loaded(c) => c,
            _ => &[],
        }
    }
}

/* =============================== Selection set ============================== */

/// Insertion-ordered set of selected file paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    paths: IndexSet<PathBuf>,
}

impl SelectionSet {
    fn insert(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }

    fn remove(&mut self, path: &Path) -> bool {
        self.paths.shift_remove(path)
    }

    fn clear(&mut self) {
        self.paths.clear();
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.paths.iter().cloned().collect()
    }
}

/* ================================ Tree model ================================ */

/// Outcome of asking the model to load a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStep {
    /// Children are already materialized (or the node is a file).
    Ready,
    /// The caller must list the directory and report back with this token.
    Fetch(LoadToken),
    /// A listing is already outstanding under this token.
    Pending(LoadToken),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootLoaded {
    pub root: PathBuf,
    pub entries: usize,
}

/// One line of the flattened, expansion-aware view of the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeRow {
    pub path: PathBuf,
    pub name: String,
    pub depth: usize,
    pub kind: NodeKind,
    pub expanded: bool,
    pub loaded: bool,
    pub check: CheckState,
    pub highlighted: bool,
}

/// Arena of nodes keyed by absolute path.
///
/// The model is a plain state machine: it never touches the filesystem. The
/// [`crate::core::Explorer`] feeds listings into it.
#[derive(Debug, Default)]
pub struct TreeModel {
    root: Option<PathBuf>,
    nodes: HashMap<PathBuf, TreeNode>,
    selection: SelectionSet,
    highlighted: Option<PathBuf>,
    policy: FolderCheckPolicy,
    next_token: u64,
}

impl TreeModel {
    #[must_use]
    pub fn new(policy: FolderCheckPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn policy(&self) -> FolderCheckPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: FolderCheckPolicy) {
        self.policy = policy;
    }

    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    #[must_use]
    pub fn node(&self, path: &Path) -> Option<&TreeNode> {
        self.nodes.get(path)
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    #[must_use]
    pub fn current_selection(&self) -> Vec<PathBuf> {
        self.selection.to_vec()
    }

    #[must_use]
    pub fn highlighted(&self) -> Option<&Path> {
        self.highlighted.as_deref()
    }

    /* ------------------------------ Lifecycle ------------------------------ */

    /// Replaces the whole tree with `root` and its one-level listing.
    pub fn replace_root(&mut self, root: &Path, entries: Vec<DirEntry>) -> RootLoaded {
        self.nodes.clear();
        self.selection.clear();
        self.highlighted = None;

        let name = root
            .file_name()
            .map_or_else(|| root.to_string_lossy().into_owned(), |n| n.to_string_lossy().into_owned());
        let mut node = TreeNode::new(name, root.to_path_buf(), NodeKind::Directory, None);
        node.expanded = true;
        self.nodes.insert(root.to_path_buf(), node);
        self.root = Some(root.to_path_buf());

        self.materialize(root, entries);
        RootLoaded {
            root: root.to_path_buf(),
            entries: self.nodes.get(root).map_or(0, |n| n.child_paths().len()),
        }
    }

    pub fn close(&mut self) {
        self.root = None;
        self.nodes.clear();
        self.selection.clear();
        self.highlighted = None;
    }

    /* ------------------------------- Loading ------------------------------- */

    /// Starts (or joins) loading the children of `path`, optionally marking it
    /// expanded first.
    pub fn begin_load(&mut self, path: &Path, expand: bool) -> Result<LoadStep, TreeError> {
        let token = LoadToken(self.next_token);
        let node = self
            .nodes
            .get_mut(path)
            .ok_or_else(|| TreeError::UnknownPath(path.to_path_buf()))?;

        if !node.is_dir() {
            return Ok(LoadStep::Ready);
        }
        if expand {
            node.expanded = true;
        }

        match node.children {
            Children::Loaded(_) => Ok(LoadStep::Ready),
            Children::Loading(t) => Ok(LoadStep::Pending(t)),
            Children::Unloaded => {
                node.children = Children::Loading(token);
                self.next_token += 1;
                Ok(LoadStep::Fetch(token))
            }
        }
    }

    /// Swaps the token of a node stuck in `Loading` whose request was lost.
    pub fn reissue_load(&mut self, path: &Path) -> Result<LoadToken, TreeError> {
        let token = LoadToken(self.next_token);
        let node = self
            .nodes
            .get_mut(path)
            .ok_or_else(|| TreeError::UnknownPath(path.to_path_buf()))?;
        node.children = Children::Loading(token);
        self.next_token += 1;
        Ok(token)
    }

    /// Applies a finished listing. Returns `false` (and changes nothing) when
    /// the node is gone or is no longer waiting for `token`.
    pub fn complete_load(
        &mut self,
        path: &Path,
        token: LoadToken,
        result: Result<Vec<DirEntry>, FsError>,
    ) -> bool {
        let waiting = matches!(
            self.nodes.get(path).map(|n| &n.children),
            Some(Children::Loading(t)) if *t == token
        );
        if !waiting {
            debug!(dir = %path.display(), "discarding stale listing");
            return false;
        }

        match result {
            Ok(entries) => self.materialize(path, entries),
            Err(_) => {
                if let Some(node) = self.nodes.get_mut(path) {
                    node.children = Children::Unloaded;
                }
            }
        }
        true
    }

    fn materialize(&mut self, parent: &Path, entries: Vec<DirEntry>) {
        let mut child_paths = Vec::with_capacity(entries.len());

        for entry in entries {
            if self.nodes.contains_key(&entry.path) {
                continue;
            }
            let kind = if entry.is_dir {
                NodeKind::Directory
            } else {
                NodeKind::File
            };
            let mut node = TreeNode::new(
                entry.name,
                entry.path.clone(),
                kind,
                Some(parent.to_path_buf()),
            );
            node.checked = kind == NodeKind::File && self.selection.contains(&entry.path);
            child_paths.push(entry.path.clone());
            self.nodes.insert(entry.path, node);
        }

        if let Some(node) = self.nodes.get_mut(parent) {
            node.children = Children::Loaded(child_paths);
        }
    }

    /* ------------------------------ Expansion ------------------------------ */

    pub fn collapse(&mut self, path: &Path) -> Result<(), TreeError> {
        let node = self
            .nodes
            .get_mut(path)
            .ok_or_else(|| TreeError::UnknownPath(path.to_path_buf()))?;
        if node.is_dir() {
            node.expanded = false;
        }
        Ok(())
    }

    /// Expanded directories below the root, ancestors before descendants.
    #[must_use]
    pub fn expanded_dirs(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let Some(root) = self.root.as_deref() else {
            return out;
        };
        let mut stack: Vec<&Path> = vec![root];
        while let Some(p) = stack.pop() {
            let Some(node) = self.nodes.get(p) else {
                continue;
            };
            if node.is_dir() && node.expanded && p != root {
                out.push(p.to_path_buf());
            }
            for child in node.child_paths().iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Directories under `path` (excluding it) whose children are not loaded.
    #[must_use]
    pub fn unloaded_descendant_dirs(&self, path: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let mut stack: Vec<&Path> = vec![path];
        while let Some(p) = stack.pop() {
            let Some(node) = self.nodes.get(p) else {
                continue;
            };
            for child in node.child_paths() {
                match self.nodes.get(child) {
                    Some(c) if c.is_dir() && !c.is_loaded() => out.push(child.clone()),
                    Some(c) if c.is_dir() => stack.push(child),
                    _ => {}
                }
            }
        }
        out
    }

    /* ------------------------------- Checking ------------------------------ */

    pub fn set_file_checked(&mut self, path: &Path, checked: bool) {
        let Some(node) = self.nodes.get_mut(path) else {
            return;
        };
        if !node.is_file() {
            return;
        }
        node.checked = checked;
        if checked {
            self.selection.insert(path.to_path_buf());
        } else {
            self.selection.remove(path);
        }
    }

    /// Checks or unchecks the files a folder checkbox covers under the current
    /// policy. Returns `false` if `path` is not a loaded directory.
    pub fn set_folder_checked(&mut self, path: &Path, checked: bool) -> bool {
        match self.nodes.get(path) {
            Some(n) if n.is_dir() && n.is_loaded() => {}
            _ => return false,
        }
        let recursive = self.policy == FolderCheckPolicy::Recursive;
        for file in self.folder_files(path, recursive) {
            self.set_file_checked(&file, checked);
        }
        true
    }

    fn folder_files(&self, path: &Path, recursive: bool) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let Some(node) = self.nodes.get(path) else {
            return out;
        };
        for child in node.child_paths() {
            match self.nodes.get(child) {
                Some(c) if c.is_file() => out.push(child.clone()),
                Some(c) if recursive && c.is_dir() => out.extend(self.folder_files(child, true)),
                _ => {}
            }
        }
        out
    }

    /// Display state for a node: a file's own flag, or the folder projection.
    #[must_use]
    pub fn display_state(&self, path: &Path) -> Option<CheckState> {
        let node = self.nodes.get(path)?;
        if node.is_file() {
            return Some(if node.checked {
                CheckState::Checked
            } else {
                CheckState::Unchecked
            });
        }
        Some(self.folder_display_state(path))
    }

    /// Folder checkbox projection. Only direct file children count under the
    /// default policy; subfolders are ignored entirely.
    #[must_use]
    pub fn folder_display_state(&self, path: &Path) -> CheckState {
        let recursive = self.policy == FolderCheckPolicy::Recursive;
        let files = self.folder_files(path, recursive);
        if files.is_empty() {
            return CheckState::Unchecked;
        }
        let checked = files
            .iter()
            .filter(|p| self.nodes.get(*p).is_some_and(|n| n.checked))
            .count();
        if checked == files.len() {
            CheckState::Checked
        } else if checked > 0 {
            CheckState::Indeterminate
        } else {
            CheckState::Unchecked
        }
    }

    /// Adds `path` to the selection and checks its node if one exists.
    pub fn select_path(&mut self, path: &Path) {
        self.selection.insert(path.to_path_buf());
        if let Some(node) = self.nodes.get_mut(path)
            && node.is_file()
        {
            node.checked = true;
        }
    }

    /* ------------------------------ Highlight ------------------------------ */

    pub fn toggle_highlight(&mut self, path: &Path) -> Result<(), TreeError> {
        match self.nodes.get(path) {
            None => return Err(TreeError::UnknownPath(path.to_path_buf())),
            Some(n) if !n.is_file() => return Err(TreeError::NotAFile(path.to_path_buf())),
            Some(_) => {}
        }

        if let Some(prev) = self.highlighted.take()
            && let Some(node) = self.nodes.get_mut(&prev)
        {
            node.highlighted = false;
        }
        if let Some(node) = self.nodes.get_mut(path) {
            node.highlighted = true;
        }
        self.highlighted = Some(path.to_path_buf());
        Ok(())
    }

    /// Unchecks and unhighlights everything; expansion is untouched.
    pub fn clear_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.checked = false;
            node.highlighted = false;
        }
        self.selection.clear();
        self.highlighted = None;
    }

    /* -------------------------------- Views -------------------------------- */

    #[must_use]
    pub fn visible_rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        if let Some(root) = self.root.as_deref() {
            self.walk_rows(root, 0, &mut rows);
        }
        rows
    }

    fn walk_rows(&self, path: &Path, depth: usize, rows: &mut Vec<TreeRow>) {
        let Some(node) = self.nodes.get(path) else {
            return;
        };
        rows.push(TreeRow {
            path: node.path.clone(),
            name: node.name.clone(),
            depth,
            kind: node.kind,
            expanded: node.is_dir() && node.expanded,
            loaded: node.is_loaded(),
            check: self.display_state(path).unwrap_or(CheckState::Unchecked),
            highlighted: node.highlighted,
        });
        if node.is_dir() && node.expanded {
            for child in node.child_paths() {
                self.walk_rows(child, depth + 1, rows);
            }
        }
    }
}
