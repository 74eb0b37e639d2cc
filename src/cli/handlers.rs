use super::args::{PromptArgs, SelectionArgs};
use super::clipboard::copy_text;
use super::state::AppState;
use anyhow::{Context, Result};
use chrono::Local;
use promptloom::core::{
    CheckState, EditorBuffer, FolderCheckPolicy, FolderWatcher, FsError, LocalFs, NodeKind,
    PreviewError, PromptSections, TreeRow, assemble, compose_prompt, default_ignored_dirs,
    ensure_within_limit, lexical_normalize, load_preview, normalize_root, output_stats,
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

/* ============================== Folder & tree ============================== */

fn resolve_root(state: &AppState, arg: Option<&Path>) -> PathBuf {
    let raw = arg
        .map(Path::to_path_buf)
        .or_else(|| state.settings.last_opened_folder.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    normalize_root(&raw)
}

fn resolve_in_root(root: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        lexical_normalize(p)
    } else {
        lexical_normalize(&root.join(p))
    }
}

async fn open_folder(state: &mut AppState, sel: &SelectionArgs) -> Result<PathBuf> {
    let root = resolve_root(state, sel.root.as_deref());
    state
        .explorer
        .open_root(&root)
        .await
        .with_context(|| format!("opening {}", root.display()))?;

    state.settings.last_opened_folder = Some(root.clone());
    state.persist();
    Ok(root)
}

async fn apply_selection(state: &AppState, root: &Path, sel: &SelectionArgs) -> Result<()> {
    let explorer = &state.explorer;
    if sel.recursive {
        explorer.set_policy(FolderCheckPolicy::Recursive);
    }

    for dir in &sel.expand {
        let dir = resolve_in_root(root, dir);
        explorer.reveal(&dir).await?;
        explorer.expand(&dir).await?;
    }

    for dir in &sel.folders {
        let dir = resolve_in_root(root, dir);
        explorer.reveal(&dir).await?;
        explorer.set_folder_checked(&dir, true).await?;
    }

    for file in &sel.files {
        let file = resolve_in_root(root, file);
        explorer.reveal(&file).await?;
        let is_file = explorer
            .tree()
            .node(&file)
            .is_some_and(|n| n.kind == NodeKind::File);
        if is_file {
            explorer.set_file_checked(&file, true);
        } else {
            warn!(path = %file.display(), "not a file in the opened folder; skipped");
        }
    }

    if let Some(h) = &sel.highlight {
        let h = resolve_in_root(root, h);
        explorer.reveal(&h).await?;
        explorer.toggle_highlight(&h)?;
    }
    Ok(())
}

fn render_row(row: &TreeRow) -> String {
    let indent = "  ".repeat(row.depth);
    let check = match row.check {
        CheckState::Checked => "[x]",
        CheckState::Indeterminate => "[-]",
        CheckState::Unchecked => "[ ]",
    };
    let marker = match (row.kind, row.expanded) {
        (NodeKind::Directory, true) => "▾ ",
        (NodeKind::Directory, false) => "▸ ",
        (NodeKind::File, _) => "  ",
    };
    let suffix = if row.highlighted { "  *" } else { "" };
    format!("{indent}{check} {marker}{}{suffix}", row.name)
}

pub async fn on_tree(state: &mut AppState, sel: &SelectionArgs) -> Result<()> {
    let root = open_folder(state, sel).await?;
    apply_selection(state, &root, sel).await?;

    for row in state.explorer.visible_rows() {
        println!("{}", render_row(&row));
    }
    let selected = state.explorer.current_selection().len();
    eprintln!("{selected} file(s) selected");
    Ok(())
}

/* ================================= Output ================================== */

fn merge_field(stored: &mut String, arg: Option<&String>) {
    if let Some(v) = arg {
        stored.clone_from(v);
    }
}

async fn build_output(state: &mut AppState, root: &Path, prompt: &PromptArgs) -> Result<String> {
    merge_field(&mut state.settings.system_prompt, prompt.system_prompt.as_ref());
    merge_field(&mut state.settings.task, prompt.task.as_ref());
    merge_field(&mut state.settings.issues, prompt.issues.as_ref());
    if let Some(h) = prompt.header {
        state.settings.selected_header = h;
    }
    state.persist();

    let fs = state.explorer.fs().clone();
    let mut paths = Vec::new();
    for p in state.explorer.current_selection() {
        match ensure_within_limit(fs.as_ref(), &p).await {
            Ok(_) => paths.push(p),
            Err(e @ (PreviewError::TooLarge { .. } | PreviewError::IsDirectory(_))) => {
                eprintln!("Skipping {}: {e}", p.display());
            }
            // Unreadable files still go in; the assembler renders the error inline.
            Err(PreviewError::Fs(_)) => paths.push(p),
        }
    }

    let referenced = assemble(fs.as_ref(), &paths, Some(root)).await;

    let out = if prompt.files_only {
        referenced
    } else {
        let sections = PromptSections {
            system_prompt: state.settings.system_prompt.clone(),
            task: state.settings.task.clone(),
            issues: state.settings.issues.clone(),
            referenced_files: referenced,
        };
        compose_prompt(&sections, state.settings.selected_header)
    };

    Ok(if prompt.redact {
        state.redactor.redact(&out)
    } else {
        out
    })
}

fn emit(text: &str, copy: bool) -> Result<()> {
    let stats = output_stats(text);
    if copy {
        copy_text(text).context("copying to clipboard")?;
        eprintln!("Copied! ({stats})");
    } else {
        println!("{text}");
        eprintln!("{stats}");
    }
    Ok(())
}

pub async fn on_pack(state: &mut AppState, sel: &SelectionArgs, prompt: &PromptArgs) -> Result<()> {
    let root = open_folder(state, sel).await?;
    apply_selection(state, &root, sel).await?;

    if state.explorer.current_selection().is_empty() {
        eprintln!("No items selected.");
    }
    let out = build_output(state, &root, prompt).await?;
    emit(&out, prompt.copy)
}

fn last_refresh_label() -> String {
    let now_str = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    format!("Last refresh: {now_str}")
}

pub async fn on_watch(
    state: &mut AppState,
    sel: &SelectionArgs,
    prompt: &PromptArgs,
    interval_ms: u64,
) -> Result<()> {
    let root = open_folder(state, sel).await?;
    apply_selection(state, &root, sel).await?;

    let mut last = build_output(state, &root, prompt).await?;
    emit(&last, prompt.copy)?;
    eprintln!("{}", last_refresh_label());

    let watcher = FolderWatcher::start(&root, default_ignored_dirs())
        .with_context(|| format!("watching {}", root.display()))?;
    let mut tick = tokio::time::interval(Duration::from_millis(interval_ms.max(10)));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("watch stopped");
                return Ok(());
            }
            _ = tick.tick() => {
                if !watcher.drain_relevant() {
                    continue;
                }
                let report = state.explorer.refresh().await?;
                for gone in &report.dropped {
                    eprintln!("Dropped from selection: {}", gone.display());
                }

                let out = build_output(state, &root, prompt).await?;
                if out != last {
                    emit(&out, prompt.copy)?;
                    last = out;
                }
                eprintln!("{}", last_refresh_label());
            }
        }
    }
}

/* ============================== Single files =============================== */

pub async fn on_view(path: &Path) -> Result<()> {
    let preview = load_preview(&LocalFs, path)
        .await
        .with_context(|| format!("Error loading file: {}", path.display()))?;

    let modified = preview
        .stats
        .modified
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".into());
    eprintln!(
        "{} • {} bytes • modified {modified}",
        preview.path.display(),
        preview.stats.size
    );
    print!("{}", preview.content);
    Ok(())
}

pub async fn on_write(path: &Path) -> Result<()> {
    let fs = LocalFs;
    let mut buffer = match EditorBuffer::open(&fs, path).await {
        Ok(b) => b,
        Err(PreviewError::Fs(FsError::PathUnreadable { .. })) => {
            EditorBuffer::new(path.to_path_buf(), String::new())
        }
        Err(e) => return Err(e).with_context(|| format!("opening {}", path.display())),
    };

    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("reading stdin")?;
    buffer.set_text(text);

    if buffer.save(&fs).await? {
        eprintln!("Saved {}", buffer.path().display());
    } else {
        eprintln!("No changes to {}", buffer.path().display());
    }
    Ok(())
}

pub async fn on_redact(state: &AppState, file: Option<&Path>) -> Result<()> {
    let text = match file {
        Some(p) => tokio::fs::read_to_string(p)
            .await
            .with_context(|| format!("reading {}", p.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("reading stdin")?;
            buf
        }
    };
    print!("{}", state.redactor.redact(&text));
    Ok(())
}

pub fn on_settings(state: &AppState) -> Result<()> {
    eprintln!("{}", state.settings_path.display());
    println!("{}", serde_json::to_string_pretty(&state.settings)?);
    Ok(())
}
