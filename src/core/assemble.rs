use crate::core::{FileSystem, path_to_unix, relative_to};
use futures::future::join_all;
use regex::{Captures, Regex};
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tracing::warn;

/// Stands in for the opened folder in file labels.
pub const PROJECT_ROOT_TOKEN: &str = "<project_root>";

const BLOCK_SEPARATOR: &str = "\n\n";

/* ============================ Entity decoding ============================== */

// `&amp;` family first so `&amp;lt;` comes out as `<`.
const AMP_ENTITIES: [&str; 3] = ["&amp;", "&#38;", "&#x26;"];

// Non-breaking spaces become plain spaces in prompt text.
const NAMED_ENTITIES: [(&str, &str); 9] = [
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&#39;", "'"),
    ("&nbsp;", " "),
    ("&#160;", " "),
    ("&#xA0;", " "),
    ("&#xa0;", " "),
];

static DECIMAL_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(\d+);").expect("valid decimal entity regex"));
static HEX_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#[xX]([0-9a-fA-F]+);").expect("valid hex entity regex"));

/// Undoes HTML entity encoding: the named entities for `& < > " '` and
/// non-breaking space (decoded to an ASCII space), then decimal and hex
/// numeric references. References to invalid code points are left untouched.
#[must_use]
pub fn decode_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = text.to_string();
    for amp in AMP_ENTITIES {
        if out.contains(amp) {
            out = out.replace(amp, "&");
        }
    }
    for (entity, replacement) in NAMED_ENTITIES {
        if out.contains(entity) {
            out = out.replace(entity, replacement);
        }
    }

    let out = DECIMAL_ENTITY.replace_all(&out, |caps: &Captures| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map_or_else(|| caps[0].to_string(), String::from)
    });
    let out = HEX_ENTITY.replace_all(&out, |caps: &Captures| {
        u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map_or_else(|| caps[0].to_string(), String::from)
    });
    out.into_owned()
}

/* ================================ Labels =================================== */

/// Label used in the `path` attribute of a file block. Paths outside `root`
/// keep their absolute form.
#[must_use]
pub fn file_label(path: &Path, root: Option<&Path>) -> String {
    match root.and_then(|r| relative_to(r, path)) {
        Some(rel) if rel.as_os_str().is_empty() => PROJECT_ROOT_TOKEN.to_string(),
        Some(rel) => format!("{PROJECT_ROOT_TOKEN}/{}", path_to_unix(&rel)),
        None => path_to_unix(path),
    }
}

/* =============================== Assembly ================================== */

#[must_use]
pub fn render_file_block(label: &str, body: &str) -> String {
    format!("<file path=\"{label}\">\n{body}\n</file>")
}

/// Reads every path and renders it as a tagged block, in input order.
///
/// Reads run concurrently. A file that cannot be read becomes an inline
/// `Error loading file:` block; this never fails as a whole.
pub async fn assemble(fs: &dyn FileSystem, paths: &[PathBuf], root: Option<&Path>) -> String {
    let reads = join_all(paths.iter().map(|p| fs.read_file(p))).await;

    let blocks: Vec<String> = paths
        .iter()
        .zip(reads)
        .map(|(path, read)| {
            let label = file_label(path, root);
            match read {
                Ok(file) => render_file_block(&label, &decode_html_entities(&file.content)),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "file left out of assembly");
                    render_file_block(&label, &format!("Error loading file: {}", e.message()))
                }
            }
        })
        .collect();

    blocks.join(BLOCK_SEPARATOR)
}
