use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// How section headers are written in the composed prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStyle {
    Plain,
    #[default]
    Markdown,
    Xml,
}

impl HeaderStyle {
    pub const ALL: [Self; 3] = [Self::Plain, Self::Markdown, Self::Xml];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Markdown => "markdown",
            Self::Xml => "xml",
        }
    }

    fn wrap(self, title: &str, tag: &str, body: &str) -> String {
        match self {
            Self::Plain => format!("{title}:\n{body}"),
            Self::Markdown => format!("## {title}\n{body}"),
            Self::Xml => format!("<{tag}>\n{body}\n</{tag}>"),
        }
    }
}

impl fmt::Display for HeaderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HeaderStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|h| h.label() == wanted)
            .ok_or_else(|| format!("unknown header style '{s}' (expected plain, markdown or xml)"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptSections {
    pub system_prompt: String,
    pub task: String,
    pub issues: String,
    pub referenced_files: String,
}

impl PromptSections {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        [&self.system_prompt, &self.task, &self.issues, &self.referenced_files]
            .iter()
            .all(|s| s.trim().is_empty())
    }
}

/// Joins the non-blank sections, in fixed order, under `style` headers.
#[must_use]
pub fn compose_prompt(sections: &PromptSections, style: HeaderStyle) -> String {
    let parts = [
        ("System Prompt", "system_prompt", &sections.system_prompt),
        ("Task", "task", &sections.task),
        ("Issues", "issues", &sections.issues),
        ("Referenced Files", "referenced_files", &sections.referenced_files),
    ];

    parts
        .iter()
        .filter(|(_, _, body)| !body.trim().is_empty())
        .map(|(title, tag, body)| style.wrap(title, tag, body.trim_end()))
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}
