use clap::{Args, Parser, Subcommand};
use promptloom::core::HeaderStyle;
use std::path::PathBuf;

/// promptloom – pick project files and weave them into one prompt
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (defaults to $PROMPTLOOM_CONFIG, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the folder tree with checkbox states
    Tree(SelectionArgs),
    /// Assemble the selected files (and prompt fields) and print or copy them
    Pack(PackArgs),
    /// Like `pack`, but re-assemble whenever the folder changes on disk
    Watch(WatchArgs),
    /// Show a file, refusing directories and files above 10 MB
    View {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Replace a file's content with stdin
    Write {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Scrub secrets and personal data from a file (or stdin)
    Redact {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Print the stored settings
    Settings,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Folder to open (defaults to the last opened folder, then CWD)
    #[arg(value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Check a file. Relative paths are resolved against DIR.
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Check a folder's files (direct children only unless --recursive)
    #[arg(long = "folder", value_name = "PATH")]
    pub folders: Vec<PathBuf>,

    /// Make --folder include files in all subfolders
    #[arg(long)]
    pub recursive: bool,

    /// Expand a folder in the printed tree
    #[arg(long = "expand", value_name = "PATH")]
    pub expand: Vec<PathBuf>,

    /// Mark a file as the previewed one
    #[arg(long, value_name = "PATH")]
    pub highlight: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PromptArgs {
    /// System prompt text (stored for next time)
    #[arg(long, value_name = "TEXT")]
    pub system_prompt: Option<String>,

    /// Task description (stored for next time)
    #[arg(long, value_name = "TEXT")]
    pub task: Option<String>,

    /// Known issues or constraints (stored for next time)
    #[arg(long, value_name = "TEXT")]
    pub issues: Option<String>,

    /// Section header style: plain, markdown or xml
    #[arg(long, value_name = "STYLE")]
    pub header: Option<HeaderStyle>,

    /// Only emit the <file> blocks, without prompt sections
    #[arg(long)]
    pub files_only: bool,

    /// Run the output through the redaction filter
    #[arg(long)]
    pub redact: bool,

    /// Copy the output to the clipboard instead of printing it
    #[arg(long)]
    pub copy: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PackArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub prompt: PromptArgs,
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub prompt: PromptArgs,

    /// How often to check for filesystem events
    #[arg(long, value_name = "MS", default_value_t = 250)]
    pub interval_ms: u64,
}
