mod assemble;
mod error;
mod explorer;
mod fs;
mod preview;
mod prompt;
mod redact;
mod settings;
mod text;
mod tree;
mod watch;

pub use assemble::*;
pub use error::*;
pub use explorer::*;
pub use fs::*;
pub use preview::*;
pub use prompt::*;
pub use redact::*;
pub use settings::*;
pub use text::*;
pub use tree::*;
pub use watch::*;
