use anyhow::Result;

/// Hidden argument that turns the process into a clipboard holder.
pub const DAEMON_FLAG: &str = "__clipboard_daemon";

#[cfg(all(feature = "clipboard", target_os = "linux"))]
fn run_daemon_mode() -> Result<()> {
    use arboard::{Clipboard, SetExtLinux};

    let text = std::io::read_to_string(std::io::stdin())?;
    let mut clipboard = Clipboard::new()?;
    // Blocks until another application takes clipboard ownership.
    clipboard.set().wait().text(text)?;
    Ok(())
}

/// Runs the clipboard holder if this process was spawned as one. Returns
/// `Ok(true)` when it did.
pub fn run_daemon_if_requested() -> Result<bool> {
    if !std::env::args().any(|a| a == DAEMON_FLAG) {
        return Ok(false);
    }
    #[cfg(all(feature = "clipboard", target_os = "linux"))]
    {
        run_daemon_mode()?;
    }
    Ok(true)
}

/// On Linux the selection dies with its owner, so a detached copy of this
/// binary keeps serving it after we exit.
#[cfg(feature = "clipboard")]
pub fn copy_text(text: &str) -> Result<()> {
    #[cfg(not(target_os = "linux"))]
    {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text.to_string())?;
    }

    #[cfg(target_os = "linux")]
    {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let mut child = Command::new(std::env::current_exe()?)
            .arg(DAEMON_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .current_dir("/")
            .spawn()?;

        let Some(mut stdin) = child.stdin.take() else {
            anyhow::bail!("clipboard helper has no stdin");
        };
        stdin.write_all(text.as_bytes())?;
        stdin.flush()?;
    }
    Ok(())
}

#[cfg(not(feature = "clipboard"))]
pub fn copy_text(_text: &str) -> Result<()> {
    anyhow::bail!("built without the `clipboard` feature")
}
