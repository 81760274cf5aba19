use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use indicatif::{ProgressBar, ProgressStyle};

use crate::SessionError;

/// Try to enable ANSI escape sequence support on Windows consoles.
/// Returns true if colored output can be used.
#[cfg(windows)]
pub fn try_enable_ansi_on_windows() -> bool {
    enable_ansi_support::enable_ansi_support().is_ok()
}

// On non-Windows platforms terminals support ANSI already.
#[cfg(not(windows))]
pub fn try_enable_ansi_on_windows() -> bool {
    true
}

/// Convert a byte count into a human readable string using IEC units (KiB/MiB/GiB).
pub fn human_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GiB", b / GB)
    } else if b >= MB {
        format!("{:.2} MiB", b / MB)
    } else if b >= KB {
        format!("{:.2} KiB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Directory of the running executable. `settings.yaml` and `log.txt` live
/// there by default so the tool can be dropped next to the data it manages.
pub fn exe_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate the running executable")?;
    let dir = exe.parent().context("executable has no parent directory")?;
    Ok(dir.to_path_buf())
}

/// Per-directory progress bar: the length is the number of qualifying files
/// and the message shows the file in flight. Hidden in quiet mode.
pub fn dir_progress(len: u64, name: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template(
        "{spinner:.green} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}",
    )
    .expect("valid progress template")
    .progress_chars("=> ");
    let pb = ProgressBar::new(len);
    pb.set_style(style);
    pb.set_prefix(name.to_string());
    pb
}

/// Read the key passphrase without echoing. Printable keys accumulate,
/// backspace edits, Enter submits, Esc or Ctrl-C aborts the run. When the
/// terminal cannot enter raw mode (redirected stdin) the line is read
/// plainly instead.
pub fn prompt_passphrase(prompt: &str) -> Result<String> {
    let mut out = std::io::stdout();
    write!(out, "{}", prompt)?;
    out.flush()?;

    if enable_raw_mode().is_err() {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        return Ok(line.trim_end_matches(['\r', '\n']).to_string());
    }

    let mut entered = String::new();
    let res: Result<String> = loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Enter => break Ok(entered),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    break Err(SessionError::PromptAborted.into());
                }
                KeyCode::Char(c) => entered.push(c),
                KeyCode::Backspace => {
                    entered.pop();
                }
                KeyCode::Esc => break Err(SessionError::PromptAborted.into()),
                _ => {}
            },
            Ok(_) => {}
            Err(e) => break Err(e.into()),
        }
    };
    let _ = disable_raw_mode();
    println!();
    res
}
