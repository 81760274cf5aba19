use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

const RULE: &str = "-----------------------------------------------";
const END_RULE: &str = "------------------    END    -------------------";

/// Append-only operator log (`log.txt`). The opening banner is written
/// immediately so even a run that dies during startup leaves a trace.
pub struct RunLog {
    file: File,
}

impl RunLog {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open run log: {}", path.display()))?;
        let mut log = RunLog { file };
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        log.raw("");
        log.raw(RULE);
        log.raw(&format!("------------  {}  ------------", stamp));
        log.raw(RULE);
        Ok(log)
    }

    /// Write one event line. Write failures are ignored; the log never takes
    /// down a run.
    pub fn line(&mut self, msg: &str) {
        self.raw(msg);
    }

    /// Write the closing banner.
    pub fn finish(&mut self) {
        self.raw(END_RULE);
        self.raw("");
        let _ = self.file.flush();
    }

    fn raw(&mut self, msg: &str) {
        let _ = writeln!(self.file, "{}", msg);
    }
}
