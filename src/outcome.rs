use crate::error::TransferError;

/// One failed file operation, kept for the run report and the log.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub name: String,
    pub detail: String,
}

impl FileFailure {
    pub fn new(name: impl Into<String>, err: &TransferError) -> Self {
        Self { name: name.into(), detail: err.to_string() }
    }
}

/// Result of the upload step for one candidate directory.
#[derive(Debug, Clone, Default)]
pub struct TransferOutcome {
    pub uploaded: u64,
    pub bytes: u64,
    pub failures: Vec<FileFailure>,
    pub skipped_existing: bool,
}

impl TransferOutcome {
    /// Guard tripped: the directory already exists on the remote.
    pub fn skipped() -> Self {
        Self { skipped_existing: true, ..Self::default() }
    }

    /// Nothing was uploaded because the directory could not be started
    /// (probe failure or remote mkdir failure).
    pub fn aborted(name: &str, err: &TransferError) -> Self {
        Self { failures: vec![FileFailure::new(name, err)], ..Self::default() }
    }

    pub fn is_clean(&self) -> bool {
        !self.skipped_existing && self.failures.is_empty()
    }
}

/// Result of the backup relocation step for one candidate directory.
#[derive(Debug, Clone, Default)]
pub struct ArchiveOutcome {
    pub moved: u64,
    pub failures: Vec<FileFailure>,
    pub skipped_existing: bool,
}

impl ArchiveOutcome {
    /// Guard tripped: the directory already exists in the backup folder.
    pub fn skipped() -> Self {
        Self { skipped_existing: true, ..Self::default() }
    }

    pub fn is_clean(&self) -> bool {
        !self.skipped_existing && self.failures.is_empty()
    }
}

/// Everything that happened to one matched directory. `archive` is `None`
/// when the upload step never completed enough to archive (remote guard
/// trip, probe or mkdir failure) and in dry runs.
#[derive(Debug, Clone)]
pub struct DirReport {
    pub name: String,
    pub transfer: TransferOutcome,
    pub archive: Option<ArchiveOutcome>,
}

/// Ordered per-directory outcomes for a whole run. The final verdict and the
/// process exit code are a fold over these; no step mutates shared state.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub dirs: Vec<DirReport>,
    pub halted: bool,
}

impl RunReport {
    pub fn push(&mut self, dir: DirReport) {
        self.dirs.push(dir);
    }

    pub fn errors_found(&self) -> bool {
        self.dirs
            .iter()
            .any(|d| !d.transfer.is_clean() || d.archive.as_ref().is_some_and(|a| !a.is_clean()))
    }

    pub fn uploaded_files(&self) -> u64 {
        self.dirs.iter().map(|d| d.transfer.uploaded).sum()
    }

    pub fn uploaded_bytes(&self) -> u64 {
        self.dirs.iter().map(|d| d.transfer.bytes).sum()
    }

    pub fn moved_files(&self) -> u64 {
        self.dirs.iter().filter_map(|d| d.archive.as_ref()).map(|a| a.moved).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.dirs
            .iter()
            .map(|d| {
                d.transfer.failures.len()
                    + d.archive.as_ref().map_or(0, |a| a.failures.len())
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_dir(name: &str, uploaded: u64) -> DirReport {
        DirReport {
            name: name.to_string(),
            transfer: TransferOutcome { uploaded, bytes: uploaded * 10, ..Default::default() },
            archive: Some(ArchiveOutcome { moved: uploaded, ..Default::default() }),
        }
    }

    #[test]
    fn clean_run_reports_no_errors() {
        let mut report = RunReport::default();
        report.push(clean_dir("a", 3));
        report.push(clean_dir("b", 2));
        assert!(!report.errors_found());
        assert_eq!(report.uploaded_files(), 5);
        assert_eq!(report.moved_files(), 5);
        assert_eq!(report.failure_count(), 0);
    }

    #[test]
    fn guard_skip_counts_as_error() {
        let mut report = RunReport::default();
        report.push(DirReport {
            name: "dup".to_string(),
            transfer: TransferOutcome::skipped(),
            archive: None,
        });
        assert!(report.errors_found());
        assert_eq!(report.uploaded_files(), 0);
    }

    #[test]
    fn archive_failure_counts_as_error() {
        let mut report = RunReport::default();
        let mut dir = clean_dir("a", 1);
        dir.archive = Some(ArchiveOutcome {
            moved: 0,
            failures: vec![FileFailure::new(
                "x.tif",
                &TransferError::MoveFailed("x.tif".to_string(), "denied".to_string()),
            )],
            skipped_existing: false,
        });
        report.push(dir);
        assert!(report.errors_found());
        assert_eq!(report.failure_count(), 1);
    }
}
