use std::path::Path;

use anyhow::Result;

use crate::TransferError;
use crate::archive;
use crate::outcome::{DirReport, RunReport, TransferOutcome};
use crate::remote::RemoteStore;
use crate::runlog::RunLog;
use crate::scan::{self, Candidate};
use crate::settings::{ConflictPolicy, Settings};
use crate::transfer::{self, EngineOptions};

/// Per-run switches assembled from the settings file and the command line.
#[derive(Clone)]
pub struct RunOptions {
    pub policy: ConflictPolicy,
    pub engine: EngineOptions,
    pub dry_run: bool,
}

/// The log line names the extension without its dot.
fn suffix_label(suffix: &str) -> &str {
    suffix.trim_start_matches('.')
}

fn process_candidate(
    store: &dyn RemoteStore,
    cand: &Candidate,
    opts: &RunOptions,
    log: &mut RunLog,
) -> (DirReport, bool) {
    let halt_on_conflict = opts.policy == ConflictPolicy::Halt;

    // The probe is the only remote call allowed before the existence answer
    // is in. A failed probe is treated like a tripped guard: nothing is
    // uploaded and nothing moves locally.
    match store.exists(Path::new(&cand.remote_path)) {
        Ok(true) => {
            log.line("This directory already exists on hie-storage - Aborting");
            let dir = DirReport {
                name: cand.name.clone(),
                transfer: TransferOutcome::skipped(),
                archive: None,
            };
            return (dir, halt_on_conflict);
        }
        Err(detail) => {
            let err = TransferError::ProbeFailed(cand.remote_path.clone(), detail);
            log.line(&err.to_string());
            let dir = DirReport {
                name: cand.name.clone(),
                transfer: TransferOutcome::aborted(&cand.name, &err),
                archive: None,
            };
            return (dir, halt_on_conflict);
        }
        Ok(false) => {}
    }

    if opts.dry_run {
        log.line(&format!("Would transfer {} to HIE-Storage (dry run)", cand.name));
        let dir = DirReport {
            name: cand.name.clone(),
            transfer: TransferOutcome::default(),
            archive: None,
        };
        return (dir, false);
    }

    if let Err(detail) = store.mkdir(Path::new(&cand.remote_path)) {
        let err = TransferError::CreateRemoteDirFailed(cand.remote_path.clone(), detail);
        log.line(&err.to_string());
        let dir = DirReport {
            name: cand.name.clone(),
            transfer: TransferOutcome::aborted(&cand.name, &err),
            archive: None,
        };
        return (dir, false);
    }

    log.line(&format!("Transferring {} to HIE-Storage", cand.name));
    let transfer = transfer::upload_directory(store, cand, &opts.engine);
    for failure in &transfer.failures {
        log.line(&failure.detail);
    }
    log.line(&format!(
        "{} directory (containing {} {} files) transferred to HIE-Storage",
        cand.name,
        transfer.uploaded,
        suffix_label(&opts.engine.suffix)
    ));

    // Upload failures never block the relocation; what went up cleanly is on
    // the storage host either way and the operator gets the failures in the
    // report.
    let archive = archive::archive_directory(cand, opts.engine.layout);
    if archive.skipped_existing {
        log.line("This directory already exists in the backups folder - Aborting");
        let dir = DirReport { name: cand.name.clone(), transfer, archive: Some(archive) };
        return (dir, halt_on_conflict);
    }
    for failure in &archive.failures {
        log.line(&failure.detail);
    }
    if archive.failures.is_empty() {
        log.line(&format!("{} directory moved to Backups folder", cand.name));
    }
    let dir = DirReport { name: cand.name.clone(), transfer, archive: Some(archive) };
    (dir, false)
}

/// Execute one full run: scan the source root, then guard, upload and
/// relocate each matching directory in name order.
pub fn run(
    store: &dyn RemoteStore,
    settings: &Settings,
    opts: &RunOptions,
    log: &mut RunLog,
) -> Result<RunReport> {
    log.line(&format!(
        "Searching for directories in \"{}\" to be transferred to HIE-Storage",
        settings.source_dir.display()
    ));

    let pattern = scan::compile_pattern(&settings.regex_matcher)?;
    let candidates = scan::scan(settings, &pattern)?;
    tracing::debug!("scan found {} matching directories", candidates.len());

    let mut report = RunReport::default();
    for cand in &candidates {
        log.line(&format!("Match found - {}", cand.name));
        let (dir, halt) = process_candidate(store, cand, opts, log);
        report.push(dir);
        if halt {
            report.halted = true;
            tracing::debug!("halting run after {}", cand.name);
            break;
        }
    }
    Ok(report)
}
