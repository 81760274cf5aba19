use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::TransferError;
use crate::outcome::{ArchiveOutcome, FileFailure};
use crate::scan::Candidate;
use crate::settings::Layout;

/// Move with rename first, copy-then-remove when rename fails (typically a
/// cross-device backup folder).
fn move_file(src: &Path, dst: &Path) -> Result<(), String> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!("rename failed for {}: {}; copying instead", src.display(), rename_err);
            fs::copy(src, dst).map_err(|e| e.to_string())?;
            fs::remove_file(src).map_err(|e| e.to_string())
        }
    }
}

/// Relocate one transferred directory's files into the backup folder. All
/// files move, not just the uploaded ones. The first failed move ends the
/// relocation so the directory is left for the operator instead of being
/// half-drained further. Source subdirectories are never removed.
pub fn archive_directory(cand: &Candidate, layout: Layout) -> ArchiveOutcome {
    archive_with(cand, layout, move_file)
}

fn archive_with<F>(cand: &Candidate, layout: Layout, mut move_one: F) -> ArchiveOutcome
where
    F: FnMut(&Path, &Path) -> Result<(), String>,
{
    if cand.backup_path.exists() {
        return ArchiveOutcome::skipped();
    }
    let parent_ok = cand.backup_path.parent().map(|p| p.is_dir()).unwrap_or(false);
    if !parent_ok {
        let parent = cand.backup_path.parent().map(|p| p.display().to_string()).unwrap_or_default();
        let err = TransferError::BackupRootMissing(parent);
        return ArchiveOutcome { failures: vec![FileFailure::new(&cand.name, &err)], ..Default::default() };
    }
    if let Err(e) = fs::create_dir(&cand.backup_path) {
        let err = TransferError::CreateBackupDirFailed(cand.backup_path.display().to_string(), e.to_string());
        return ArchiveOutcome { failures: vec![FileFailure::new(&cand.name, &err)], ..Default::default() };
    }

    let mut outcome = ArchiveOutcome::default();
    for entry in WalkDir::new(&cand.path).sort_by_file_name().into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(&cand.path).unwrap_or(entry.path()).to_path_buf();
        let dest = match layout {
            Layout::Flat => cand.backup_path.join(entry.file_name()),
            Layout::Mirror => cand.backup_path.join(&rel),
        };
        if layout == Layout::Mirror
            && let Some(parent) = dest.parent()
            && !parent.exists()
        {
            if let Err(e) = fs::create_dir_all(parent) {
                let err = TransferError::CreateBackupDirFailed(parent.display().to_string(), e.to_string());
                outcome.failures.push(FileFailure::new(rel.to_string_lossy(), &err));
                break;
            }
        }
        match move_one(entry.path(), &dest) {
            Ok(()) => outcome.moved += 1,
            Err(detail) => {
                let rel_str = rel.to_string_lossy().to_string();
                let err = TransferError::MoveFailed(rel_str.clone(), detail);
                outcome.failures.push(FileFailure::new(rel_str, &err));
                break;
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_file(path: &Path, contents: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    fn candidate(root: &Path, name: &str) -> Candidate {
        let backup_root = root.join("backups");
        fs::create_dir_all(&backup_root).unwrap();
        Candidate {
            name: name.to_string(),
            path: root.join(name),
            remote_path: format!("/storage/{}", name),
            backup_path: backup_root.join(name),
        }
    }

    fn names_under(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(dir)
            .into_iter()
            .flatten()
            .filter(|e| e.file_type().is_file())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn flat_move_flattens_nested_files() {
        let tmp = tempfile::tempdir().unwrap();
        let cand = candidate(tmp.path(), "Sample_001");
        write_file(&cand.path.join("a.tif"), b"a");
        write_file(&cand.path.join("deep/b.tif"), b"b");
        write_file(&cand.path.join("notes.txt"), b"n");

        let outcome = archive_directory(&cand, Layout::Flat);

        assert_eq!(outcome.moved, 3);
        assert!(outcome.is_clean());
        assert_eq!(names_under(&cand.backup_path), vec!["a.tif", "b.tif", "notes.txt"]);
        // source files are gone but the emptied subdirectory survives
        assert!(names_under(&cand.path).is_empty());
        assert!(cand.path.join("deep").is_dir());
    }

    #[test]
    fn mirror_move_preserves_structure() {
        let tmp = tempfile::tempdir().unwrap();
        let cand = candidate(tmp.path(), "Sample_002");
        write_file(&cand.path.join("deep/nested/b.tif"), b"b");
        write_file(&cand.path.join("top.tif"), b"t");

        let outcome = archive_directory(&cand, Layout::Mirror);

        assert_eq!(outcome.moved, 2);
        assert!(cand.backup_path.join("deep/nested/b.tif").is_file());
        assert!(cand.backup_path.join("top.tif").is_file());
    }

    #[test]
    fn existing_backup_directory_skips_the_move() {
        let tmp = tempfile::tempdir().unwrap();
        let cand = candidate(tmp.path(), "Sample_003");
        write_file(&cand.path.join("a.tif"), b"a");
        fs::create_dir_all(&cand.backup_path).unwrap();

        let outcome = archive_directory(&cand, Layout::Flat);

        assert!(outcome.skipped_existing);
        assert_eq!(outcome.moved, 0);
        // nothing was drained from the source
        assert!(cand.path.join("a.tif").is_file());
    }

    #[test]
    fn missing_backup_root_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let cand = Candidate {
            name: "Sample_004".to_string(),
            path: tmp.path().join("Sample_004"),
            remote_path: "/storage/Sample_004".to_string(),
            backup_path: tmp.path().join("no_such_root/Sample_004"),
        };
        write_file(&cand.path.join("a.tif"), b"a");

        let outcome = archive_directory(&cand, Layout::Flat);

        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].detail.contains("backup root does not exist"));
        assert!(cand.path.join("a.tif").is_file());
    }

    #[test]
    fn move_into_a_missing_parent_keeps_the_source() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("a.tif");
        fs::write(&src, b"a").unwrap();
        let dst = tmp.path().join("no_such_dir/a.tif");

        // rename and the copy fallback both hit the missing parent
        let err = move_file(&src, &dst).unwrap_err();

        assert!(!err.is_empty());
        assert!(src.is_file());
        assert!(!dst.exists());
    }

    #[test]
    fn first_failed_move_stops_the_relocation() {
        let tmp = tempfile::tempdir().unwrap();
        let cand = candidate(tmp.path(), "Sample_005");
        write_file(&cand.path.join("a.tif"), b"a");
        write_file(&cand.path.join("b.tif"), b"b");
        write_file(&cand.path.join("c.tif"), b"c");

        let outcome = archive_with(&cand, Layout::Flat, |src: &Path, dst: &Path| {
            if src.ends_with("b.tif") {
                Err("simulated move failure".to_string())
            } else {
                move_file(src, dst)
            }
        });

        assert_eq!(outcome.moved, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].name, "b.tif");
        assert!(outcome.failures[0].detail.contains("move to backup failed"));
        // the failed file and everything after it stay put
        assert!(cand.path.join("b.tif").is_file());
        assert!(cand.path.join("c.tif").is_file());
        assert!(cand.backup_path.join("a.tif").is_file());
        assert!(!cand.backup_path.join("c.tif").exists());
    }
}
