use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::TransferError;
use crate::outcome::{FileFailure, TransferOutcome};
use crate::remote::RemoteStore;
use crate::scan::Candidate;
use crate::settings::Layout;

/// Switches the upload engine needs from the run configuration.
#[derive(Clone)]
pub struct EngineOptions {
    pub layout: Layout,
    pub suffix: String,
    pub quiet: bool,
}

/// True when `name` ends with `suffix`, compared case-insensitively.
fn qualifies(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name.is_char_boundary(name.len() - suffix.len())
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Files under `root` whose names carry the transfer suffix, paired with
/// their `/`-separated paths relative to `root`. Sorted by file name so runs
/// are deterministic.
fn qualifying_files(root: &Path, suffix: &str) -> Vec<(PathBuf, String)> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name().into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            tracing::debug!("skipping non-UTF-8 file name under {}", root.display());
            continue;
        };
        if !qualifies(name, suffix) {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let rel = rel.to_string_lossy().replace('\\', "/");
        files.push((entry.path().to_path_buf(), rel));
    }
    files
}

/// In mirror layout, create the missing remote ancestors of `rel` below the
/// candidate's remote directory. `created` caches directories already seen so
/// each is probed at most once per run.
fn ensure_remote_parents(
    store: &dyn RemoteStore,
    remote_root: &str,
    rel: &Path,
    created: &mut HashSet<String>,
) -> Result<(), TransferError> {
    let Some(parent) = rel.parent() else {
        return Ok(());
    };
    let mut accum = remote_root.trim_end_matches('/').to_string();
    for comp in parent.components() {
        if let Component::Normal(seg) = comp {
            accum = format!("{}/{}", accum, seg.to_string_lossy());
            if created.contains(&accum) {
                continue;
            }
            let present = store
                .exists(Path::new(&accum))
                .map_err(|e| TransferError::ProbeFailed(accum.clone(), e))?;
            if !present {
                store
                    .mkdir(Path::new(&accum))
                    .map_err(|e| TransferError::CreateRemoteDirFailed(accum.clone(), e))?;
            }
            created.insert(accum.clone());
        }
    }
    Ok(())
}

fn upload_one(
    store: &dyn RemoteStore,
    remote_root: &str,
    local: &Path,
    rel: &str,
    layout: Layout,
    created: &mut HashSet<String>,
) -> Result<u64, TransferError> {
    let rel_path = Path::new(rel);
    let remote_path = match layout {
        Layout::Flat => {
            let base = rel_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| rel.to_string());
            format!("{}/{}", remote_root.trim_end_matches('/'), base)
        }
        Layout::Mirror => {
            ensure_remote_parents(store, remote_root, rel_path, created)?;
            format!("{}/{}", remote_root.trim_end_matches('/'), rel)
        }
    };

    let mut local_file = File::open(local)
        .map_err(|e| TransferError::UploadFailed(rel.to_string(), format!("local open failed: {}", e)))?;
    let mut remote_file = store
        .create_write(Path::new(&remote_path))
        .map_err(|e| TransferError::UploadFailed(rel.to_string(), e))?;
    let bytes = std::io::copy(&mut local_file, &mut remote_file)
        .map_err(|e| TransferError::UploadFailed(rel.to_string(), e.to_string()))?;
    remote_file
        .flush()
        .map_err(|e| TransferError::UploadFailed(rel.to_string(), e.to_string()))?;
    Ok(bytes)
}

/// Upload one candidate directory's qualifying files. The candidate's remote
/// directory must already exist; mirror layout creates the intermediate ones
/// on demand. Per-file failures are recorded and the remaining files still
/// go up.
pub fn upload_directory(
    store: &dyn RemoteStore,
    cand: &Candidate,
    opts: &EngineOptions,
) -> TransferOutcome {
    let files = qualifying_files(&cand.path, &opts.suffix);
    tracing::debug!("{}: {} files qualify for transfer", cand.name, files.len());
    let pb = crate::util::dir_progress(files.len() as u64, &cand.name, opts.quiet);
    let mut outcome = TransferOutcome::default();
    let mut created: HashSet<String> = HashSet::new();
    for (local, rel) in files {
        pb.set_message(rel.clone());
        match upload_one(store, &cand.remote_path, &local, &rel, opts.layout, &mut created) {
            Ok(bytes) => {
                outcome.uploaded += 1;
                outcome.bytes += bytes;
            }
            Err(err) => {
                tracing::debug!("{}: {}", cand.name, err);
                outcome.failures.push(FileFailure::new(&rel, &err));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::MockRemote;
    use std::fs;

    fn write_file(path: &Path, contents: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    fn candidate(root: &Path, name: &str) -> Candidate {
        Candidate {
            name: name.to_string(),
            path: root.join(name),
            remote_path: format!("/storage/{}", name),
            backup_path: root.join("backup").join(name),
        }
    }

    fn options(layout: Layout) -> EngineOptions {
        EngineOptions { layout, suffix: ".tif".to_string(), quiet: true }
    }

    #[test]
    fn suffix_match_ignores_case() {
        assert!(qualifies("scan_001.tif", ".tif"));
        assert!(qualifies("scan_001.TIF", ".tif"));
        assert!(!qualifies("scan_001.tiff", ".tif"));
        assert!(!qualifies("notes.txt", ".tif"));
        assert!(!qualifies("tif", ".tif"));
    }

    #[test]
    fn flat_layout_uploads_by_base_name() {
        let tmp = tempfile::tempdir().unwrap();
        let cand = candidate(tmp.path(), "Sample_001");
        write_file(&cand.path.join("a.tif"), b"aaa");
        write_file(&cand.path.join("deep/nested/b.tif"), b"bbbb");
        write_file(&cand.path.join("notes.txt"), b"skip me");

        let remote = MockRemote::new();
        let outcome = upload_directory(&remote, &cand, &options(Layout::Flat));

        assert_eq!(outcome.uploaded, 2);
        assert_eq!(outcome.bytes, 7);
        assert!(outcome.failures.is_empty());
        assert_eq!(
            remote.uploaded(),
            vec!["/storage/Sample_001/a.tif".to_string(), "/storage/Sample_001/b.tif".to_string()]
        );
        assert_eq!(remote.file_contents("/storage/Sample_001/b.tif").unwrap(), b"bbbb");
        // flat layout never creates intermediate remote directories
        assert!(remote.mkdir_calls().is_empty());
    }

    #[test]
    fn mirror_layout_recreates_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        let cand = candidate(tmp.path(), "Sample_002");
        write_file(&cand.path.join("deep/nested/b.tif"), b"bb");
        write_file(&cand.path.join("deep/other.tif"), b"cc");

        let remote = MockRemote::new();
        let outcome = upload_directory(&remote, &cand, &options(Layout::Mirror));

        assert_eq!(outcome.uploaded, 2);
        assert_eq!(
            remote.uploaded(),
            vec![
                "/storage/Sample_002/deep/nested/b.tif".to_string(),
                "/storage/Sample_002/deep/other.tif".to_string(),
            ]
        );
        // each intermediate directory is created once
        assert_eq!(
            remote.mkdir_calls(),
            vec!["/storage/Sample_002/deep".to_string(), "/storage/Sample_002/deep/nested".to_string()]
        );
    }

    #[test]
    fn failed_file_is_recorded_and_the_rest_still_upload() {
        let tmp = tempfile::tempdir().unwrap();
        let cand = candidate(tmp.path(), "Sample_003");
        write_file(&cand.path.join("a.tif"), b"a");
        write_file(&cand.path.join("b.tif"), b"b");
        write_file(&cand.path.join("c.tif"), b"c");

        let remote = MockRemote::new();
        remote.fail_create("b.tif");
        let outcome = upload_directory(&remote, &cand, &options(Layout::Flat));

        assert_eq!(outcome.uploaded, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].name, "b.tif");
        assert!(outcome.failures[0].detail.contains("simulated create failure"));
        assert_eq!(
            remote.uploaded(),
            vec!["/storage/Sample_003/a.tif".to_string(), "/storage/Sample_003/c.tif".to_string()]
        );
    }

    #[test]
    fn write_failure_surfaces_as_upload_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let cand = candidate(tmp.path(), "Sample_004");
        write_file(&cand.path.join("a.tif"), b"payload");

        let remote = MockRemote::new();
        remote.fail_write("a.tif");
        let outcome = upload_directory(&remote, &cand, &options(Layout::Flat));

        assert_eq!(outcome.uploaded, 0);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].detail.contains("upload failed"));
        assert!(remote.uploaded().is_empty());
    }
}
