#![allow(dead_code)]
//! In-memory `RemoteStore` used by the integration tests. Records every
//! remote call so tests can assert on the exact traffic, and injects
//! failures on request.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::RemoteStore;

#[derive(Default)]
struct MockState {
    dirs: HashSet<String>,
    files: HashMap<String, Vec<u8>>,
    probes: Vec<String>,
    mkdirs: Vec<String>,
    creates: Vec<String>,
    fail_probes: HashSet<String>,
    fail_mkdirs: HashSet<String>,
    fail_create_suffixes: HashSet<String>,
    fail_write_suffixes: HashSet<String>,
}

#[derive(Default, Clone)]
pub struct MockRemote {
    state: Arc<Mutex<MockState>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `path` already exists as a directory on the remote.
    pub fn seed_dir(&self, path: &str) {
        self.state.lock().unwrap().dirs.insert(path.to_string());
    }

    /// Make `exists` fail for this exact path.
    pub fn fail_probe(&self, path: &str) {
        self.state.lock().unwrap().fail_probes.insert(path.to_string());
    }

    /// Make `mkdir` fail for this exact path.
    pub fn fail_mkdir(&self, path: &str) {
        self.state.lock().unwrap().fail_mkdirs.insert(path.to_string());
    }

    /// Make `create_write` fail for any remote path ending with `suffix`.
    pub fn fail_create(&self, suffix: &str) {
        self.state.lock().unwrap().fail_create_suffixes.insert(suffix.to_string());
    }

    /// Hand out a writer that fails on the first write for any remote path
    /// ending with `suffix`.
    pub fn fail_write(&self, suffix: &str) {
        self.state.lock().unwrap().fail_write_suffixes.insert(suffix.to_string());
    }

    pub fn probe_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().probes.clone()
    }

    pub fn mkdir_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().mkdirs.clone()
    }

    /// Remote paths of all committed files, sorted.
    pub fn uploaded(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state.lock().unwrap().files.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn file_contents(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(path).cloned()
    }
}

impl RemoteStore for MockRemote {
    fn exists(&self, p: &Path) -> Result<bool, String> {
        let key = p.to_string_lossy().to_string();
        let mut st = self.state.lock().unwrap();
        st.probes.push(key.clone());
        if st.fail_probes.contains(&key) {
            return Err("simulated probe failure".to_string());
        }
        Ok(st.dirs.contains(&key) || st.files.contains_key(&key))
    }

    fn mkdir(&self, p: &Path) -> Result<(), String> {
        let key = p.to_string_lossy().to_string();
        let mut st = self.state.lock().unwrap();
        st.mkdirs.push(key.clone());
        if st.fail_mkdirs.contains(&key) {
            return Err("simulated mkdir failure".to_string());
        }
        st.dirs.insert(key);
        Ok(())
    }

    fn create_write(&self, p: &Path) -> Result<Box<dyn Write>, String> {
        let key = p.to_string_lossy().to_string();
        let mut st = self.state.lock().unwrap();
        st.creates.push(key.clone());
        if st.fail_create_suffixes.iter().any(|sfx| key.ends_with(sfx.as_str())) {
            return Err("simulated create failure".to_string());
        }
        let fail_writes = st.fail_write_suffixes.iter().any(|sfx| key.ends_with(sfx.as_str()));
        Ok(Box::new(MockWriter {
            path: key,
            buf: Vec::new(),
            fail_writes,
            state: Arc::clone(&self.state),
        }))
    }
}

/// Buffers writes and commits the file into the mock's state on flush.
struct MockWriter {
    path: String,
    buf: Vec<u8>,
    fail_writes: bool,
    state: Arc<Mutex<MockState>>,
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated write failure"));
        }
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.fail_writes {
            let mut st = self.state.lock().unwrap();
            st.files.insert(self.path.clone(), self.buf.clone());
        }
        Ok(())
    }
}

impl Drop for MockWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
