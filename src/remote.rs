// remote module: the storage-host seam the pipeline talks to
pub mod mock;
mod session;

use std::io::Write;
use std::path::Path;

pub use session::connect_session;

// LIBSSH2_FX_NO_SUCH_FILE
const SFTP_NO_SUCH_FILE: i32 = 2;

/// Trait abstracting the remote operations a run needs. Errors are raw
/// message strings; callers wrap them into structured errors. Boxed writers
/// let tests inject in-memory sinks.
pub trait RemoteStore {
    /// Three-valued existence probe: `Ok(true)` and `Ok(false)` are clean
    /// answers, `Err` is a failed probe and never implies either. The probe
    /// performs no writes.
    fn exists(&self, p: &Path) -> Result<bool, String>;
    fn mkdir(&self, p: &Path) -> Result<(), String>;
    fn create_write(&self, p: &Path) -> Result<Box<dyn Write>, String>;
}

/// Adapter that owns an `ssh2::Sftp` and implements `RemoteStore`.
pub struct Ssh2Store(pub ssh2::Sftp);

impl RemoteStore for Ssh2Store {
    fn exists(&self, p: &Path) -> Result<bool, String> {
        match self.0.stat(p) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ssh2::ErrorCode::SFTP(SFTP_NO_SUCH_FILE) => Ok(false),
            Err(e) => Err(e.to_string()),
        }
    }

    fn mkdir(&self, p: &Path) -> Result<(), String> {
        self.0.mkdir(p, 0o755).map_err(|e| e.to_string())
    }

    fn create_write(&self, p: &Path) -> Result<Box<dyn Write>, String> {
        match self.0.create(p) {
            Ok(f) => Ok(Box::new(f)),
            Err(e) => Err(e.to_string()),
        }
    }
}
