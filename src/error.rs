/// Session-establishment errors raised before any directory is processed.
#[derive(Debug, Clone)]
pub enum SessionError {
    NoAddress(String),
    ConnectFailed(String, String),
    SessionCreateFailed(String),
    HandshakeFailed(String, String),
    AuthFailed(String, String),
    SftpChannelFailed(String, String),
    PromptAborted,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use SessionError::*;
        match self {
            NoAddress(addr) => write!(f, "cannot resolve address: {}", addr),
            ConnectFailed(addr, msg) => write!(f, "TCP connect failed: {}: {}", addr, msg),
            SessionCreateFailed(addr) => write!(f, "cannot create SSH session: {}", addr),
            HandshakeFailed(addr, msg) => write!(f, "SSH handshake failed: {}: {}", addr, msg),
            AuthFailed(addr, msg) => {
                write!(f, "SSH key authentication failed: {}: {}", addr, msg)
            }
            SftpChannelFailed(addr, msg) => {
                write!(f, "failed to open SFTP channel: {}: {}", addr, msg)
            }
            PromptAborted => write!(f, "passphrase prompt aborted"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Per-run failures that are useful to represent programmatically instead of
/// ad-hoc formatted strings. Recorded ones end up in the run report; the
/// scan-side ones abort the run.
#[derive(Debug, Clone)]
pub enum TransferError {
    SourceRootMissing(String),
    SourceReadFailed(String, String),
    InvalidPattern(String, String),
    ProbeFailed(String, String),
    CreateRemoteDirFailed(String, String),
    UploadFailed(String, String),
    BackupRootMissing(String),
    CreateBackupDirFailed(String, String),
    MoveFailed(String, String),
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use TransferError::*;
        match self {
            SourceRootMissing(p) => {
                write!(f, "source directory does not exist or is not a directory: {}", p)
            }
            SourceReadFailed(p, msg) => write!(f, "failed to read source directory: {}: {}", p, msg),
            InvalidPattern(pat, msg) => {
                write!(f, "invalid directory name pattern '{}': {}", pat, msg)
            }
            ProbeFailed(p, msg) => write!(f, "remote existence check failed: {}: {}", p, msg),
            CreateRemoteDirFailed(p, msg) => {
                write!(f, "failed to create remote directory: {}: {}", p, msg)
            }
            UploadFailed(p, msg) => write!(f, "upload failed: {}: {}", p, msg),
            BackupRootMissing(p) => write!(f, "backup root does not exist: {}", p),
            CreateBackupDirFailed(p, msg) => {
                write!(f, "failed to create backup directory: {}: {}", p, msg)
            }
            MoveFailed(p, msg) => write!(f, "move to backup failed: {}: {}", p, msg),
        }
    }
}

impl std::error::Error for TransferError {}
