use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::SessionError;
use crate::settings::Settings;

fn create_tcp_connection(addr: &str) -> anyhow::Result<TcpStream> {
    let mut addrs = addr
        .to_socket_addrs()
        .map_err(|_| -> anyhow::Error { SessionError::NoAddress(addr.to_string()).into() })?;
    let sock = addrs
        .next()
        .ok_or_else(|| -> anyhow::Error { SessionError::NoAddress(addr.to_string()).into() })?;
    let tcp = TcpStream::connect_timeout(&sock, Duration::from_secs(10))
        .map_err(|e| -> anyhow::Error { SessionError::ConnectFailed(addr.to_string(), e.to_string()).into() })?;
    let _ = tcp.set_read_timeout(Some(Duration::from_secs(30)));
    let _ = tcp.set_write_timeout(Some(Duration::from_secs(30)));
    Ok(tcp)
}

/// Establish an authenticated session against the storage host using the
/// operator's private key. An empty passphrase means the key is unencrypted.
pub fn connect_session(settings: &Settings, passphrase: &str) -> anyhow::Result<ssh2::Session> {
    let addr = settings.addr();
    let tcp = create_tcp_connection(&addr)?;
    let mut sess = ssh2::Session::new()
        .map_err(|_| -> anyhow::Error { SessionError::SessionCreateFailed(addr.clone()).into() })?;
    sess.set_tcp_stream(tcp);
    sess.handshake()
        .map_err(|e| -> anyhow::Error { SessionError::HandshakeFailed(addr.clone(), e.to_string()).into() })?;

    let passphrase = if passphrase.is_empty() { None } else { Some(passphrase) };
    sess.userauth_pubkey_file(&settings.storage_username, None, &settings.key_file, passphrase)
        .map_err(|e| -> anyhow::Error { SessionError::AuthFailed(addr.clone(), e.to_string()).into() })?;
    if !sess.authenticated() {
        return Err(SessionError::AuthFailed(addr, "server rejected the key".to_string()).into());
    }
    tracing::debug!("authenticated as {} on {}", settings.storage_username, addr);
    Ok(sess)
}
