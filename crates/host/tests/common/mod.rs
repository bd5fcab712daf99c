//! Shared fixtures for host integration tests.

#![allow(dead_code)]

use std::ffi::CString;
use std::io::{Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

pub use tempfile::{tempdir, TempDir};

// ============================================================================
// Test Environment Setup
// ============================================================================

/// Temporary directory holding the config dir and agent sockets.
///
/// The first `TestEnv` in a test binary pins the global config dir, so the
/// bridge never reads the developer's own config file.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let config_dir = temp_dir.path().join("sshbridge");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");
        sshbridge_paths::set_config_dir(config_dir.clone());

        Self {
            temp_dir,
            config_dir,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn socket_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Agent Fixtures
// ============================================================================

/// A listener that serves exactly one connection on a background thread.
pub struct FakeAgent {
    pub path: PathBuf,
    thread: Option<JoinHandle<()>>,
}

impl FakeAgent {
    /// Echo every byte back until the client closes.
    pub fn echo(path: PathBuf) -> Self {
        Self::serve(path, |mut stream| {
            let mut buf = [0u8; 1024];
            loop {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if stream.write_all(&buf[..n]).is_err() {
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Send `reply` as soon as the client connects, then wait for close.
    pub fn reply(path: PathBuf, reply: &'static [u8]) -> Self {
        Self::serve(path, move |mut stream| {
            let _ = stream.write_all(reply);
            let mut sink = Vec::new();
            let _ = stream.read_to_end(&mut sink);
        })
    }

    fn serve<F>(path: PathBuf, handler: F) -> Self
    where
        F: FnOnce(std::os::unix::net::UnixStream) + Send + 'static,
    {
        let listener = UnixListener::bind(&path).expect("Failed to bind agent socket");
        let thread = std::thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                handler(stream);
            }
        });
        Self {
            path,
            thread: Some(thread),
        }
    }

    pub fn c_path(&self) -> CString {
        c_path(&self.path)
    }

    /// Wait for the serving thread; call after the client closed its end.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            thread.join().expect("agent thread panicked");
        }
    }
}

pub fn c_path(path: &Path) -> CString {
    CString::new(path.as_os_str().as_bytes()).expect("path contains NUL")
}
