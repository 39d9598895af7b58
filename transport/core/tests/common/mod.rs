//! Shared listener harness for transport integration tests

#![allow(dead_code)]

use std::io::Read;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a test waits for bytes before failing
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A stand-in collector bound to a socket path
pub struct TestListener {
    path: PathBuf,
    listener: UnixListener,
    peer: Option<UnixStream>,
}

impl TestListener {
    /// Bind a listener at `path`
    pub fn bind(path: &Path) -> Self {
        let listener = UnixListener::bind(path).expect("bind test listener");
        Self {
            path: path.to_path_buf(),
            listener,
            peer: None,
        }
    }

    /// Read exactly `n` bytes, accepting the connection on first use
    pub fn read(&mut self, n: usize) -> Vec<u8> {
        let peer = self.peer.get_or_insert_with(|| {
            let (stream, _) = self.listener.accept().expect("accept transport");
            stream
                .set_read_timeout(Some(READ_TIMEOUT))
                .expect("set read timeout");
            stream
        });

        let mut buf = vec![0u8; n];
        peer.read_exact(&mut buf).expect("read payload");
        buf
    }

    /// Tear down the peer socket and listener and remove the socket file
    pub fn kill(self) {
        drop(self.peer);
        drop(self.listener);
        std::fs::remove_file(&self.path).expect("remove socket file");
    }
}

/// Install a test subscriber so transport logs show up with `--nocapture`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
