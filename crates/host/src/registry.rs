//! Open agent sockets, keyed by the integer handle given to the host.

use std::os::fd::{AsRawFd, RawFd};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use sshbridge_agent_socket::AgentSocket;

/// Handles the host may still use.
///
/// Lookups hand out an `Arc` so a blocking read does not hold the lock. A
/// socket removed while a call is in flight is closed when that call returns.
#[derive(Default)]
pub struct SocketRegistry {
    sockets: Mutex<FxHashMap<RawFd, Arc<AgentSocket>>>,
}

impl SocketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `socket`; its descriptor number becomes the handle.
    pub fn insert(&self, socket: AgentSocket) -> RawFd {
        let handle = socket.as_raw_fd();
        let previous = self.sockets.lock().insert(handle, Arc::new(socket));
        if let Some(stale) = previous {
            // The kernel reused a number we still tracked, so the old entry
            // was closed behind our back. Dropping it would close `handle`,
            // which now belongs to the new socket.
            tracing::warn!("agent socket handle {} was still registered", handle);
            std::mem::forget(stale);
        }
        handle
    }

    pub fn get(&self, handle: RawFd) -> Option<Arc<AgentSocket>> {
        self.sockets.lock().get(&handle).cloned()
    }

    pub fn remove(&self, handle: RawFd) -> Option<Arc<AgentSocket>> {
        self.sockets.lock().remove(&handle)
    }

    pub fn len(&self) -> usize {
        self.sockets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
