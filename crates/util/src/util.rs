//! Shared utilities for sshbridge.
//!
//! Currently holds the truncation-safe copy used to fill fixed-size C
//! buffers such as `sockaddr_un::sun_path`.

/// Result of a [`bounded_copy`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOutcome {
    /// Full length of the source, independent of how much was copied.
    pub source_len: usize,
    /// Destination capacity the copy was bounded by.
    pub capacity: usize,
}

impl CopyOutcome {
    /// True when the source did not fit (`source_len >= capacity`).
    pub fn truncated(self) -> bool {
        self.source_len >= self.capacity
    }

    /// Number of source bytes that landed in the destination.
    pub fn copied(self) -> usize {
        self.source_len.min(self.capacity.saturating_sub(1))
    }
}

/// Copy `src` into `dst`, writing at most `dst.len() - 1` bytes followed by a
/// zero terminator.
///
/// Returns `src.len()` whether or not the copy was truncated, so callers
/// detect truncation with `ret >= dst.len()`. An empty `dst` is left
/// untouched. Bytes in `dst` past the terminator are not modified.
pub fn bounded_copy(dst: &mut [u8], src: &[u8]) -> usize {
    if let Some(room) = dst.len().checked_sub(1) {
        let n = src.len().min(room);
        dst[..n].copy_from_slice(&src[..n]);
        dst[n] = 0;
    }
    src.len()
}

/// [`bounded_copy`] returning a [`CopyOutcome`].
pub fn bounded_copy_outcome(dst: &mut [u8], src: &[u8]) -> CopyOutcome {
    let capacity = dst.len();
    CopyOutcome {
        source_len: bounded_copy(dst, src),
        capacity,
    }
}
