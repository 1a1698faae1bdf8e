//! The session module is the native-call boundary of the decompressor.
//!
//! A caller creates a session, hands it compressed bytes, and pulls decompressed bytes out in
//! pieces no larger than the buffer it provides. Each session is identified by an opaque
//! integer handle and moves through three states:
//! - Uninitialized: the handle has never been used.
//! - Initialized: created by init, usable by every other call.
//! - Finished: released by finish or finish_all. A finished handle can not be reused.
//!
//! The pieces are:
//! - buffer: a capacity checked view over the caller's output slice.
//! - registry: the handle table and the per-session operations.
//! - native: the process-wide registry and the free functions named after the native hooks.
//!
use std::{fmt::Display, fmt::Formatter};

pub mod buffer;
pub mod native;
pub mod registry;

pub use registry::SessionRegistry;

/// Opaque identifier of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHandle(i32);

impl SessionHandle {
    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> i32 {
        self.0
    }
}

impl Display for SessionHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "session {}", self.0)
    }
}

/// Lifecycle of a session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Finished,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
