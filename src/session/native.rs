//! Free functions mirroring the native decompressor hooks, backed by one process-wide
//! registry.
use std::sync::OnceLock;

use log::info;

use crate::error::Result;
use crate::session::{SessionHandle, SessionRegistry, SessionState};
use crate::tools::options::SessionOptions;

static REGISTRY: OnceLock<SessionRegistry> = OnceLock::new();

fn registry() -> &'static SessionRegistry {
    REGISTRY.get_or_init(|| {
        info!("Created the session registry.");
        SessionRegistry::new()
    })
}

/// One-time global setup. Safe to call any number of times.
pub fn init_ids() {
    registry();
}

/// Start a session over a raw bzip2 stream.
pub fn init(block_size_hint: usize) -> Result<SessionHandle> {
    registry().init(block_size_hint)
}

pub fn init_with_options(
    block_size_hint: usize,
    options: SessionOptions,
) -> Result<SessionHandle> {
    registry().init_with_options(block_size_hint, options)
}

/// Start a session under a handle the caller picked.
pub fn init_handle(
    handle: SessionHandle,
    block_size_hint: usize,
    options: SessionOptions,
) -> Result<()> {
    registry().init_handle(handle, block_size_hint, options)
}

pub fn supply_input(handle: SessionHandle, data: &[u8]) -> Result<()> {
    registry().supply_input(handle, data)
}

/// Decompress into `output`. Returns the number of bytes written this call.
pub fn decompress_bytes_direct(handle: SessionHandle, output: &mut [u8]) -> Result<usize> {
    registry().decompress_bytes_direct(handle, output)
}

pub fn get_amount_of_consumed_input(handle: SessionHandle) -> Result<u64> {
    registry().consumed_input(handle)
}

pub fn get_amount_of_consumed_output(handle: SessionHandle) -> Result<u64> {
    registry().consumed_output(handle)
}

pub fn is_stream_end(handle: SessionHandle) -> Result<bool> {
    registry().is_stream_end(handle)
}

pub fn state(handle: SessionHandle) -> SessionState {
    registry().state(handle)
}

pub fn finish(handle: SessionHandle) -> Result<()> {
    registry().finish(handle)
}

/// Finish every live session. Never fails.
pub fn finish_all() {
    let count = registry().finish_all();
    info!("finish_all released {} sessions.", count);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn init_ids_is_idempotent() {
        init_ids();
        init_ids();
        let handle = init(0).unwrap();
        assert_eq!(state(handle), SessionState::Initialized);
        finish(handle).unwrap();
        assert_eq!(state(handle), SessionState::Finished);
    }
}
