use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{error, info, trace, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::compression::stream::StreamDecoder;
use crate::error::{BzError, Result};
use crate::session::buffer::OutputBuffer;
use crate::session::{SessionHandle, SessionState};
use crate::tools::options::SessionOptions;

/// State of one decompression session.
#[derive(Debug)]
pub struct Session {
    block_size_hint: usize,
    decoder: StreamDecoder,
}

impl Session {
    fn new(block_size_hint: usize, options: SessionOptions) -> Self {
        Self {
            block_size_hint,
            decoder: StreamDecoder::new(options, block_size_hint),
        }
    }
}

/// Auto-assigned handles count up from 1 and are never reused, so every handle in
/// `1..=last_auto` has been used. Caller chosen handles outside that range are remembered in
/// `reserved` until the auto range grows past them.
#[derive(Debug, Default)]
struct SessionTable {
    live: FxHashMap<SessionHandle, Arc<Mutex<Session>>>,
    reserved: FxHashSet<SessionHandle>,
    last_auto: i32,
}

impl SessionTable {
    /// Whether `handle` has ever been initialized.
    fn was_used(&self, handle: SessionHandle) -> bool {
        (1..=self.last_auto).contains(&handle.as_raw()) || self.reserved.contains(&handle)
    }

    /// Claim the next free handle above the auto range.
    fn next_free(&mut self) -> Result<SessionHandle> {
        loop {
            self.last_auto = match self.last_auto.checked_add(1) {
                Some(next) => next,
                None => {
                    error!("All {} session handles have been used.", i32::MAX);
                    return Err(BzError::invalid_state("No session handles left"));
                }
            };
            let candidate = SessionHandle::from_raw(self.last_auto);
            // Now inside the auto range, so it needs no entry of its own
            if !self.reserved.remove(&candidate) {
                return Ok(candidate);
            }
        }
    }
}

/// Maps session handles to sessions. One mutex guards the mapping; it is held only to insert,
/// look up or remove an entry, never while a session decodes. Each session has its own lock,
/// which is uncontended as long as callers use a handle from one thread at a time.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    table: Mutex<SessionTable>,
}

/// Lock a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, handle: SessionHandle, session: Session) -> Result<()> {
        let mut table = lock(&self.table);
        if table.live.contains_key(&handle) {
            return Err(BzError::invalid_state(format!("{} is already initialized", handle)));
        }
        if table.was_used(handle) {
            return Err(BzError::invalid_state(format!("{} has been finished", handle)));
        }
        table.reserved.insert(handle);
        table.live.insert(handle, Arc::new(Mutex::new(session)));
        Ok(())
    }

    fn lookup(&self, handle: SessionHandle) -> Result<Arc<Mutex<Session>>> {
        let table = lock(&self.table);
        match table.live.get(&handle) {
            Some(session) => Ok(Arc::clone(session)),
            None if table.was_used(handle) => Err(BzError::invalid_state(format!(
                "{} has been finished",
                handle
            ))),
            None => Err(BzError::invalid_state(format!(
                "{} is not initialized",
                handle
            ))),
        }
    }

    fn remove(&self, handle: SessionHandle) -> Result<()> {
        let mut table = lock(&self.table);
        match table.live.remove(&handle) {
            Some(_) => Ok(()),
            None if table.was_used(handle) => Err(BzError::invalid_state(format!(
                "{} is already finished",
                handle
            ))),
            None => Err(BzError::invalid_state(format!(
                "{} is not initialized",
                handle
            ))),
        }
    }

    /// Run `f` on the session behind `handle` without holding the registry lock.
    fn with_session<T>(
        &self,
        handle: SessionHandle,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<T> {
        let session = self.lookup(handle)?;
        let mut guard = lock(session.as_ref());
        Ok(f(&mut *guard))
    }

    /// Create a session under a fresh handle, with default options.
    pub fn init(&self, block_size_hint: usize) -> Result<SessionHandle> {
        self.init_with_options(block_size_hint, SessionOptions::default())
    }

    /// Create a session under a fresh handle. Fails once every positive `i32` has been handed
    /// out, since handles are never reused.
    pub fn init_with_options(
        &self,
        block_size_hint: usize,
        options: SessionOptions,
    ) -> Result<SessionHandle> {
        let mut table = lock(&self.table);
        let handle = table.next_free()?;
        table
            .live
            .insert(handle, Arc::new(Mutex::new(Session::new(block_size_hint, options))));
        info!("Initialized {} (block size hint {}).", handle, block_size_hint);
        Ok(handle)
    }

    /// Create a session under a caller chosen handle. Fails if the handle was ever used.
    pub fn init_handle(
        &self,
        handle: SessionHandle,
        block_size_hint: usize,
        options: SessionOptions,
    ) -> Result<()> {
        self.insert(handle, Session::new(block_size_hint, options))?;
        info!("Initialized {} (block size hint {}).", handle, block_size_hint);
        Ok(())
    }

    /// Append compressed bytes to a session's input.
    pub fn supply_input(&self, handle: SessionHandle, data: &[u8]) -> Result<()> {
        self.with_session(handle, |session| session.decoder.supply_input(data))
    }

    /// Decode buffered input into `output` until it is full or the input is exhausted.
    /// Returns the number of bytes written.
    pub fn decompress_bytes_direct(
        &self,
        handle: SessionHandle,
        output: &mut [u8],
    ) -> Result<usize> {
        self.with_session(handle, |session| -> Result<usize> {
            let mut out = OutputBuffer::new(output);
            let produced = session.decoder.decompress(&mut out)?;
            trace!("\r{} produced {} bytes.", handle, produced);
            Ok(produced)
        })?
    }

    pub fn consumed_input(&self, handle: SessionHandle) -> Result<u64> {
        self.with_session(handle, |session| session.decoder.consumed_input())
    }

    pub fn consumed_output(&self, handle: SessionHandle) -> Result<u64> {
        self.with_session(handle, |session| session.decoder.consumed_output())
    }

    /// Whether the session has decoded its whole input and delivered all output.
    pub fn is_stream_end(&self, handle: SessionHandle) -> Result<bool> {
        self.with_session(handle, |session| session.decoder.is_stream_end())
    }

    pub fn block_size_hint(&self, handle: SessionHandle) -> Result<usize> {
        self.with_session(handle, |session| session.block_size_hint)
    }

    /// Lifecycle state of any handle value.
    pub fn state(&self, handle: SessionHandle) -> SessionState {
        let table = lock(&self.table);
        if table.live.contains_key(&handle) {
            SessionState::Initialized
        } else if table.was_used(handle) {
            SessionState::Finished
        } else {
            SessionState::Uninitialized
        }
    }

    /// Release one session.
    pub fn finish(&self, handle: SessionHandle) -> Result<()> {
        self.remove(handle)?;
        info!("Finished {}.", handle);
        Ok(())
    }

    /// Release every live session. Never fails. Returns how many sessions were released.
    pub fn finish_all(&self) -> usize {
        let mut table = lock(&self.table);
        let count = table.live.drain().count();
        if count > 0 {
            warn!("Finished {} sessions that were still live.", count);
        }
        count
    }

    pub fn live_sessions(&self) -> usize {
        lock(&self.table).live.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static AAAA_BZ2: [u8; 39] = [
        0x42, 0x5a, 0x68, 0x31, 0x31, 0x41, 0x59, 0x26, 0x53, 0x59, 0x88, 0x12, 0x33, 0xa6, 0x00,
        0x00, 0x02, 0x41, 0x00, 0x40, 0x00, 0x20, 0x00, 0x20, 0x00, 0x21, 0x00, 0x82, 0x0b, 0x17,
        0x72, 0x45, 0x38, 0x50, 0x90, 0x88, 0x12, 0x33, 0xa6,
    ];

    #[test]
    fn lifecycle() {
        let registry = SessionRegistry::new();
        let handle = registry.init(100_000).unwrap();
        assert_eq!(registry.state(handle), SessionState::Initialized);
        assert_eq!(registry.block_size_hint(handle), Ok(100_000));

        registry.supply_input(handle, &AAAA_BZ2).unwrap();
        let mut out = [0_u8; 16];
        assert_eq!(registry.decompress_bytes_direct(handle, &mut out), Ok(4));
        assert_eq!(&out[..4], b"aaaa");
        assert_eq!(registry.consumed_output(handle), Ok(4));
        assert_eq!(registry.consumed_input(handle), Ok(39));
        assert_eq!(registry.is_stream_end(handle), Ok(true));

        registry.finish(handle).unwrap();
        assert_eq!(registry.state(handle), SessionState::Finished);
        assert!(registry.finish(handle).unwrap_err().is_invalid_state());
        assert!(registry
            .decompress_bytes_direct(handle, &mut out)
            .unwrap_err()
            .is_invalid_state());
    }

    #[test]
    fn fresh_handles_are_distinct() {
        let registry = SessionRegistry::new();
        let a = registry.init(0).unwrap();
        let b = registry.init(0).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.live_sessions(), 2);
    }

    #[test]
    fn explicit_handles() {
        let registry = SessionRegistry::new();
        let handle = SessionHandle::from_raw(42);
        assert_eq!(registry.state(handle), SessionState::Uninitialized);
        registry.init_handle(handle, 0, SessionOptions::default()).unwrap();
        assert!(registry
            .init_handle(handle, 0, SessionOptions::default())
            .unwrap_err()
            .is_invalid_state());
        registry.finish(handle).unwrap();
        // A finished handle can not be brought back.
        assert!(registry
            .init_handle(handle, 0, SessionOptions::default())
            .unwrap_err()
            .is_invalid_state());
    }

    #[test]
    fn auto_handles_skip_used_ones() {
        let registry = SessionRegistry::new();
        registry
            .init_handle(SessionHandle::from_raw(1), 0, SessionOptions::default())
            .unwrap();
        let handle = registry.init(0).unwrap();
        assert_ne!(handle, SessionHandle::from_raw(1));
    }

    #[test]
    fn auto_handles_skip_reserved_ones_ahead() {
        let registry = SessionRegistry::new();
        for raw in [2, 3, 5] {
            let handle = SessionHandle::from_raw(raw);
            registry.init_handle(handle, 0, SessionOptions::default()).unwrap();
        }
        registry.finish(SessionHandle::from_raw(3)).unwrap();
        let auto: Vec<i32> = (0..3)
            .map(|_| registry.init(0).unwrap().as_raw())
            .collect();
        assert_eq!(auto, [1, 4, 6]);
        // Reserved handles the auto range passed are no longer tracked one by one.
        assert!(lock(&registry.table).reserved.is_empty());
        assert_eq!(registry.state(SessionHandle::from_raw(3)), SessionState::Finished);
        assert_eq!(registry.state(SessionHandle::from_raw(5)), SessionState::Initialized);
        assert_eq!(registry.state(SessionHandle::from_raw(7)), SessionState::Uninitialized);
    }

    #[test]
    fn finished_auto_handles_leave_nothing_behind() {
        let registry = SessionRegistry::new();
        for _ in 0..1000 {
            let handle = registry.init(0).unwrap();
            registry.finish(handle).unwrap();
        }
        let table = lock(&registry.table);
        assert!(table.live.is_empty());
        assert!(table.reserved.is_empty());
        assert_eq!(table.last_auto, 1000);
    }

    #[test]
    fn handle_space_runs_out_without_spinning() {
        let registry = SessionRegistry::new();
        let top = SessionHandle::from_raw(i32::MAX);
        registry.init_handle(top, 0, SessionOptions::default()).unwrap();
        lock(&registry.table).last_auto = i32::MAX - 2;

        assert_eq!(registry.init(0), Ok(SessionHandle::from_raw(i32::MAX - 1)));
        // The last handle is taken, so the next request fails instead of wrapping around
        assert!(registry.init(0).unwrap_err().is_invalid_state());
        assert!(registry.init(0).unwrap_err().is_invalid_state());
        assert_eq!(registry.state(top), SessionState::Initialized);
        assert_eq!(registry.live_sessions(), 2);
    }

    #[test]
    fn finish_all() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.finish_all(), 0);
        let handles: Vec<_> = (0..5).map(|_| registry.init(0).unwrap()).collect();
        assert_eq!(registry.finish_all(), 5);
        assert_eq!(registry.live_sessions(), 0);
        for handle in handles {
            assert!(registry.consumed_input(handle).unwrap_err().is_invalid_state());
            assert_eq!(registry.state(handle), SessionState::Finished);
        }
    }

    #[test]
    fn unknown_handle() {
        let registry = SessionRegistry::new();
        let mut out = [0_u8; 4];
        for raw in [-1, 0, 1, 7, i32::MAX] {
            let handle = SessionHandle::from_raw(raw);
            assert!(registry
                .decompress_bytes_direct(handle, &mut out)
                .unwrap_err()
                .is_invalid_state());
            assert!(registry.supply_input(handle, b"BZh9").unwrap_err().is_invalid_state());
        }
    }
}
