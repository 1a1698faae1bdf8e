use std::io::Write;
use std::sync::Arc;
use std::thread;

use bzip2::write::BzEncoder;
use bzip2::Compression;
use proptest::prelude::*;

use bzip2_decompressor::{SessionHandle, SessionOptions, SessionRegistry, SessionState};

fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::new(1));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn decode_all(registry: &SessionRegistry, handle: SessionHandle) -> Vec<u8> {
    let mut result = Vec::new();
    let mut out = [0_u8; 777];
    loop {
        let n = registry.decompress_bytes_direct(handle, &mut out).unwrap();
        if n == 0 {
            return result;
        }
        result.extend_from_slice(&out[..n]);
    }
}

proptest! {
    #[test]
    fn unknown_handles_are_rejected(raw in any::<i32>()) {
        let registry = SessionRegistry::new();
        let handle = SessionHandle::from_raw(raw);
        let mut out = [0_u8; 8];
        prop_assert_eq!(registry.state(handle), SessionState::Uninitialized);
        prop_assert!(registry.decompress_bytes_direct(handle, &mut out).unwrap_err().is_invalid_state());
        prop_assert!(registry.consumed_input(handle).unwrap_err().is_invalid_state());
        prop_assert!(registry.consumed_output(handle).unwrap_err().is_invalid_state());
        prop_assert!(registry.supply_input(handle, b"BZh1").unwrap_err().is_invalid_state());
        prop_assert!(registry.finish(handle).unwrap_err().is_invalid_state());
    }

    #[test]
    fn any_handle_runs_the_full_lifecycle(raw in any::<i32>()) {
        let registry = SessionRegistry::new();
        let handle = SessionHandle::from_raw(raw);
        registry.init_handle(handle, 0, SessionOptions::default()).unwrap();
        prop_assert_eq!(registry.state(handle), SessionState::Initialized);
        prop_assert!(registry
            .init_handle(handle, 0, SessionOptions::default())
            .unwrap_err()
            .is_invalid_state());
        prop_assert_eq!(registry.consumed_input(handle), Ok(0));
        prop_assert_eq!(registry.consumed_output(handle), Ok(0));
        registry.finish(handle).unwrap();
        prop_assert_eq!(registry.state(handle), SessionState::Finished);
        prop_assert!(registry.finish(handle).unwrap_err().is_invalid_state());
        prop_assert!(registry.consumed_output(handle).unwrap_err().is_invalid_state());
    }
}

#[test]
fn finish_all_with_no_sessions() {
    let registry = SessionRegistry::new();
    assert_eq!(registry.finish_all(), 0);
    assert_eq!(registry.finish_all(), 0);
}

#[test]
fn finish_all_releases_everything() {
    let registry = SessionRegistry::new();
    let handles: Vec<_> = (0..10).map(|i| registry.init(i * 1000).unwrap()).collect();
    registry.finish(handles[3]).unwrap();
    assert_eq!(registry.finish_all(), 9);
    for handle in &handles {
        assert_eq!(registry.state(*handle), SessionState::Finished);
        assert!(registry.finish(*handle).unwrap_err().is_invalid_state());
    }
    // The registry keeps working after a finish_all.
    let handle = registry.init(0).unwrap();
    assert!(!handles.contains(&handle));
    assert_eq!(registry.state(handle), SessionState::Initialized);
}

#[test]
fn sessions_are_independent() {
    let registry = SessionRegistry::new();
    let a = registry.init(0).unwrap();
    let b = registry.init(0).unwrap();
    registry.supply_input(a, &compress(b"first session")).unwrap();
    registry.supply_input(b, &compress(b"second")).unwrap();
    assert_eq!(decode_all(&registry, b), b"second");
    registry.finish(b).unwrap();
    assert_eq!(decode_all(&registry, a), b"first session");
    assert_eq!(registry.consumed_output(a), Ok(13));
}

#[test]
fn corrupt_session_stays_corrupt_until_finished() {
    let registry = SessionRegistry::new();
    let handle = registry.init(0).unwrap();
    registry.supply_input(handle, b"BZh0 is not a level").unwrap();
    let mut out = [0_u8; 8];
    for _ in 0..3 {
        assert!(registry
            .decompress_bytes_direct(handle, &mut out)
            .unwrap_err()
            .is_corrupt());
    }
    registry.finish(handle).unwrap();
}

#[test]
fn zero_capacity_output() {
    let registry = SessionRegistry::new();
    let handle = registry.init(0).unwrap();
    registry.supply_input(handle, &compress(b"abc")).unwrap();
    let mut out: [u8; 0] = [];
    assert_eq!(registry.decompress_bytes_direct(handle, &mut out), Ok(0));
    assert_eq!(registry.consumed_output(handle), Ok(0));
    assert_eq!(decode_all(&registry, handle), b"abc");
}

#[test]
fn sessions_on_many_threads() {
    let registry = Arc::new(SessionRegistry::new());
    let workers: Vec<_> = (0..8_u8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let data: Vec<u8> = (0..20_000_u32).map(|n| (n % 251) as u8 ^ i).collect();
                let handle = registry.init(100_000).unwrap();
                for piece in compress(&data).chunks(1000) {
                    registry.supply_input(handle, piece).unwrap();
                }
                assert_eq!(decode_all(&registry, handle), data);
                registry.finish(handle).unwrap();
                handle
            })
        })
        .collect();
    let mut handles: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    handles.sort();
    handles.dedup();
    assert_eq!(handles.len(), 8);
    assert_eq!(registry.live_sessions(), 0);
}
