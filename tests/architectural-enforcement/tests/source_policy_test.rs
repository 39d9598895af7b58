//! Source policies for the transport crates

use architectural_enforcement::{scan, transport_root};

#[test]
fn test_no_panicking_unwraps_in_library_code() {
    let violations = scan(&transport_root(), &[".unwrap()", ".expect("]);
    assert!(
        violations.is_empty(),
        "unwrap/expect in production code: {violations:#?}"
    );
}

#[test]
fn test_no_sleep_in_library_code() {
    let violations = scan(&transport_root(), &["thread::sleep", "time::sleep"]);
    assert!(
        violations.is_empty(),
        "sleep in production code: {violations:#?}"
    );
}

#[test]
fn test_scan_covers_transport_sources() {
    let root = transport_root();
    assert!(root.join("core/src/unix_socket.rs").exists());
    assert!(root.join("collector/src/server.rs").exists());
}
