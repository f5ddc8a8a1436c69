//! Tests for Connection
//!
//! These tests verify:
//! - The AUTH / SELECT handshake and its failure paths
//! - Error replies leave the connection usable
//! - Transport and framing failures close the connection
//! - The transport is released exactly once on every path

#[path = "../common/mod.rs"]
mod common;

use std::io::ErrorKind;

use common::MockStream;
use resplite::protocol::encode_command;
use resplite::{Command, Config, Connection, ConnectionState, Reply, RespError};

// =============================================================================
// Helper Functions
// =============================================================================

fn no_auth() -> Config {
    Config::default()
}

fn with_password(password: &str) -> Config {
    Config::builder().password(password).build()
}

fn ping() -> Command {
    Command::new("PING")
}

// =============================================================================
// Handshake Tests
// =============================================================================

#[test]
fn test_no_password_skips_handshake() {
    let stream = MockStream::new(Vec::new());
    let written = stream.written();

    let conn = Connection::from_transport(stream, &no_auth()).unwrap();

    assert_eq!(conn.state(), ConnectionState::Ready);
    assert!(written.lock().is_empty());
}

#[test]
fn test_empty_password_skips_handshake() {
    let stream = MockStream::new(Vec::new());
    let written = stream.written();

    let conn = Connection::from_transport(stream, &with_password("")).unwrap();

    assert!(conn.is_ready());
    assert!(written.lock().is_empty());
}

#[test]
fn test_auth_success() {
    let stream = MockStream::new(b"+OK\r\n+PONG\r\n".to_vec());
    let written = stream.written();

    let mut conn = Connection::from_transport(stream, &with_password("secret")).unwrap();
    assert!(conn.is_ready());
    assert_eq!(*written.lock(), encode_command("AUTH", &["secret"]));

    let reply = conn.execute(&ping()).unwrap();
    assert_eq!(reply, Reply::Status("PONG".to_string()));
}

#[test]
fn test_auth_rejected_releases_transport() {
    let stream = MockStream::new(b"-WRONGPASS invalid password\r\n".to_vec());
    let tracker = stream.tracker();

    let result = Connection::from_transport(stream, &with_password("wrong"));

    match result {
        Err(RespError::Authentication(msg)) => assert!(msg.contains("WRONGPASS")),
        other => panic!("Expected authentication error, got {:?}", other),
    }
    assert_eq!(tracker.shutdowns(), 1);
    assert_eq!(tracker.drops(), 1);
}

#[test]
fn test_auth_non_ok_status_is_rejected() {
    let stream = MockStream::new(b"+QUEUED\r\n".to_vec());
    let tracker = stream.tracker();

    let result = Connection::from_transport(stream, &with_password("secret"));

    assert!(matches!(result, Err(RespError::Authentication(_))));
    assert_eq!(tracker.drops(), 1);
}

#[test]
fn test_auth_non_status_reply_is_rejected() {
    let stream = MockStream::new(b"$2\r\nOK\r\n".to_vec());
    let tracker = stream.tracker();

    let result = Connection::from_transport(stream, &with_password("secret"));

    assert!(matches!(result, Err(RespError::Authentication(_))));
    assert_eq!(tracker.drops(), 1);
}

#[test]
fn test_server_gone_during_auth() {
    let stream = MockStream::new(Vec::new());
    let tracker = stream.tracker();

    let result = Connection::from_transport(stream, &with_password("secret"));

    assert!(matches!(result, Err(RespError::Connection(_))));
    assert_eq!(tracker.shutdowns(), 1);
    assert_eq!(tracker.drops(), 1);
}

#[test]
fn test_select_database_after_auth() {
    let stream = MockStream::new(b"+OK\r\n+OK\r\n".to_vec());
    let written = stream.written();
    let config = Config::builder().password("secret").database(3).build();

    let conn = Connection::from_transport(stream, &config).unwrap();

    assert!(conn.is_ready());
    let mut expected = encode_command("AUTH", &["secret"]);
    expected.extend(encode_command("SELECT", &["3"]));
    assert_eq!(*written.lock(), expected);
}

#[test]
fn test_select_without_password() {
    let stream = MockStream::new(b"+OK\r\n".to_vec());
    let written = stream.written();
    let config = Config::builder().database(1).build();

    Connection::from_transport(stream, &config).unwrap();

    assert_eq!(*written.lock(), encode_command("SELECT", &["1"]));
}

#[test]
fn test_select_failure_releases_transport() {
    let stream = MockStream::new(b"-ERR DB index is out of range\r\n".to_vec());
    let tracker = stream.tracker();
    let config = Config::builder().database(99).build();

    let result = Connection::from_transport(stream, &config);

    match result {
        Err(RespError::Server(msg)) => assert!(msg.contains("out of range")),
        other => panic!("Expected server error, got {:?}", other),
    }
    assert_eq!(tracker.drops(), 1);
}

// =============================================================================
// Call Tests
// =============================================================================

#[test]
fn test_call_writes_command_and_reads_reply() {
    let stream = MockStream::new(b"$5\r\nvalue\r\n".to_vec());
    let written = stream.written();
    let mut conn = Connection::from_transport(stream, &no_auth()).unwrap();

    let reply = conn.call("get", &["key"]).unwrap();

    assert_eq!(reply, Reply::bulk("value"));
    assert_eq!(*written.lock(), b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n".to_vec());
}

#[test]
fn test_error_reply_keeps_connection_usable() {
    let stream = MockStream::new(b"-ERR bad thing\r\n:5\r\n".to_vec());
    let mut conn = Connection::from_transport(stream, &no_auth()).unwrap();

    let reply = conn.call("bogus", &["x"]).unwrap();
    assert_eq!(reply, Reply::Error("ERR bad thing".to_string()));
    assert!(conn.is_ready());

    let reply = conn.call("incr", &["n"]).unwrap();
    assert_eq!(reply, Reply::Integer(5));
}

#[test]
fn test_nested_reply_through_connection() {
    let stream = MockStream::new(b"*2\r\n*1\r\n$1\r\na\r\n:5\r\n".to_vec());
    let mut conn = Connection::from_transport(stream, &no_auth()).unwrap();

    let reply = conn.execute(&Command::new("custom")).unwrap();

    assert_eq!(
        reply,
        Reply::array(vec![Reply::array(vec![Reply::bulk("a")]), Reply::Integer(5)])
    );
}

#[test]
fn test_malformed_marker_closes_connection() {
    let stream = MockStream::new(b"?garbage\r\n+OK\r\n".to_vec());
    let tracker = stream.tracker();
    let mut conn = Connection::from_transport(stream, &no_auth()).unwrap();

    let result = conn.execute(&ping());

    assert!(matches!(result, Err(RespError::Protocol(_))));
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert_eq!(tracker.shutdowns(), 1);
    assert_eq!(tracker.drops(), 1);

    assert!(matches!(conn.execute(&ping()), Err(RespError::Closed)));
}

#[test]
fn test_eof_mid_reply_closes_connection() {
    let stream = MockStream::new(b"$10\r\nhalf".to_vec());
    let mut conn = Connection::from_transport(stream, &no_auth()).unwrap();

    let result = conn.call("get", &["k"]);

    match result {
        Err(RespError::Connection(msg)) => assert!(msg.contains("closed")),
        other => panic!("Expected connection error, got {:?}", other),
    }
    assert!(!conn.is_ready());
}

#[test]
fn test_read_timeout_closes_connection() {
    let stream = MockStream::new(b"$10\r\npart".to_vec()).with_read_error(ErrorKind::WouldBlock);
    let tracker = stream.tracker();
    let mut conn = Connection::from_transport(stream, &no_auth()).unwrap();

    let result = conn.call("get", &["k"]);

    match result {
        Err(RespError::Connection(msg)) => assert!(msg.contains("timed out")),
        other => panic!("Expected connection error, got {:?}", other),
    }
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert_eq!(tracker.drops(), 1);
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_close_is_idempotent() {
    let stream = MockStream::new(Vec::new());
    let tracker = stream.tracker();
    let mut conn = Connection::from_transport(stream, &no_auth()).unwrap();

    conn.close();
    conn.close();
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert_eq!(tracker.shutdowns(), 1);
    assert_eq!(tracker.drops(), 1);

    drop(conn);
    assert_eq!(tracker.shutdowns(), 1);
    assert_eq!(tracker.drops(), 1);
}

#[test]
fn test_drop_without_close_releases_once() {
    let stream = MockStream::new(Vec::new());
    let tracker = stream.tracker();
    let conn = Connection::from_transport(stream, &no_auth()).unwrap();

    drop(conn);

    assert_eq!(tracker.shutdowns(), 1);
    assert_eq!(tracker.drops(), 1);
}

#[test]
fn test_call_after_close_fails() {
    let stream = MockStream::new(b"+PONG\r\n".to_vec());
    let written = stream.written();
    let mut conn = Connection::from_transport(stream, &no_auth()).unwrap();

    conn.close();
    let result = conn.execute(&ping());

    assert!(matches!(result, Err(RespError::Closed)));
    assert!(written.lock().is_empty());
}

#[test]
fn test_fatal_error_classification() {
    assert!(RespError::Closed.is_fatal());
    assert!(RespError::Protocol("x".to_string()).is_fatal());
    assert!(RespError::Connection("x".to_string()).is_fatal());
    assert!(RespError::Authentication("x".to_string()).is_fatal());
    assert!(!RespError::Server("x".to_string()).is_fatal());
    assert!(!RespError::Config("x".to_string()).is_fatal());
}
