#![cfg(all(unix, feature = "cli"))]

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

fn emulator_socket() -> UdpSocket {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).expect("emulator should bind");
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("timeout should apply");
    socket
}

fn spawn_echo_emulator() -> SocketAddr {
    let socket = emulator_socket();
    let addr = socket.local_addr().unwrap();
    thread::spawn(move || {
        let mut buf = [0u8; 256];
        while let Ok((n, from)) = socket.recv_from(&mut buf) {
            let _ = socket.send_to(&buf[..n], from);
        }
    });
    addr
}

fn run_send(addr: SocketAddr, extra: &[&str]) -> Output {
    let addr = addr.to_string();
    Command::new(env!("CARGO_BIN_EXE_kkbridge"))
        .args(["--log-level", "error", "--format", "json", "send"])
        .args(["--device-addr", &addr, "--debug-addr", &addr])
        .args(extra)
        .output()
        .expect("send should run")
}

#[test]
fn send_prints_echoed_response_as_json() {
    let emulator = spawn_echo_emulator();

    let output = run_send(emulator, &["--type", "17", "--hex", "c0ffee"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("send should emit json");
    assert_eq!(payload["channel"], "device");
    assert_eq!(payload["msg_type"], 17);
    assert_eq!(payload["type_name"], "Features");
    assert_eq!(payload["payload"], "c0ffee");
}

#[test]
fn send_no_response_type_reports_acknowledged() {
    let emulator = emulator_socket();
    let addr = emulator.local_addr().unwrap();

    let output = run_send(addr, &["--channel", "debug", "--type", "103"]);

    assert!(output.status.success());
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["acknowledged"], true);
}

#[test]
fn send_unknown_channel_exits_with_usage() {
    let emulator = emulator_socket();
    let addr = emulator.local_addr().unwrap();

    let output = run_send(addr, &["--channel", "other", "--type", "1"]);

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn send_to_silent_emulator_exits_with_timeout() {
    let emulator = emulator_socket();
    let addr = emulator.local_addr().unwrap();

    let output = run_send(addr, &["--type", "1", "--read-timeout", "200ms"]);

    assert_eq!(output.status.code(), Some(124));
    drop(emulator);
}

#[test]
fn version_prints_name() {
    let output = Command::new(env!("CARGO_BIN_EXE_kkbridge"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with(&format!("kkbridge {}", env!("CARGO_PKG_VERSION"))));
}
