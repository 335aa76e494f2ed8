use std::net::UdpSocket;
use std::time::Duration;

use super::*;
use crate::config::StatsdConfig;

fn listener_and_sink(prefix: &str) -> (UdpSocket, StatsdSink) {
    let listener = UdpSocket::bind("127.0.0.1:0").expect("bind listener");
    listener
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let sink = StatsdSink::new(&StatsdConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        prefix: prefix.to_string(),
    });
    assert!(sink.is_enabled());
    (listener, sink)
}

fn recv_line(listener: &UdpSocket) -> String {
    let mut buf = [0u8; 512];
    let (n, _) = listener.recv_from(&mut buf).expect("datagram");
    String::from_utf8_lossy(&buf[..n]).into_owned()
}

#[test]
fn test_counter_wire_format() {
    let (listener, sink) = listener_and_sink("distribution");
    sink.incr("client.connect");
    assert_eq!(recv_line(&listener), "distribution.client.connect:1|c");
}

#[test]
fn test_gauge_and_timing_wire_format() {
    let (listener, sink) = listener_and_sink("distribution");

    sink.gauge("clients.active", 7);
    assert_eq!(recv_line(&listener), "distribution.clients.active:7|g");

    sink.timing("database.query_time", 42, 1.0);
    assert_eq!(
        recv_line(&listener),
        "distribution.database.query_time:42|ms"
    );
}

#[test]
fn test_no_prefix_omits_leading_dot() {
    let (listener, sink) = listener_and_sink("");
    sink.incr("upload.request");
    assert_eq!(recv_line(&listener), "upload.request:1|c");
}

#[test]
fn test_sample_rate_appended_to_line() {
    let (listener, sink) = listener_and_sink("test");
    // Rate just under 1.0 may be gated; loop until one gets through.
    loop {
        sink.count("sampled", 1, 0.999);
        let mut buf = [0u8; 512];
        match listener.recv_from(&mut buf) {
            Ok((n, _)) => {
                let line = String::from_utf8_lossy(&buf[..n]).into_owned();
                assert_eq!(line, "test.sampled:1|c|@0.999");
                break;
            }
            Err(_) => continue,
        }
    }
}

#[test]
fn test_zero_sample_rate_emits_nothing() {
    let (listener, sink) = listener_and_sink("test");
    for _ in 0..10 {
        sink.count("never", 1, 0.0);
    }
    listener
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    let mut buf = [0u8; 512];
    assert!(listener.recv_from(&mut buf).is_err());
}

#[test]
fn test_scoped_timer_emits_on_drop() {
    let (listener, sink) = listener_and_sink("api");
    {
        let _timer = sink.timer("upload.latency");
        std::thread::sleep(Duration::from_millis(5));
    }
    let line = recv_line(&listener);
    assert!(line.starts_with("api.upload.latency:"));
    assert!(line.ends_with("|ms"));
}

#[test]
fn test_disabled_sink_is_silent() {
    let sink = StatsdSink::disabled();
    assert!(!sink.is_enabled());
    // Must not panic.
    sink.incr("anything");
    sink.gauge("anything", 1);
}
