//! Fire-and-forget statsd metrics over UDP.
//!
//! One datagram per call, `[<prefix>.]<metric>:<value>|<type>[|@<rate>]`.
//! No retry, no queueing. Uses a blocking socket so [`ScopedTimer`] can emit
//! from `Drop` without an executor.

mod scoped_timer;

pub use scoped_timer::ScopedTimer;

#[cfg(test)]
mod metrics_test;

//---
use std::net::SocketAddr;
use std::net::ToSocketAddrs;
use std::net::UdpSocket;
use std::sync::Arc;

use rand::Rng;
use tracing::debug;
use tracing::warn;

use crate::config::StatsdConfig;

struct SinkInner {
    socket: UdpSocket,
    target: SocketAddr,
    prefix: String,
}

/// Handle to the statsd collaborator. Cheap to clone and share.
///
/// Construction never fails: an unresolvable host or unbindable socket
/// produces a disabled sink so metrics can never take a service down.
#[derive(Clone)]
pub struct StatsdSink {
    inner: Option<Arc<SinkInner>>,
}

impl StatsdSink {
    pub fn new(config: &StatsdConfig) -> Self {
        let target = match (config.host.as_str(), config.port).to_socket_addrs() {
            Ok(mut addrs) => match addrs.next() {
                Some(addr) => addr,
                None => {
                    warn!(host = %config.host, "statsd host resolved to nothing, metrics disabled");
                    return Self::disabled();
                }
            },
            Err(e) => {
                warn!(host = %config.host, error = %e, "statsd host resolution failed, metrics disabled");
                return Self::disabled();
            }
        };

        let socket = match UdpSocket::bind("0.0.0.0:0") {
            Ok(socket) => socket,
            Err(e) => {
                warn!(error = %e, "statsd socket bind failed, metrics disabled");
                return Self::disabled();
            }
        };

        debug!(%target, prefix = %config.prefix, "statsd sink ready");
        Self {
            inner: Some(Arc::new(SinkInner {
                socket,
                target,
                prefix: config.prefix.clone(),
            })),
        }
    }

    /// A sink that drops every metric.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub fn incr(
        &self,
        metric: &str,
    ) {
        self.count(metric, 1, 1.0);
    }

    pub fn count(
        &self,
        metric: &str,
        value: i64,
        sample_rate: f64,
    ) {
        self.send(metric, value, "c", sample_rate);
    }

    pub fn gauge(
        &self,
        metric: &str,
        value: i64,
    ) {
        self.send(metric, value, "g", 1.0);
    }

    pub fn timing(
        &self,
        metric: &str,
        milliseconds: i64,
        sample_rate: f64,
    ) {
        self.send(metric, milliseconds, "ms", sample_rate);
    }

    pub fn histogram(
        &self,
        metric: &str,
        value: i64,
    ) {
        self.send(metric, value, "h", 1.0);
    }

    /// statsd "set" type: counts unique values per flush interval.
    pub fn unique(
        &self,
        metric: &str,
        value: i64,
    ) {
        self.send(metric, value, "s", 1.0);
    }

    /// Starts a timer that reports elapsed milliseconds when dropped.
    pub fn timer(
        &self,
        metric: &'static str,
    ) -> ScopedTimer {
        ScopedTimer::new(self.clone(), metric)
    }

    fn send(
        &self,
        metric: &str,
        value: i64,
        kind: &str,
        sample_rate: f64,
    ) {
        let Some(inner) = &self.inner else {
            return;
        };

        if !should_sample(sample_rate) {
            return;
        }

        let mut line = String::with_capacity(inner.prefix.len() + metric.len() + 16);
        if !inner.prefix.is_empty() {
            line.push_str(&inner.prefix);
            if !inner.prefix.ends_with('.') {
                line.push('.');
            }
        }
        line.push_str(metric);
        line.push(':');
        line.push_str(&value.to_string());
        line.push('|');
        line.push_str(kind);
        if sample_rate < 1.0 {
            line.push_str("|@");
            line.push_str(&sample_rate.to_string());
        }

        // Fire and forget: a dropped datagram is not worth logging.
        let _ = inner.socket.send_to(line.as_bytes(), inner.target);
    }
}

fn should_sample(sample_rate: f64) -> bool {
    if sample_rate >= 1.0 {
        return true;
    }
    if sample_rate <= 0.0 {
        return false;
    }
    rand::thread_rng().gen_bool(sample_rate)
}
