use std::io::Write;

use super::*;

#[test]
fn test_defaults_pass_validation() {
    let cfg = KonfigConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.postgres.port, 5432);
    assert_eq!(cfg.redis.cache_ttl, 300);
    assert_eq!(cfg.kafka.topic, "config.updates");
    assert_eq!(cfg.monitoring.heartbeat_interval, 30);
    assert_eq!(cfg.monitoring.heartbeat_timeout, 90);
    assert_eq!(cfg.validation.max_config_size, 1024 * 1024);
}

#[test]
fn test_load_layers_yaml_file_over_defaults() {
    let mut file = tempfile::Builder::new()
        .suffix(".yml")
        .tempfile()
        .expect("create temp config");
    writeln!(
        file,
        "server:\n  port: 8082\nstatsd:\n  prefix: distribution\nkafka:\n  brokers:\n    - broker-1:9092\n    - broker-2:9092"
    )
    .expect("write temp config");

    let cfg = KonfigConfig::load(Some(file.path().to_str().unwrap())).expect("load config");

    assert_eq!(cfg.server.port, 8082);
    assert_eq!(cfg.statsd.prefix, "distribution");
    assert_eq!(cfg.kafka.broker_list(), "broker-1:9092,broker-2:9092");
    // Untouched sections keep their defaults.
    assert_eq!(cfg.postgres.database, "configservice");
}

#[test]
fn test_heartbeat_timeout_must_exceed_interval() {
    let mut cfg = KonfigConfig::default();
    cfg.monitoring.heartbeat_interval = 90;
    cfg.monitoring.heartbeat_timeout = 30;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zero_port_rejected() {
    let mut cfg = KonfigConfig::default();
    cfg.server.port = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_redis_url_includes_db() {
    let mut cfg = RedisConfig::default();
    cfg.host = "cache.internal".into();
    cfg.db = 2;
    assert_eq!(cfg.url(), "redis://cache.internal:6379/2");
}
