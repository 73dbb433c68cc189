use std::io::Write;

use tempfile::NamedTempFile;

use fleetscrape::config::{password_env_var, Config, LogFormat};
use fleetscrape::connection::BackoffPolicy;
use fleetscrape::error::{ConfigError, Error};

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

fn load_err(contents: &str) -> ConfigError {
    let file = write_temp_config(contents);
    match Config::load(file.path()) {
        Err(Error::Config(err)) => err,
        Err(other) => panic!("expected config error, got {other}"),
        Ok(_) => panic!("expected config error, config loaded"),
    }
}

#[test]
fn config_loads_every_section_from_file() {
    let file = write_temp_config(
        r#"
[logging]
level = "debug"
format = "json"

[scrape]
fetch_in_parallel = true
max_worker_threads = 3
max_scrape_duration_secs = 10
total_max_scrape_duration_secs = 40
minimal_collect_interval_secs = 2
persistent_connection_pool = false
persistent_lease_cache = false
interval_secs = 15

[connection]
connect_timeout_secs = 2
initial_delay_on_failure_secs = 60
max_delay_on_failure_secs = 600
delay_inc_div = 3

[pool]
max_size = 4
ttl_secs = 120

[[devices]]
name = "core"
host = "10.0.0.1"
port = 8729
username = "monitor"
password = "secret"
use_ssl = true
features = ["dhcp"]

[[devices]]
name = "edge"
host = "10.0.0.2"
remote_lease_source = "core"
"#,
    );

    let config = Config::load(file.path()).expect("load config");

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);

    let scrape = &config.scrape;
    assert!(scrape.fetch_in_parallel);
    assert_eq!(scrape.max_worker_threads, 3);
    assert_eq!(scrape.max_scrape_duration_secs, 10);
    assert_eq!(scrape.total_max_scrape_duration_secs, 40);
    assert_eq!(scrape.minimal_collect_interval_secs, 2);
    assert!(!scrape.persistent_connection_pool);
    assert!(!scrape.persistent_lease_cache);
    assert_eq!(scrape.interval_secs, 15);

    assert_eq!(config.connection.connect_timeout_secs, 2);
    assert_eq!(
        BackoffPolicy::from(&config.connection).delay(3).as_secs(),
        120
    );
    assert_eq!(config.pool.max_size, 4);
    assert_eq!(config.pool.ttl_secs, 120);

    let core = config.device("core").expect("core device");
    assert_eq!(core.port, 8729);
    assert_eq!(core.username.as_deref(), Some("monitor"));
    assert!(core.use_ssl);
    assert!(core.has_feature("dhcp"));

    let edge = config.device("edge").expect("edge device");
    assert_eq!(edge.port, 8728);
    assert!(edge.enabled);
    assert_eq!(edge.remote_lease_source.as_deref(), Some("core"));
    assert!(!edge.has_feature("dhcp"));
}

#[test]
fn config_missing_file_is_read_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = Config::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::Config(ConfigError::ReadFile(_)))));
}

#[test]
fn config_malformed_toml_is_parse_error() {
    let err = load_err("[scrape\nmax_worker_threads = 2\n");
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn config_rejects_duplicate_device_names() {
    let err = load_err(
        r#"
[[devices]]
name = "r1"
host = "10.0.0.1"

[[devices]]
name = "r1"
host = "10.0.0.2"
"#,
    );
    assert!(matches!(err, ConfigError::DuplicateDevice { name } if name == "r1"));
}

#[test]
fn config_rejects_unknown_lease_source() {
    let err = load_err(
        r#"
[[devices]]
name = "edge"
host = "10.0.0.2"
remote_lease_source = "core"
"#,
    );
    assert!(matches!(
        err,
        ConfigError::UnknownLeaseSource { device, source_name }
            if device == "edge" && source_name == "core"
    ));
}

#[test]
fn config_rejects_empty_host() {
    let err = load_err(
        r#"
[[devices]]
name = "r1"
host = ""
"#,
    );
    assert!(matches!(err, ConfigError::MissingField { field: "host" }));
}

#[test]
fn config_rejects_zero_pool_size() {
    let err = load_err("[pool]\nmax_size = 0\n");
    assert!(matches!(err, ConfigError::InvalidValue { field: "pool.max_size", .. }));
}

#[test]
fn config_rejects_zero_connect_timeout() {
    let err = load_err("[connection]\nconnect_timeout_secs = 0\n");
    assert!(matches!(
        err,
        ConfigError::InvalidValue { field: "connect_timeout_secs", .. }
    ));
}

#[test]
fn config_rejects_backoff_cap_below_initial_delay() {
    let err = load_err(
        "[connection]\ninitial_delay_on_failure_secs = 300\nmax_delay_on_failure_secs = 60\n",
    );
    assert!(matches!(
        err,
        ConfigError::InvalidValue { field: "max_delay_on_failure_secs", .. }
    ));
}

#[test]
fn config_inline_password_wins_over_environment() {
    let name = "config-tests-inline";
    std::env::set_var(password_env_var(name), "from-env");

    let file = write_temp_config(&format!(
        "[[devices]]\nname = \"{name}\"\nhost = \"10.0.0.9\"\npassword = \"inline\"\n"
    ));
    let config = Config::load(file.path()).expect("load config");

    assert_eq!(
        config.device(name).and_then(|d| d.password.as_deref()),
        Some("inline")
    );
}

#[test]
fn config_debug_output_redacts_password() {
    let file = write_temp_config(
        "[[devices]]\nname = \"r1\"\nhost = \"10.0.0.1\"\npassword = \"hunter2\"\n",
    );
    let config = Config::load(file.path()).expect("load config");

    let debug = format!("{:?}", config);
    assert!(!debug.contains("hunter2"), "password leaked: {debug}");
}
