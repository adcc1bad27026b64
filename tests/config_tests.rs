// Config loading and validation tests

use desigo_bridge::config::AppConfig;
use desigo_bridge::models::StateClass;

const VALID_CONFIG: &str = r#"
[server]
port = 8082
host = "0.0.0.0"

[source]
url = "https://scraper.example/api/data"
username = "user"
password = "secret"

[database]
path = "data/statistics.db"

[[series]]
name = "Heat pump energy"
key = "hp_energy"
series_group = "Heat pump"
series_name = "Energy"
device_class = "energy"
state_class = "total_increasing"
unit_of_measurement = "kWh"
icon = "mdi:heat-pump"

[[series]]
name = "Outside temperature"
key = "outside_temp"
series_group = "Outside"
series_name = "Temperature"
state_class = "measurement"
unit_of_measurement = "°C"
statistic_id = "sensor.outside_temperature"
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8082);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.source.url, "https://scraper.example/api/data");
    assert_eq!(config.source.username, "user");
    assert_eq!(config.database.path, "data/statistics.db");
    assert_eq!(config.series.len(), 2);
    assert_eq!(config.series[0].state_class, StateClass::TotalIncreasing);
    assert_eq!(config.series[0].icon.as_deref(), Some("mdi:heat-pump"));
    assert_eq!(config.series[1].device_class, None);
}

#[test]
fn test_config_source_defaults_when_omitted() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("valid");
    assert_eq!(config.source.update_interval_secs, 3600);
    assert_eq!(config.source.history_start, "2000-01-01");
    assert_eq!(config.source.request_timeout_secs, 30);
}

#[test]
fn test_config_series_to_subscription_and_statistic_id() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("valid");
    let sub = config.series[0].to_subscription();
    assert_eq!(sub.key, "hp_energy");
    assert_eq!(sub.identity.group, "Heat pump");
    assert_eq!(sub.identity.name, "Energy");
    assert_eq!(sub.unit, "kWh");
    assert_eq!(config.series[0].statistic_id(), "sensor.desigo_hp_energy");
    assert_eq!(config.series[1].statistic_id(), "sensor.outside_temperature");
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8082", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_non_http_url() {
    let bad = VALID_CONFIG.replace("https://scraper.example/api/data", "ftp://scraper");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("source.url"));
}

#[test]
fn test_config_validation_rejects_empty_username() {
    let bad = VALID_CONFIG.replace("username = \"user\"", "username = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("source.username"));
}

#[test]
fn test_config_validation_rejects_update_interval_zero() {
    let bad = VALID_CONFIG.replace(
        "password = \"secret\"",
        "password = \"secret\"\nupdate_interval_secs = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("update_interval_secs"));
}

#[test]
fn test_config_validation_rejects_bad_history_start() {
    let bad = VALID_CONFIG.replace(
        "password = \"secret\"",
        "password = \"secret\"\nhistory_start = \"01/01/2000\"",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("history_start"));
}

#[test]
fn test_config_validation_rejects_empty_db_path() {
    let bad = VALID_CONFIG.replace("path = \"data/statistics.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.path"));
}

#[test]
fn test_config_validation_rejects_duplicate_keys() {
    let bad = VALID_CONFIG.replace("key = \"outside_temp\"", "key = \"hp_energy\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("duplicated"));
}

#[test]
fn test_config_validation_rejects_empty_series_name() {
    let bad = VALID_CONFIG.replace("series_name = \"Temperature\"", "series_name = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("series[1].series_name"));
}

#[test]
fn test_config_validation_rejects_bad_icon() {
    let bad = VALID_CONFIG.replace("icon = \"mdi:heat-pump\"", "icon = \"heat-pump\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("icon"));
}

#[test]
fn test_config_validation_rejects_unknown_state_class() {
    let bad = VALID_CONFIG.replace("state_class = \"measurement\"", "state_class = \"gauge\"");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_config_validation_rejects_missing_series() {
    let head = VALID_CONFIG.split("[[series]]").next().unwrap();
    let err = AppConfig::load_from_str(head).unwrap_err();
    assert!(err.to_string().contains("series"));
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.server.port, 8082);
    assert_eq!(config.series.len(), 2);
}
