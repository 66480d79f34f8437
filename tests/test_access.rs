use config_bindr::{Bindable, Config, ConfigError, Manager};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Default, Bindable, Serialize)]
pub struct Conf {
    #[config("default=my name;usage=Name of the thing")]
    pub name: String,

    #[config("default=-10")]
    pub number: i64,

    #[config("default=11")]
    pub int8: i8,

    #[config("default=-1234")]
    pub int16: i16,

    #[config("default=123456")]
    pub int32: i32,

    #[config("default=200")]
    pub uint8: u8,

    #[config("default=60000")]
    pub uint16: u16,

    #[config("default=4000000000")]
    pub uint32: u32,

    #[config("default=18000000000000000000")]
    pub uint64: u64,

    #[config("default=9.99")]
    pub float: f64,

    #[config("default=1.5")]
    pub float32: f32,

    #[config("default=true")]
    pub bool: bool,

    #[config("default=foo,bar,baz")]
    pub list: Vec<String>,

    #[config("default=100ms")]
    pub timeout: Duration,

    #[config("default=1h30m")]
    pub window: Duration,
}

impl Config for Conf {
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

fn manager(env: &[(&str, &str)]) -> Manager {
    let env: HashMap<String, String> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Manager::new("conf", "Test configuration")
        .with_dotenv(false)
        .with_env_source(env)
}

#[test]
fn test_defaults_reach_every_kind() {
    let mut config = Conf::default();
    manager(&[]).load_from(&mut config, ["conf"]).unwrap();

    assert_eq!(config.name, "my name");
    assert_eq!(config.number, -10);
    assert_eq!(config.int8, 11);
    assert_eq!(config.int16, -1234);
    assert_eq!(config.int32, 123456);
    assert_eq!(config.uint8, 200);
    assert_eq!(config.uint16, 60000);
    assert_eq!(config.uint32, 4_000_000_000);
    assert_eq!(config.uint64, 18_000_000_000_000_000_000);
    assert_eq!(config.float, 9.99);
    assert_eq!(config.float32, 1.5);
    assert!(config.bool);
    assert_eq!(config.list, vec!["foo", "bar", "baz"]);
    assert_eq!(config.timeout, Duration::from_millis(100));
    assert_eq!(config.window, Duration::from_secs(90 * 60));
}

#[test]
fn test_flags_override_defaults() {
    let mut config = Conf::default();
    manager(&[])
        .load_from(
            &mut config,
            [
                "conf",
                "--name",
                "flag name",
                "--number=-3",
                "--bool=false",
                "--list",
                "a, b",
                "--timeout",
                "2s",
            ],
        )
        .unwrap();

    assert_eq!(config.name, "flag name");
    assert_eq!(config.number, -3);
    assert!(!config.bool);
    assert_eq!(config.list, vec!["a", "b"]);
    assert_eq!(config.timeout, Duration::from_secs(2));
    assert_eq!(config.int8, 11);
}

#[test]
fn test_env_overrides_default_but_not_flag() {
    let mut config = Conf::default();
    manager(&[("NAME", "from env"), ("INT8", "7")])
        .load_from(&mut config, ["conf", "--int8", "8"])
        .unwrap();

    assert_eq!(config.name, "from env");
    assert_eq!(config.int8, 8);
}

#[test]
fn test_empty_env_is_unset() {
    let mut config = Conf::default();
    manager(&[("NAME", "")])
        .load_from(&mut config, ["conf"])
        .unwrap();
    assert_eq!(config.name, "my name");
}

#[test]
fn test_overflowing_flag_is_rejected() {
    let mut config = Conf::default();
    let result = manager(&[]).load_from(&mut config, ["conf", "--int8", "300"]);
    assert!(matches!(result, Err(ConfigError::CommandLine { .. })));
}

#[test]
fn test_overflowing_env_is_invalid_value() {
    let mut config = Conf::default();
    let err = manager(&[("UINT8", "256")])
        .load_from(&mut config, ["conf"])
        .unwrap_err();
    match err {
        ConfigError::InvalidValue { field, value, .. } => {
            assert_eq!(field, "Uint8");
            assert_eq!(value, "256");
        }
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn test_direct_access_after_load() {
    let mut config = Conf::default();
    manager(&[]).load_from(&mut config, ["conf"]).unwrap();

    fn takes_timeout(timeout: Duration) -> u128 {
        timeout.as_millis() * 2
    }

    let message = format!("{} has {} items", config.name, config.list.len());
    assert_eq!(message, "my name has 3 items");
    assert_eq!(takes_timeout(config.timeout), 200);
}

#[test]
fn test_dump_json_reflects_loaded_values() {
    let mut config = Conf::default();
    manager(&[]).load_from(&mut config, ["conf"]).unwrap();

    let json: serde_json::Value = serde_json::from_str(&config.dump_json().unwrap()).unwrap();
    assert_eq!(json["name"], "my name");
    assert_eq!(json["list"][1], "bar");

    let yaml = config.dump_yaml().unwrap();
    assert!(yaml.contains("name: my name"));
}

#[test]
fn test_load_twice_is_idempotent() {
    let mut config = Conf::default();
    let manager = manager(&[("NUMBER", "5")]);
    manager.load_from(&mut config, ["conf"]).unwrap();
    manager.load_from(&mut config, ["conf"]).unwrap();
    assert_eq!(config.number, 5);
    assert_eq!(config.list, vec!["foo", "bar", "baz"]);
}

#[test]
fn test_negative_numbers_as_separate_arguments() {
    let mut config = Conf::default();
    manager(&[])
        .load_from(
            &mut config,
            ["conf", "--number", "-3", "--int8", "-8", "--float", "-2.5"],
        )
        .unwrap();

    assert_eq!(config.number, -3);
    assert_eq!(config.int8, -8);
    assert_eq!(config.float, -2.5);
}

#[test]
fn test_empty_flag_leaves_string_untouched() {
    let mut config = Conf::default();
    manager(&[])
        .load_from(&mut config, ["conf", "--name="])
        .unwrap();
    assert_eq!(config.name, "my name");
}

#[derive(Debug, Default, Bindable, Serialize)]
pub struct ShortH {
    #[config("default=localhost;short=h")]
    pub host: String,
}

impl Config for ShortH {
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

#[test]
fn test_short_h_is_a_flag_conflict() {
    let mut config = ShortH::default();
    let err = manager(&[])
        .load_from(&mut config, ["conf", "-h", "db"])
        .unwrap_err();

    assert!(err.is_schema_error());
    assert_eq!(
        err,
        ConfigError::FlagConflict {
            field: "Host".to_string(),
            flag: "-h".to_string(),
        }
    );
}

#[derive(Debug, Default, Bindable, Serialize)]
pub struct SameFlag {
    #[config(name = "FooBar")]
    pub first: String,

    #[config(name = "fooBar")]
    pub second: String,
}

impl Config for SameFlag {
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

#[test]
fn test_names_sharing_a_flag_are_a_flag_conflict() {
    let mut config = SameFlag::default();
    let err = manager(&[])
        .load_from(&mut config, ["conf"])
        .unwrap_err();
    assert!(matches!(err, ConfigError::FlagConflict { ref field, .. } if field == "fooBar"));
}
