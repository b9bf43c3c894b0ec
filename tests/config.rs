//! Tests for config loading, includes and per-app overrides.

use jlog::{Config, Error, Level, TimeDisplay};
use std::fs;
use tempfile::TempDir;

#[test]
fn load_with_sources_merges_maps() {
    let tmp_dir = TempDir::new().unwrap();
    let base_path = tmp_dir.path().join("base.toml");
    let child_path = tmp_dir.path().join("child.toml");

    fs::write(
        &base_path,
        r#"
source = "child.toml"

[meta]
team = "payments"

[apps.billing]
level = "warn"
"#,
    )
    .unwrap();

    fs::write(
        &child_path,
        r#"
[meta]
team = "ignored"
region = "eu-1"

[apps.search]
format = "pretty"

[[sinks]]
target = "stderr"
"#,
    )
    .unwrap();

    let config = Config::load_from(&base_path).unwrap();
    assert_eq!(config.meta["team"], "payments");
    assert_eq!(config.meta["region"], "eu-1");
    assert!(config.apps.contains_key("billing"));
    assert!(config.apps.contains_key("search"));
    assert_eq!(config.sinks.len(), 1);
    assert_eq!(config.sinks[0].target, "stderr");
}

#[test]
fn load_with_missing_source_is_ignored() {
    let tmp_dir = TempDir::new().unwrap();
    let base_path = tmp_dir.path().join("base.toml");

    let base_content = format!(
        "source = \"{}\"\n\n[meta]\nteam = \"core\"\n",
        tmp_dir.path().join("missing.toml").display()
    );
    fs::write(&base_path, base_content).unwrap();

    let config = Config::load_from(&base_path).unwrap();
    assert_eq!(config.meta["team"], "core");
}

#[test]
fn cyclic_includes_are_rejected() {
    let tmp_dir = TempDir::new().unwrap();
    let a = tmp_dir.path().join("a.toml");
    let b = tmp_dir.path().join("b.toml");
    fs::write(&a, "source = \"b.toml\"\n").unwrap();
    fs::write(&b, "source = \"a.toml\"\n").unwrap();

    let result = Config::load_from(&a);
    assert!(matches!(result, Err(Error::CyclicInclude(_))));
}

#[test]
fn missing_file_yields_defaults() {
    let tmp_dir = TempDir::new().unwrap();
    let config = Config::load_from(&tmp_dir.path().join("absent.toml")).unwrap();
    assert!(config.sinks.is_empty());
    assert!(config.general.capture_stack);
    assert_eq!(config.parse_timezone().unwrap(), TimeDisplay::Utc);
}

#[test]
fn app_overrides_apply_on_top() {
    let config = Config::from_toml(
        r#"
[general]
level = "info"

[meta]
team = "core"

[apps.billing]
level = "trace"
sinks = [{ target = "stderr", level = "warn" }]

[apps.billing.meta]
team = "payments"
"#,
    )
    .unwrap();

    let billing = config.for_app("billing");
    assert_eq!(billing.general.app_name.as_deref(), Some("billing"));
    assert_eq!(billing.parse_level().unwrap(), Level::Trace);
    assert_eq!(billing.meta["team"], "payments");
    assert_eq!(billing.sink_level(&billing.sinks[0]).unwrap(), Level::Warn);

    let other = config.for_app("search");
    assert_eq!(other.parse_level().unwrap(), Level::Info);
    assert_eq!(other.meta["team"], "core");
    assert!(other.sinks.is_empty());
}

#[test]
fn sink_level_inherits_the_general_level() {
    let config = Config::from_toml("[general]\nlevel = \"debug\"\n\n[[sinks]]\ntarget = \"stdout\"\n").unwrap();
    assert_eq!(config.sink_level(&config.sinks[0]).unwrap(), Level::Debug);
}

#[test]
fn invalid_values_are_errors() {
    let config = Config::from_toml("[general]\nlevel = \"loud\"\nformat = \"xml\"\ntimezone = \"mars\"\n").unwrap();
    assert!(matches!(config.parse_level(), Err(Error::InvalidLevel(_))));
    assert!(matches!(config.parse_format(), Err(Error::InvalidConfig(_))));
    assert!(matches!(config.parse_timezone(), Err(Error::InvalidConfig(_))));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    assert!(matches!(
        Config::from_toml("[general\nlevel = "),
        Err(Error::ConfigParse(_))
    ));
}

#[test]
fn pool_and_inspect_sections_map_to_runtime_settings() {
    let config = Config::from_toml(
        "[pool]\nsize = 3\nmax_overflow = 5\n\n[inspect]\nmax_array = 7\n",
    )
    .unwrap();
    let pool = config.pool.to_pool_config();
    assert_eq!(pool.size, 3);
    assert_eq!(pool.overflow_threshold, 3);
    assert_eq!(pool.max_overflow, 5);
    assert_eq!(config.inspect.to_limits().max_array, 7);
}

#[test]
fn targets_expand_the_home_directory() {
    let expanded = Config::expand_target("~/logs/app.log");
    assert!(expanded.ends_with("logs/app.log"));
    assert_eq!(
        Config::expand_target("/var/log/app.log"),
        std::path::PathBuf::from("/var/log/app.log")
    );
}
