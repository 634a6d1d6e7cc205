// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, env var interpolation, poll defaults, and discovery.

use fleetroll::config::*;
use fleetroll::deploy::{FleetDefaults, PollPolicy};
use fleetroll::error::Error;
use std::fs;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = Config::from_yaml("").unwrap();

        assert_eq!(config.fleet_defaults().unwrap(), FleetDefaults::default());
        assert_eq!(config.drain_policy(), PollPolicy::DRAIN);
        assert!(config.signal.is_none());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
fleet:
  name: web
  default_image_parameter: /fleet/default-image
  drain:
    interval: 10s
    max_attempts: 12

signal:
  stack_name: web-stack
  logical_resource_id: Fleet
  target_groups:
    - tg/public
    - tg/admin
  health:
    interval: 5s
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(
            config.fleet_defaults().unwrap(),
            FleetDefaults {
                name: Some("web".to_string()),
                default_image_parameter: Some("/fleet/default-image".to_string()),
            }
        );
        assert_eq!(
            config.drain_policy(),
            PollPolicy::new(Duration::from_secs(10), 12)
        );

        let target = config.signal_target().unwrap();
        assert_eq!(target.stack_name, "web-stack");
        assert_eq!(target.logical_resource_id, "Fleet");
        let groups: Vec<&str> = target.target_groups.iter().map(|g| g.as_str()).collect();
        assert_eq!(groups, vec!["tg/public", "tg/admin"]);
        assert_eq!(target.health.interval, Duration::from_secs(5));
        assert_eq!(target.health.max_attempts, PollPolicy::HEALTH.max_attempts);
    }

    #[test]
    fn partial_drain_settings_keep_other_defaults() {
        let yaml = r#"
fleet:
  drain:
    max_attempts: 3
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(
            config.drain_policy(),
            PollPolicy::new(PollPolicy::DRAIN.interval, 3)
        );
    }

    #[test]
    fn signal_target_requires_signal_section() {
        let config = Config::from_yaml("fleet:\n  name: web\n").unwrap();

        assert!(matches!(
            config.signal_target(),
            Err(Error::InvalidConfig(_))
        ));
    }
}

mod validation {
    use super::*;

    #[test]
    fn zero_drain_attempts_rejected() {
        let yaml = r#"
fleet:
  drain:
    max_attempts: 0
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("fleet.drain.max_attempts"));
    }

    #[test]
    fn zero_health_attempts_rejected() {
        let yaml = r#"
signal:
  stack_name: s
  logical_resource_id: L
  target_groups: [tg/a]
  health:
    max_attempts: 0
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("signal.health.max_attempts"));
    }

    #[test]
    fn empty_target_groups_rejected() {
        let yaml = r#"
signal:
  stack_name: s
  logical_resource_id: L
  target_groups: []
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("at least one target group"));
    }

    #[test]
    fn blank_target_group_rejected() {
        let yaml = r#"
signal:
  stack_name: s
  logical_resource_id: L
  target_groups: ["tg/a", "  "]
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("cannot be blank"));
    }

    #[test]
    fn bad_interval_rejected() {
        let yaml = r#"
fleet:
  drain:
    interval: soon
"#;
        assert!(matches!(Config::from_yaml(yaml), Err(Error::Yaml(_))));
    }
}

mod env_values {
    use super::*;

    #[test]
    fn literal_and_env_forms_parse() {
        let yaml = r#"
fleet:
  name: { env: FLEETROLL_TEST_FLEET }
  default_image_parameter: { env: FLEETROLL_TEST_IMAGE, default: /fleet/default }
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(
            config.fleet.name,
            Some(EnvValue::FromEnv {
                var: "FLEETROLL_TEST_FLEET".to_string(),
                default: None,
            })
        );
    }

    #[test]
    fn env_values_resolve_from_environment() {
        let yaml = r#"
fleet:
  name: { env: FLEETROLL_TEST_FLEET }
  default_image_parameter: { env: FLEETROLL_TEST_IMAGE, default: /fleet/default }
"#;
        let config = Config::from_yaml(yaml).unwrap();

        temp_env::with_vars(
            [
                ("FLEETROLL_TEST_FLEET", Some("web-blue")),
                ("FLEETROLL_TEST_IMAGE", None),
            ],
            || {
                let defaults = config.fleet_defaults().unwrap();
                assert_eq!(defaults.name.as_deref(), Some("web-blue"));
                assert_eq!(
                    defaults.default_image_parameter.as_deref(),
                    Some("/fleet/default")
                );
            },
        );
    }

    #[test]
    fn unset_env_without_default_is_an_error() {
        let value = EnvValue::FromEnv {
            var: "FLEETROLL_TEST_UNSET".to_string(),
            default: None,
        };

        temp_env::with_var_unset("FLEETROLL_TEST_UNSET", || {
            assert!(matches!(
                value.resolve(),
                Err(Error::MissingEnvVar(ref var)) if var == "FLEETROLL_TEST_UNSET"
            ));
        });
    }

    #[test]
    fn unset_optional_stays_none() {
        assert_eq!(resolve_optional(None).unwrap(), None);
    }

    #[test]
    fn signal_fields_resolve_from_environment() {
        let yaml = r#"
signal:
  stack_name: { env: FLEETROLL_TEST_STACK }
  logical_resource_id: Fleet
  target_groups: [tg/a]
"#;
        let config = Config::from_yaml(yaml).unwrap();

        temp_env::with_var("FLEETROLL_TEST_STACK", Some("web-prod"), || {
            assert_eq!(config.signal_target().unwrap().stack_name, "web-prod");
        });
    }
}

mod discovery {
    use super::*;

    #[test]
    fn discovers_primary_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "fleet:\n  name: web\n").unwrap();

        let config = Config::discover(dir.path()).unwrap();

        assert_eq!(config.fleet.name, Some(EnvValue::Literal("web".to_string())));
    }

    #[test]
    fn discovers_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".fleetroll")).unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME_DIR), "fleet:\n  name: api\n").unwrap();

        let config = Config::discover(dir.path()).unwrap();

        assert_eq!(config.fleet.name, Some(EnvValue::Literal("api".to_string())));
    }

    #[test]
    fn missing_file_is_not_found_or_default() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            Config::discover(dir.path()),
            Err(Error::ConfigNotFound(_))
        ));
        let config = Config::discover_or_default(dir.path()).unwrap();
        assert_eq!(config.drain_policy(), PollPolicy::DRAIN);
    }

    #[test]
    fn init_writes_parsable_template() {
        let dir = tempfile::tempdir().unwrap();

        let path = init_config(dir.path(), Some("web"), false).unwrap();
        let config = Config::load(&path).unwrap();

        assert_eq!(config.fleet.name, Some(EnvValue::Literal("web".to_string())));
        assert!(matches!(
            init_config(dir.path(), Some("web"), false),
            Err(Error::AlreadyExists(_))
        ));
        assert!(init_config(dir.path(), Some("api"), true).is_ok());
    }
}
