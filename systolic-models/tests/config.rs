// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::path::Path;

use figment::Jail;
use systolic_components::arbiter::policy::PolicyKind;
use systolic_models::config::SystolicConfig;

#[test]
fn defaults_without_a_file() {
    Jail::expect_with(|_jail| {
        let config = SystolicConfig::load(None).unwrap();
        assert_eq!(config, SystolicConfig::default());
        Ok(())
    });
}

#[test]
fn file_overrides_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "systolic.toml",
            r#"
                grid_size = 8
                burst_write_len = 33
                policy = "round_robin"
            "#,
        )?;

        let config = SystolicConfig::load(Some(Path::new("systolic.toml"))).unwrap();
        assert_eq!(config.grid_size, 8);
        assert_eq!(config.load_rows(), 32);
        assert_eq!(config.policy, PolicyKind::RoundRobin);
        assert_eq!(config.num_cores, 4);
        Ok(())
    });
}

#[test]
fn environment_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file("systolic.toml", "num_cores = 8\nburst_read_len = 9")?;
        jail.set_env("SYSTOLIC_NUM_CORES", 2);
        jail.set_env("SYSTOLIC_POLICY", "round_robin");

        let config = SystolicConfig::load(Some(Path::new("systolic.toml"))).unwrap();
        assert_eq!(config.num_cores, 2);
        assert_eq!(config.burst_read_len, 9);
        assert_eq!(config.policy, PolicyKind::RoundRobin);
        Ok(())
    });
}

#[test]
fn missing_file_uses_defaults() {
    Jail::expect_with(|_jail| {
        let config = SystolicConfig::load(Some(Path::new("absent.toml"))).unwrap();
        assert_eq!(config, SystolicConfig::default());
        Ok(())
    });
}

#[test]
fn bad_values_are_errors() {
    Jail::expect_with(|jail| {
        jail.create_file("bad_type.toml", "grid_size = \"big\"")?;
        let err = SystolicConfig::load(Some(Path::new("bad_type.toml"))).unwrap_err();
        assert!(err.0.starts_with("invalid configuration"), "{err}");

        jail.create_file("bad_policy.toml", "policy = \"lottery\"")?;
        assert!(SystolicConfig::load(Some(Path::new("bad_policy.toml"))).is_err());

        jail.create_file("too_small.toml", "grid_size = 0")?;
        assert!(SystolicConfig::load(Some(Path::new("too_small.toml"))).is_err());
        Ok(())
    });
}
