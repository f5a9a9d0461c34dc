//! Config loading: defaults < pwa.config.json < PWA_* environment.

use std::path::Path;

use figment::Jail;
use pwa_kit::{ConfigError, PreflightPolicy, PwaConfig};

#[test]
fn defaults_without_sources() {
    Jail::expect_with(|_jail| {
        let config = PwaConfig::load(None).map_err(|e| e.to_string())?;
        assert_eq!(config, PwaConfig::default());
        Ok(())
    });
}

#[test]
fn config_file_in_working_directory() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "pwa.config.json",
            r#"{ "url": "/app/sw.js", "scope": "/app/", "preflight": "validate" }"#,
        )?;

        let config = PwaConfig::load(None).map_err(|e| e.to_string())?;
        assert_eq!(config.url, "/app/sw.js");
        assert_eq!(config.scope, "/app/");
        assert_eq!(config.preflight, PreflightPolicy::Validate);
        Ok(())
    });
}

#[test]
fn explicit_path_and_env_override() {
    Jail::expect_with(|jail| {
        jail.create_file("pwa.staging.json", r#"{ "url": "/from-file.js" }"#)?;
        jail.set_env("PWA_URL", "/from-env.js");
        jail.set_env("PWA_UPDATE_MESSAGE", "Update ready");

        let config =
            PwaConfig::load(Some(Path::new("pwa.staging.json"))).map_err(|e| e.to_string())?;
        assert_eq!(config.url, "/from-env.js");
        assert_eq!(config.update_message, "Update ready");
        assert_eq!(config.scope, "./");
        Ok(())
    });
}

#[test]
fn empty_scope_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file("pwa.config.json", r#"{ "scope": "" }"#)?;

        let err = PwaConfig::load(None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "scope"));
        Ok(())
    });
}

#[test]
fn mistyped_value_is_a_load_error() {
    Jail::expect_with(|jail| {
        jail.create_file("pwa.config.json", r#"{ "preflight": "sometimes" }"#)?;

        let err = PwaConfig::load(None).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
        Ok(())
    });
}
