//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for sandboxed file and env var manipulation.

use auditdesk_config::{AuditDeskConfig, StorageBackend};
use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;

#[test]
fn loads_engine_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[engine]
debounce_ms = 250
event_capacity = 32
"#,
        )?;

        let config: AuditDeskConfig =
            Figment::from(Serialized::defaults(AuditDeskConfig::default()))
                .merge(Toml::file("config.toml"))
                .extract()?;

        assert_eq!(config.engine.debounce_ms, 250);
        assert_eq!(config.engine.event_capacity, 32);
        assert!(config.engine.validate().is_ok());
        Ok(())
    });
}

#[test]
fn loads_s3_storage_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[storage]
backend = "s3"
bucket_name = "site-audits"
endpoint = "http://localhost:9000"
region = "eu-west-1"
access_key_id = "toml-key"
secret_access_key = "toml-secret"
evidence_prefix = "uploads"
"#,
        )?;

        let config: AuditDeskConfig =
            Figment::from(Serialized::defaults(AuditDeskConfig::default()))
                .merge(Toml::file("config.toml"))
                .extract()?;

        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.storage.bucket_name, "site-audits");
        assert_eq!(config.storage.endpoint_url(), Some("http://localhost:9000"));
        assert_eq!(config.storage.region, "eu-west-1");
        assert_eq!(config.storage.evidence_prefix, "uploads");
        assert!(config.storage.is_configured());
        Ok(())
    });
}

#[test]
fn partial_sections_keep_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = ":memory:"
"#,
        )?;

        let config: AuditDeskConfig =
            Figment::from(Serialized::defaults(AuditDeskConfig::default()))
                .merge(Toml::file("config.toml"))
                .extract()?;

        assert!(config.database.is_in_memory());
        assert_eq!(config.engine.debounce_ms, 1000);
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.import.max_file_bytes, 10 * 1024 * 1024);
        Ok(())
    });
}

#[test]
fn project_config_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".auditdesk")?;
        jail.create_file(
            ".auditdesk/config.toml",
            r#"
[import]
max_file_bytes = 2048

[storage]
backend = "memory"
"#,
        )?;

        let config = AuditDeskConfig::load().expect("config loads");
        assert_eq!(config.import.max_file_bytes, 2048);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[engine]
debounce_ms = 500
"#,
        )?;
        jail.set_env("AUDITDESK_ENGINE__DEBOUNCE_MS", "2000");

        let config: AuditDeskConfig =
            Figment::from(Serialized::defaults(AuditDeskConfig::default()))
                .merge(Toml::file("config.toml"))
                .merge(Env::prefixed("AUDITDESK_").split("__"))
                .extract()?;

        assert_eq!(config.engine.debounce_ms, 2000);
        Ok(())
    });
}

#[test]
fn unknown_backend_fails_extraction() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[storage]
backend = "ftp"
"#,
        )?;

        let result: Result<AuditDeskConfig, _> =
            Figment::from(Serialized::defaults(AuditDeskConfig::default()))
                .merge(Toml::file("config.toml"))
                .extract();

        assert!(result.is_err());
        Ok(())
    });
}
