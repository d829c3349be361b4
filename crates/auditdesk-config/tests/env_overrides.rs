use auditdesk_config::{AuditDeskConfig, ConfigError, StorageBackend};
use figment::Jail;
use pretty_assertions::assert_eq;

#[test]
fn env_vars_fill_nested_sections() {
    Jail::expect_with(|jail| {
        jail.set_env("AUDITDESK_DATABASE__PATH", ":memory:");
        jail.set_env("AUDITDESK_STORAGE__BACKEND", "memory");
        jail.set_env("AUDITDESK_IMPORT__MAX_FILE_BYTES", "4096");

        let config = AuditDeskConfig::load().expect("config loads");
        assert!(config.database.is_in_memory());
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.import.max_file_bytes, 4096);
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".auditdesk")?;
        jail.create_file(
            ".auditdesk/config.toml",
            r#"
[storage]
bucket_name = "from-file"
"#,
        )?;
        jail.set_env("AUDITDESK_STORAGE__BUCKET_NAME", "from-env");

        let config = AuditDeskConfig::load().expect("config loads");
        assert_eq!(config.storage.bucket_name, "from-env");
        Ok(())
    });
}

#[test]
fn zero_debounce_is_rejected_on_load() {
    Jail::expect_with(|jail| {
        jail.set_env("AUDITDESK_ENGINE__DEBOUNCE_MS", "0");

        let err = AuditDeskConfig::load().expect_err("zero window must fail");
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        Ok(())
    });
}
