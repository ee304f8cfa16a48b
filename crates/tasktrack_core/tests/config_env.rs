use tasktrack_core::config::{ENV_DB_PATH, ENV_LOG_LEVEL};
use tasktrack_core::CoreConfig;

// Only this test touches process env; keep it in its own test binary.
#[test]
fn from_env_reads_tasktrack_variables() {
    std::env::set_var(ENV_LOG_LEVEL, "error");
    std::env::set_var(ENV_DB_PATH, "/var/tmp/tasktrack-env.db");

    let config = CoreConfig::from_env().unwrap();
    assert_eq!(config.log_level, "error");
    assert_eq!(
        config.database_path.as_deref(),
        Some(std::path::Path::new("/var/tmp/tasktrack-env.db"))
    );

    std::env::remove_var(ENV_LOG_LEVEL);
    std::env::remove_var(ENV_DB_PATH);
}

#[test]
fn config_deserializes_with_defaults() {
    let config: CoreConfig =
        serde_json::from_str(r#"{"default_sort":{"field":"due_at","direction":"desc"}}"#).unwrap();
    assert_eq!(
        config.default_sort,
        tasktrack_core::SortSpec::parse("due:desc")
    );
    assert!(config.database_path.is_none());
}
