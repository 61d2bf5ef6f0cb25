use std::time::Duration;

use app_config::AppConfig;

#[test]
fn test_load_default_config() {
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.db_port, 5432);
    assert_eq!(cfg.db_pool_size, 16);
    assert_eq!(cfg.db_wait_timeout, Duration::from_secs(5));
    assert_eq!(cfg.migrations_dir, "migrations");
    assert_eq!(cfg.admin_email, "default@admin.com");
}

#[test]
fn test_database_dsn() {
    let cfg = AppConfig::load().unwrap();
    let dsn = cfg.database_dsn();
    assert!(dsn.contains(&format!("port={}", cfg.db_port)));
    assert!(dsn.ends_with("sslmode=disable"));
}
