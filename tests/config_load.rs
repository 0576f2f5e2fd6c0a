// tests/config_load.rs
use std::{env, fs};
use supplier_dashboard::config::DashboardConfig;

#[test]
fn load_toml_and_json_files() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("dashboard.toml");
    fs::write(
        &p_toml,
        r#"
page_size = 25
task_name_filter = "Sync"

[[sources]]
name = "Keystone"
base_url = "http://localhost:5000/"

[[sources]]
name = "Seawide"
base_url = "http://localhost:5000/seawide"
"#,
    )
    .unwrap();
    let cfg = DashboardConfig::load_from(&p_toml).unwrap();
    assert_eq!(cfg.page_size, 25);
    assert_eq!(cfg.sources.len(), 2);
    assert_eq!(cfg.sources[1].name, "Seawide");
    assert_eq!(cfg.task_name_filter.as_deref(), Some("Sync"));

    let p_json = dir.path().join("dashboard.json");
    fs::write(&p_json, r#"{"poll_interval_ms": 9000, "sources": []}"#).unwrap();
    let cj = DashboardConfig::load_from(&p_json).unwrap();
    assert_eq!(cj.poll_interval_ms, 5000);
    assert!(cj.sources.is_empty());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks_then_overrides() {
    // Isolate CWD so the repo's own config/ is not read.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var("DASHBOARD_CONFIG_PATH");
    env::remove_var("DASHBOARD_PAGE_SIZE");
    env::remove_var("DASHBOARD_POLL_INTERVAL_MS");

    // 1) nothing on disk -> defaults
    let d = DashboardConfig::load_default().unwrap();
    assert_eq!(d, DashboardConfig::default());

    // 2) fallback JSON in ./config/
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/dashboard.json"),
        r#"{"page_size": 20}"#,
    )
    .unwrap();
    assert_eq!(DashboardConfig::load_default().unwrap().page_size, 20);

    // 3) env path wins, env overrides apply on top
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "page_size = 30\n").unwrap();
    env::set_var("DASHBOARD_CONFIG_PATH", p_env.display().to_string());
    env::set_var("DASHBOARD_PAGE_SIZE", "12");
    env::set_var("DASHBOARD_POLL_INTERVAL_MS", "1500");
    let e = DashboardConfig::load_default().unwrap();
    assert_eq!(e.page_size, 12);
    assert_eq!(e.poll_interval_ms, 1500);

    // 4) env path to nowhere is an error
    env::set_var("DASHBOARD_CONFIG_PATH", tmp.path().join("missing.toml").display().to_string());
    assert!(DashboardConfig::load_default().is_err());

    env::remove_var("DASHBOARD_CONFIG_PATH");
    env::remove_var("DASHBOARD_PAGE_SIZE");
    env::remove_var("DASHBOARD_POLL_INTERVAL_MS");
    env::set_current_dir(&old).unwrap();
}
