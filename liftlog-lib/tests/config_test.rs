use anyhow::Result;
use liftlog_lib::{
    load_config_util, save_config_util, AppService, ChartMetric, Config, Phase, Units,
};
use std::time::Duration;
use tempfile::TempDir;

fn create_test_service(dir: &TempDir) -> Result<AppService> {
    let config = Config {
        store_url: "http://127.0.0.1:9".to_string(),
        notice_seconds: 2,
        chart_metric: ChartMetric::Volume,
        ..Default::default()
    };
    AppService::with_config(config, dir.path().join("config.toml"))
}

#[test]
fn test_load_creates_default_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("config.toml");

    let config = load_config_util(&path)?;
    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(config.store_url, "http://localhost:3000");
    assert_eq!(config.request_timeout(), Duration::from_secs(10));
    Ok(())
}

#[test]
fn test_save_and_reload_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");

    let mut config = Config::default();
    config.units = Units::Metric;
    config.chart_metric = ChartMetric::Estimated1Rm;
    config.nutrition.app_id = Some("abc".to_string());
    save_config_util(&path, &config)?;

    let text = std::fs::read_to_string(&path)?;
    assert!(text.contains("chart_metric = \"estimated-1rm\""));
    assert_eq!(load_config_util(&path)?, config);
    Ok(())
}

#[test]
fn test_invalid_file_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "request_timeout_secs = 0\n")?;

    let config = load_config_util(&path)?;
    assert!(AppService::with_config(config, path).is_err());
    Ok(())
}

#[tokio::test]
async fn test_setters_persist() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut service = create_test_service(&dir)?;

    service.set_units(Units::Metric)?;
    service.set_store_url("https://gym.example.com/api/")?;
    assert!(service.set_store_url("not a url").is_err());

    let saved = load_config_util(service.get_config_path())?;
    assert_eq!(saved.units, Units::Metric);
    assert_eq!(saved.store_url, "https://gym.example.com/api");
    assert_eq!(service.store().base_url(), "https://gym.example.com/api");
    Ok(())
}

#[tokio::test]
async fn test_exercise_log_uses_config() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let service = create_test_service(&dir)?;

    let log = service.exercise_log();
    assert_eq!(log.metric(), ChartMetric::Volume);
    assert_eq!(log.phase(), Phase::Idle);
    Ok(())
}

#[tokio::test]
async fn test_blank_barcode_is_validation_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let service = create_test_service(&dir)?;

    let err = service.lookup_barcode("  ").await.unwrap_err();
    assert!(err.is_validation());
    Ok(())
}
