//! Configuration management for herakles-sysstats.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use herakles_sysstats::collectors::DEFAULT_OS_RELEASE;
use herakles_sysstats::platform::DEFAULT_PROC_ROOT;
use herakles_sysstats::{BaselinePolicy, NameFilter, SamplerSettings, DEFAULT_CPU_USAGE_INTERVAL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;
pub const DEFAULT_SAMPLE_TIMEOUT_MS: u64 = 5_000;
pub const MAX_SAMPLE_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_SYS_ROOT: &str = "/sys";

/// Service configuration. Unset fields fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Sampling
    #[serde(alias = "sample-interval-ms")]
    pub sample_interval_ms: Option<u64>,
    #[serde(alias = "sample-timeout-ms")]
    pub sample_timeout_ms: Option<u64>,
    /// "suppress" | "zero_baseline"
    #[serde(alias = "baseline-policy")]
    pub baseline_policy: Option<String>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "cpu-usage-interval-ms")]
    pub cpu_usage_interval_ms: Option<u64>,
    #[serde(alias = "sys-root")]
    pub sys_root: Option<PathBuf>,
    #[serde(alias = "os-release-path")]
    pub os_release_path: Option<PathBuf>,
    /// Path to JSON test data file (replays recorded snapshots instead of /proc)
    #[serde(alias = "test-data-file")]
    pub test_data_file: Option<PathBuf>,

    // Filtering
    #[serde(alias = "include-names")]
    pub include_names: Option<Vec<String>>,
    #[serde(alias = "exclude-names")]
    pub exclude_names: Option<Vec<String>>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,
    #[serde(alias = "enable-telemetry")]
    pub enable_telemetry: Option<bool>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            sample_interval_ms: Some(DEFAULT_SAMPLE_INTERVAL_MS),
            sample_timeout_ms: Some(DEFAULT_SAMPLE_TIMEOUT_MS),
            baseline_policy: Some(BaselinePolicy::default().as_str().to_string()),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            cpu_usage_interval_ms: Some(DEFAULT_CPU_USAGE_INTERVAL.as_millis() as u64),
            sys_root: Some(PathBuf::from(DEFAULT_SYS_ROOT)),
            os_release_path: Some(PathBuf::from(DEFAULT_OS_RELEASE)),
            test_data_file: None,
            include_names: None,
            exclude_names: None,
            enable_health: Some(true),
            enable_telemetry: Some(true),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(
            self.sample_interval_ms
                .unwrap_or(DEFAULT_SAMPLE_INTERVAL_MS),
        )
    }

    pub fn sample_timeout(&self) -> Duration {
        Duration::from_millis(self.sample_timeout_ms.unwrap_or(DEFAULT_SAMPLE_TIMEOUT_MS))
    }

    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn cpu_usage_interval(&self) -> Duration {
        self.cpu_usage_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_CPU_USAGE_INTERVAL)
    }

    pub fn sys_root(&self) -> PathBuf {
        self.sys_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SYS_ROOT))
    }

    pub fn os_release_path(&self) -> PathBuf {
        self.os_release_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OS_RELEASE))
    }

    pub fn baseline_policy(&self) -> Result<BaselinePolicy, String> {
        match self.baseline_policy.as_deref() {
            Some(name) => name.parse(),
            None => Ok(BaselinePolicy::default()),
        }
    }

    pub fn sampler_settings(&self) -> Result<SamplerSettings, String> {
        Ok(SamplerSettings {
            interval: self.sample_interval(),
            baseline_policy: self.baseline_policy()?,
        })
    }

    pub fn name_filter(&self) -> NameFilter {
        NameFilter {
            include: self.include_names.clone(),
            exclude: self.exclude_names.clone(),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let interval_ms = cfg.sample_interval_ms.unwrap_or(DEFAULT_SAMPLE_INTERVAL_MS);
    if interval_ms == 0 || interval_ms > MAX_SAMPLE_INTERVAL_MS {
        return Err(format!(
            "sample_interval_ms must be between 1 and {}, got {}",
            MAX_SAMPLE_INTERVAL_MS, interval_ms
        )
        .into());
    }

    let timeout_ms = cfg.sample_timeout_ms.unwrap_or(DEFAULT_SAMPLE_TIMEOUT_MS);
    if timeout_ms < interval_ms {
        return Err(format!(
            "sample_timeout_ms ({}) must not be shorter than sample_interval_ms ({})",
            timeout_ms, interval_ms
        )
        .into());
    }

    let cpu_usage_ms = cfg.cpu_usage_interval().as_millis() as u64;
    if cpu_usage_ms == 0 || cpu_usage_ms > MAX_SAMPLE_INTERVAL_MS {
        return Err(format!(
            "cpu_usage_interval_ms must be between 1 and {}, got {}",
            MAX_SAMPLE_INTERVAL_MS, cpu_usage_ms
        )
        .into());
    }

    cfg.baseline_policy()?;

    if let Some(level) = cfg.log_level.as_deref() {
        match level.to_ascii_lowercase().as_str() {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(format!(
                    "Invalid log_level '{}', expected off/error/warn/info/debug/trace",
                    other
                )
                .into());
            }
        }
    }

    for (key, list) in [
        ("include_names", &cfg.include_names),
        ("exclude_names", &cfg.exclude_names),
    ] {
        if list
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n.trim().is_empty()))
        {
            return Err(format!("{} must not contain empty names", key).into());
        }
    }

    if let Some(path) = cfg.test_data_file.as_deref() {
        if !path.is_file() {
            return Err(format!("Test data file not found: {}", path.display()).into());
        }
    }

    Ok(())
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if args.interval_ms.is_some() {
        config.sample_interval_ms = args.interval_ms;
    }
    if args.sample_timeout_ms.is_some() {
        config.sample_timeout_ms = args.sample_timeout_ms;
    }
    if let Some(policy) = &args.baseline_policy {
        config.baseline_policy = Some(policy.clone());
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(test_file) = &args.test_data_file {
        config.test_data_file = Some(test_file.clone());
    }

    if let Some(include_str) = &args.include_names {
        config.include_names = Some(split_names(include_str));
    }
    if let Some(exclude_str) = &args.exclude_names {
        config.exclude_names = Some(split_names(exclude_str));
    }

    if let Some(level) = &args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(format!("Config file not found: {}", p.display()).into());
            }
            p.to_path_buf()
        }
        None => {
            let defaults = [
                "/etc/herakles/sysstats.yaml",
                "/etc/herakles/sysstats.yml",
                "/etc/herakles/sysstats.json",
                "./herakles-sysstats.yaml",
                "./herakles-sysstats.yml",
                "./herakles-sysstats.json",
            ];

            match defaults.iter().map(Path::new).find(|p| p.exists()) {
                Some(p) => p.to_path_buf(),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Serializes configuration in the requested format
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(
    config: &Config,
    format: ConfigFormat,
    user_config: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = render_config(config, &format)?;

    if user_config {
        println!("User configuration (effective values):");
    }
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["herakles-sysstats", "--no-config"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(validate_effective_config(&cfg).is_ok());
        assert_eq!(cfg.sample_interval(), Duration::from_millis(100));
        assert_eq!(cfg.baseline_policy().unwrap(), BaselinePolicy::Suppress);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let cfg = Config {
            sample_interval_ms: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_timeout_below_interval() {
        let cfg = Config {
            sample_interval_ms: Some(500),
            sample_timeout_ms: Some(100),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_cpu_usage_interval() {
        let cfg = Config {
            cpu_usage_interval_ms: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
        assert_eq!(
            Config::default().cpu_usage_interval(),
            Duration::from_millis(150)
        );
    }

    #[test]
    fn test_validate_rejects_unknown_policy() {
        let cfg = Config {
            baseline_policy: Some("guess".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_filter_name() {
        let cfg = Config {
            exclude_names: Some(vec!["kworker".into(), " ".into()]),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let a = args(&[
            "--port",
            "9999",
            "--interval-ms",
            "250",
            "--baseline-policy",
            "zero_baseline",
            "--include-names",
            "nginx, postgres,,",
        ]);
        let cfg = resolve_config(&a).unwrap();

        assert_eq!(cfg.port, Some(9999));
        assert_eq!(cfg.sample_interval(), Duration::from_millis(250));
        assert_eq!(cfg.baseline_policy().unwrap(), BaselinePolicy::ZeroBaseline);
        assert_eq!(
            cfg.include_names,
            Some(vec!["nginx".to_string(), "postgres".to_string()])
        );
    }

    #[test]
    fn test_load_yaml_config_with_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sysstats.yaml");
        fs::write(
            &path,
            "port: 9300\nsample-interval-ms: 200\nbaseline-policy: zero_baseline\n",
        )
        .unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.port, Some(9300));
        assert_eq!(cfg.sample_interval_ms, Some(200));
        // Missing keys fall back at use
        assert_eq!(cfg.sample_timeout(), Duration::from_millis(DEFAULT_SAMPLE_TIMEOUT_MS));
    }

    #[test]
    fn test_load_toml_and_json_config() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("sysstats.toml");
        fs::write(&toml_path, "port = 9301\nexclude_names = [\"kworker\"]\n").unwrap();
        let cfg = load_config(Some(&toml_path)).unwrap();
        assert_eq!(cfg.port, Some(9301));
        assert_eq!(cfg.exclude_names, Some(vec!["kworker".to_string()]));

        let json_path = dir.path().join("sysstats.json");
        fs::write(&json_path, r#"{"port": 9302, "enable_health": false}"#).unwrap();
        let cfg = load_config(Some(&json_path)).unwrap();
        assert_eq!(cfg.port, Some(9302));
        assert_eq!(cfg.enable_health, Some(false));
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        assert!(load_config(Some(Path::new("/nonexistent/sysstats.yaml"))).is_err());
    }

    #[test]
    fn test_render_config_formats() {
        let cfg = Config::default();
        for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
            let out = render_config(&cfg, &format).unwrap();
            assert!(out.contains("9216"));
        }
    }
}
