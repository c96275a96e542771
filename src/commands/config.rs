//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("herakles-sysstats.yaml"),
    };

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Sysstats Configuration
# ===============================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9216                   # HTTP port
#
# Sampling
# --------
# sample_interval_ms: 100      # Delay between the two snapshots (1..10000)
# sample_timeout_ms: 5000      # Upper bound for one pass, >= interval
# baseline_policy: suppress    # suppress | zero_baseline
# proc_root: /proc             # Root of the proc filesystem
# cpu_usage_interval_ms: 150   # Delay between the two /cpu_usage_info readings
# sys_root: /sys               # Root of sysfs (network link speed)
# os_release_path: /etc/os-release
# test_data_file: null         # Replay recorded snapshots from a JSON file
#
# Filtering
# ---------
# include_names: null          # Include only processes whose name contains one of these
# exclude_names: null          # Exclude processes whose name contains one of these
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
# enable_telemetry: true       # Enable /metrics telemetry
#
# Logging
# -------
# log_level: info              # off | error | warn | info | debug | trace

"#;

    format!("{comments}{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_config_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated.yaml");

        command_config(Some(path.clone()), ConfigFormat::Yaml, true).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Herakles Sysstats Configuration"));
        let parsed: Config = serde_yaml::from_str(&content).unwrap();
        assert_eq!(parsed.port, Config::default().port);
    }
}
