//! Per-processor details from `<proc>/cpuinfo`.

use serde::Serialize;
use std::fs;
use std::path::Path;

/// One logical processor block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CpuInfo {
    pub processor: u32,
    pub vendor_id: Option<String>,
    pub cpu_family: Option<String>,
    pub model: Option<String>,
    pub model_name: Option<String>,
    pub cpu_mhz: Option<f64>,
    pub cache_size: Option<String>,
}

/// Parses `/proc/cpuinfo` content into one entry per `processor` block.
///
/// Blocks are separated by blank lines. Keys are matched exactly, so
/// `model` and `model name` stay distinct. Architectures that omit a key
/// leave the field `None`.
pub fn parse_cpuinfo(content: &str) -> Vec<CpuInfo> {
    let mut cpus = Vec::new();
    let mut current: Option<CpuInfo> = None;

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            if line.trim().is_empty() {
                cpus.extend(current.take());
            }
            continue;
        };
        let value = value.trim();
        let text = || (!value.is_empty()).then(|| value.to_string());

        match key.trim() {
            "processor" => {
                cpus.extend(current.take());
                current = value.parse().ok().map(|processor| CpuInfo {
                    processor,
                    ..CpuInfo::default()
                });
            }
            key => {
                let Some(cpu) = current.as_mut() else {
                    continue;
                };
                match key {
                    "vendor_id" => cpu.vendor_id = text(),
                    "cpu family" => cpu.cpu_family = text(),
                    "model" => cpu.model = text(),
                    "model name" => cpu.model_name = text(),
                    "cpu MHz" => cpu.cpu_mhz = value.parse().ok(),
                    "cache size" => cpu.cache_size = text(),
                    _ => {}
                }
            }
        }
    }

    cpus.extend(current);
    cpus
}

/// Reads processor details from `<proc_root>/cpuinfo`.
pub fn read_cpu_info(proc_root: &Path) -> Result<Vec<CpuInfo>, String> {
    let path = proc_root.join("cpuinfo");
    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(parse_cpuinfo(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    const X86: &str = "\
processor\t: 0
vendor_id\t: GenuineIntel
cpu family\t: 6
model\t\t: 142
model name\t: Intel(R) Core(TM) i7-8565U CPU @ 1.80GHz
cpu MHz\t\t: 1992.002
cache size\t: 8192 KB

processor\t: 1
vendor_id\t: GenuineIntel
cpu family\t: 6
model\t\t: 142
model name\t: Intel(R) Core(TM) i7-8565U CPU @ 1.80GHz
cpu MHz\t\t: 2100.000
cache size\t: 8192 KB
";

    #[test]
    fn test_parse_cpuinfo_x86() {
        let cpus = parse_cpuinfo(X86);
        assert_eq!(cpus.len(), 2);

        let cpu = &cpus[1];
        assert_eq!(cpu.processor, 1);
        assert_eq!(cpu.vendor_id.as_deref(), Some("GenuineIntel"));
        assert_eq!(cpu.cpu_family.as_deref(), Some("6"));
        assert_eq!(cpu.model.as_deref(), Some("142"));
        assert_eq!(
            cpu.model_name.as_deref(),
            Some("Intel(R) Core(TM) i7-8565U CPU @ 1.80GHz")
        );
        assert_eq!(cpu.cpu_mhz, Some(2100.0));
        assert_eq!(cpu.cache_size.as_deref(), Some("8192 KB"));
    }

    #[test]
    fn test_parse_cpuinfo_without_optional_keys() {
        let cpus = parse_cpuinfo("processor : 0\nBogoMIPS : 50.00\nCPU implementer : 0x41\n\nHardware : BCM2835\n");
        assert_eq!(cpus.len(), 1);
        assert_eq!(cpus[0].processor, 0);
        assert_eq!(cpus[0].cpu_mhz, None);
        assert_eq!(cpus[0].model_name, None);
    }

    #[test]
    fn test_read_cpu_info_missing() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        assert!(read_cpu_info(dir.path()).is_err());
    }
}
