//! Check command implementation.
//!
//! Validates system requirements and configuration.

use herakles_sysstats::process::{collect_proc_entries, read_proc_stat};
use herakles_sysstats::system::read_cpu_total;
use herakles_sysstats::SampleContext;

use crate::config::{validate_effective_config, Config};
use crate::state::build_sampler;

/// Validates system requirements and configuration.
pub async fn command_check(
    proc: bool,
    sample: bool,
    all: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Sysstats - System Check");
    println!("===================================");

    let mut all_ok = true;
    let proc_root = config.proc_root();

    // Check /proc filesystem
    if proc || all {
        println!("\n📁 Checking {} filesystem...", proc_root.display());
        if proc_root.is_dir() {
            println!("   ✅ {} accessible", proc_root.display());

            match read_cpu_total(&proc_root) {
                Ok(cpu) => println!("   ✅ System CPU counters readable ({} ticks)", cpu.total()),
                Err(e) => {
                    println!("   ❌ Cannot read system CPU counters: {}", e);
                    all_ok = false;
                }
            }

            match collect_proc_entries(&proc_root, Some(5)) {
                Ok(entries) if entries.is_empty() => {
                    println!("   ❌ Cannot read any process entries");
                    all_ok = false;
                }
                Ok(entries) => {
                    let readable = entries
                        .iter()
                        .filter(|e| read_proc_stat(&e.proc_path).is_ok())
                        .count();
                    println!(
                        "   ✅ Can read {}/{} process stat files",
                        readable,
                        entries.len()
                    );
                }
                Err(e) => {
                    println!("   ❌ Cannot list process entries: {}", e);
                    all_ok = false;
                }
            }
        } else {
            println!("   ❌ {} not found", proc_root.display());
            all_ok = false;
        }
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    // Run one sampling pass
    if sample || all {
        println!("\n⏱️  Running one sampling pass...");
        match build_sampler(config) {
            Ok(sampler) => {
                let ctx = SampleContext::new().with_timeout(config.sample_timeout());
                match sampler.sample(&ctx).await {
                    Ok(rows) => println!("   ✅ Sampled {} processes", rows.len()),
                    Err(e) => {
                        println!("   ❌ Sampling failed: {}", e);
                        all_ok = false;
                    }
                }
            }
            Err(e) => {
                println!("   ❌ Cannot set up sampler: {}", e);
                all_ok = false;
            }
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
