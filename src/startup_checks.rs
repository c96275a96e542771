//! Startup requirement validation for herakles-sysstats.
//!
//! Checks that the proc filesystem is readable before the server starts.
//! Skipped when snapshots are replayed from a test data file.

use nix::unistd::geteuid;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(proc_root: &Path) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges();
    check_system_counters(proc_root)?;
    check_proc_access(proc_root)?;

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check if running with sufficient privileges
fn check_user_privileges() {
    if !geteuid().is_root() {
        warn!("⚠️  Not running as root - start times of some processes may be unreadable");
    } else {
        info!("✅ Running as root (uid=0)");
    }
}

/// The system tick total is mandatory for every sampling pass.
fn check_system_counters(proc_root: &Path) -> Result<(), ValidationError> {
    let stat = proc_root.join("stat");
    match fs::read_to_string(&stat) {
        Ok(content) if content.lines().any(|l| l.starts_with("cpu ")) => {
            info!("✅ {} readable", stat.display());
            Ok(())
        }
        Ok(_) => {
            error!("❌ {} has no aggregate cpu line", stat.display());
            Err(ValidationError::MissingCounters(stat.display().to_string()))
        }
        Err(e) => {
            error!("❌ Cannot read {}: {}", stat.display(), e);
            Err(ValidationError::ProcUnavailable(format!(
                "{}: {}",
                stat.display(),
                e
            )))
        }
    }
}

/// Check per-process stat access using init's entry
fn check_proc_access(proc_root: &Path) -> Result<(), ValidationError> {
    let test_file = proc_root.join("1").join("stat");

    match fs::metadata(&test_file) {
        Ok(_) => {
            info!("✅ {} accessible", test_file.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            error!("❌ Cannot read {} - insufficient permissions", test_file.display());
            error!("   Mount /proc without hidepid or run with CAP_SYS_PTRACE");
            Err(ValidationError::InsufficientPermissions(e.to_string()))
        }
        Err(e) => {
            warn!("⚠️  Could not test process access: {}", e);
            Ok(())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    #[error("Proc filesystem unavailable: {0}")]
    ProcUnavailable(String),

    #[error("No aggregate cpu counters in {0}")]
    MissingCounters(String),
}
