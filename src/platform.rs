//! Platform detection for audio output

use std::fs;
use std::path::{Path, PathBuf};

/// PulseAudio socket WSLg exposes to Linux programs
pub const WSLG_PULSE_PATH: &str = "/mnt/wslg/PulseServer";

/// Detect if running in WSL (Windows Subsystem for Linux)
pub fn is_wsl() -> bool {
    if let Ok(version) = fs::read_to_string("/proc/version") {
        if is_wsl_kernel(&version) {
            return true;
        }
    }

    std::env::var("WSL_DISTRO_NAME").is_ok()
}

/// Check a /proc/version string for a WSL kernel
pub fn is_wsl_kernel(version: &str) -> bool {
    let lower = version.to_lowercase();
    lower.contains("microsoft") || lower.contains("wsl")
}

/// The WSLg PulseAudio server, if this system has one
pub fn wslg_pulse_server() -> Option<PathBuf> {
    let path = Path::new(WSLG_PULSE_PATH);
    path.exists().then(|| path.to_path_buf())
}
