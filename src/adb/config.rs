//! Configuration for the adb wrapper

use super::error::{AdbError, AdbResult};
use super::platform::Platform;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_ADB_DIR: &str = "ADB_DIR";
pub const ENV_ADB_PLATFORM: &str = "ADB_PLATFORM";
pub const ENV_ADB_TIMEOUT_SECS: &str = "ADB_TIMEOUT_SECS";
pub const ENV_ADB_NO_ROOT: &str = "ADB_NO_ROOT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdbConfig {
    /// Directory holding the adb binary; `None` searches PATH
    pub adb_dir: Option<PathBuf>,
    /// Host platform used to pick the binary name
    pub platform: Platform,
    /// Per-call deadline; `None` waits for adb indefinitely
    pub timeout: Option<Duration>,
    /// Issue `adb root` when the client initializes
    pub gain_root: bool,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            adb_dir: None,
            platform: Platform::current(),
            timeout: None,
            gain_root: true,
        }
    }
}

impl AdbConfig {
    /// Defaults overridden by `ADB_DIR`, `ADB_PLATFORM`, `ADB_TIMEOUT_SECS`
    /// and `ADB_NO_ROOT`.
    pub fn from_env() -> AdbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AdbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_ADB_DIR) {
            config.set_adb_dir(&dir)?;
        }
        if let Some(family) = lookup(ENV_ADB_PLATFORM) {
            config.platform = Platform::from_os_family(&family);
        }
        if let Some(raw) = lookup(ENV_ADB_TIMEOUT_SECS) {
            config.timeout = Some(parse_timeout_secs(ENV_ADB_TIMEOUT_SECS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_ADB_NO_ROOT) {
            config.gain_root = !matches!(raw.trim(), "1" | "true" | "yes");
        }
        Ok(config)
    }

    /// Set the adb directory, expanding a leading `~`. Blank input clears it.
    pub fn set_adb_dir(&mut self, dir: &str) -> AdbResult<()> {
        let dir = dir.trim();
        self.adb_dir = if dir.is_empty() {
            None
        } else {
            Some(expand_home(dir)?)
        };
        Ok(())
    }

    /// Directory as a string for the binary resolver.
    pub fn adb_dir_str(&self) -> Option<String> {
        self.adb_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned())
    }
}

/// Parse a positive whole number of seconds.
pub fn parse_timeout_secs(key: &str, raw: &str) -> AdbResult<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(AdbError::InvalidConfig {
            key: key.to_string(),
            value: raw.to_string(),
            reason: "expected a positive number of seconds".to_string(),
        }),
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> AdbResult<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return Ok(PathBuf::from(path)),
    };
    let home = homedir::my_home()
        .ok()
        .flatten()
        .ok_or(AdbError::HomeDirectoryNotFound)?;
    let rest = rest.trim_start_matches(['/', '\\']);
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}
