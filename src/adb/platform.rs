// Host platform detection and adb binary resolution
use serde::Serialize;
use std::fmt;

pub const BIN_LINUX: &str = "adb";
pub const BIN_DARWIN: &str = "adb-darwin";
pub const BIN_WINDOWS: &str = "adb.exe";

/// Host OS family, resolved once and passed around as a value so that
/// binary selection stays a pure function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Darwin,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Darwin
        } else {
            Platform::Linux
        }
    }

    /// Map an OS family name to a platform. Anything unrecognised is
    /// treated as Linux.
    pub fn from_os_family(family: &str) -> Self {
        match family.trim().to_ascii_lowercase().as_str() {
            "windows" => Platform::Windows,
            "darwin" | "macos" => Platform::Darwin,
            _ => Platform::Linux,
        }
    }

    pub fn binary_name(self) -> &'static str {
        match self {
            Platform::Windows => BIN_WINDOWS,
            Platform::Darwin => BIN_DARWIN,
            Platform::Linux => BIN_LINUX,
        }
    }

    pub fn separator(self) -> char {
        match self {
            Platform::Windows => '\\',
            _ => '/',
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => write!(f, "Windows"),
            Platform::Darwin => write!(f, "Darwin"),
            Platform::Linux => write!(f, "Linux"),
        }
    }
}

/// The adb executable a client spawns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdbBinary {
    program: String,
    file_name: &'static str,
    in_base_dir: bool,
}

impl AdbBinary {
    /// Path handed to the process launcher.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Bare executable name, used for kill-by-name.
    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    /// Command prefix suitable for embedding in a shell line. Paths under a
    /// user supplied directory are double quoted.
    pub fn shell_prefix(&self) -> String {
        if self.in_base_dir {
            format!("\"{}\"", self.program)
        } else {
            self.program.clone()
        }
    }
}

/// Pick the adb executable for `platform`, optionally placed under `base_dir`.
pub fn resolve_binary(platform: Platform, base_dir: Option<&str>) -> AdbBinary {
    let file_name = platform.binary_name();
    match base_dir.filter(|dir| !dir.is_empty()) {
        Some(dir) => {
            let sep = platform.separator();
            let mut program = dir.to_string();
            if !program.ends_with(sep) {
                program.push(sep);
            }
            program.push_str(file_name);
            AdbBinary {
                program,
                file_name,
                in_base_dir: true,
            }
        }
        None => AdbBinary {
            program: file_name.to_string(),
            file_name,
            in_base_dir: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_name_per_platform() {
        assert_eq!(resolve_binary(Platform::Windows, None).program(), "adb.exe");
        assert_eq!(resolve_binary(Platform::Darwin, None).program(), "adb-darwin");
        assert_eq!(resolve_binary(Platform::Linux, None).program(), "adb");
    }

    #[test]
    fn unknown_family_defaults_to_linux() {
        assert_eq!(Platform::from_os_family("FreeBSD"), Platform::Linux);
        assert_eq!(Platform::from_os_family(""), Platform::Linux);
        assert_eq!(Platform::from_os_family("Darwin"), Platform::Darwin);
        assert_eq!(Platform::from_os_family("macos"), Platform::Darwin);
        assert_eq!(Platform::from_os_family("Windows"), Platform::Windows);
    }

    #[test]
    fn base_dir_gets_separator_and_quotes() {
        let bin = resolve_binary(Platform::Linux, Some("/opt/platform-tools"));
        assert_eq!(bin.program(), "/opt/platform-tools/adb");
        assert_eq!(bin.shell_prefix(), "\"/opt/platform-tools/adb\"");

        let bin = resolve_binary(Platform::Linux, Some("/opt/platform-tools/"));
        assert_eq!(bin.program(), "/opt/platform-tools/adb");
    }

    #[test]
    fn windows_base_dir_uses_backslash() {
        let bin = resolve_binary(Platform::Windows, Some(r"C:\Android\platform-tools"));
        assert_eq!(bin.program(), r"C:\Android\platform-tools\adb.exe");
        assert_eq!(bin.file_name(), "adb.exe");
        assert_eq!(bin.shell_prefix(), "\"C:\\Android\\platform-tools\\adb.exe\"");
    }

    #[test]
    fn no_base_dir_is_unquoted() {
        let bin = resolve_binary(Platform::Darwin, Some(""));
        assert_eq!(bin.shell_prefix(), "adb-darwin");
    }
}
