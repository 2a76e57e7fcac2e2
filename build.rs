use std::env;
use std::process::Command;
use time::OffsetDateTime;

// Exposes APP_BUILD_YEAR and APP_VERSION_DISPLAY to `--version`.
fn main() {
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-env-changed=CARGO_PKG_VERSION");

    println!("cargo:rustc-env=APP_BUILD_YEAR={}", build_year());

    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let display = if env::var("PROFILE").as_deref() == Ok("release") {
        version
    } else {
        println!("cargo:rerun-if-changed=.git/HEAD");
        println!("cargo:rerun-if-changed=.git/refs/tags");
        // Untagged debug builds get a -dev suffix
        match exact_git_tag() {
            Some(tag) if tag == format!("v{version}") => version,
            _ => format!("{version}-dev"),
        }
    };
    println!("cargo:rustc-env=APP_VERSION_DISPLAY={display}");
}

/// Year from SOURCE_DATE_EPOCH for reproducible builds, else now.
fn build_year() -> i32 {
    env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(|epoch| OffsetDateTime::from_unix_timestamp(epoch).ok())
        .unwrap_or_else(OffsetDateTime::now_utc)
        .year()
}

fn exact_git_tag() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--exact-match"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|tag| tag.trim().to_string())
}
