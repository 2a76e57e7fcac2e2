// ADB module - wrapper around the external adb command-line tool.
// Commands are spawned as child processes and their text output is
// parsed into typed records.

pub mod client;
pub mod config;
pub mod error;
pub mod parse;
pub mod platform;
pub mod process;
pub mod types;


// Re-export the main types for easy access
pub use client::Adb;
pub use config::AdbConfig;
pub use error::{AdbError, AdbResult};
pub use platform::{AdbBinary, Platform, resolve_binary};
pub use process::{CaptureMode, CommandOutput, Invocation, Output, ProcessRunner, SystemRunner};
pub use types::{
    ConnectionState, Device, DeviceProperties, ForegroundActivity, ImageCapture, ProductInfo,
    Target, WmReading,
};
