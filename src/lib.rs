pub mod adb;
pub mod args;

pub use adb::{Adb, AdbConfig, AdbError, AdbResult};
