use crate::adb::Target;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_SCREENSHOT_PATH: &str = "cli-screenshot.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Devices,
    Screenshot(PathBuf),
    ScreenSize,
    ScreenDensity,
    SetScreenSize(String),
    SetScreenDensity(String),
    Activity,
    ScreenState,
    PackagePath(String),
    Prop(String),
    OpenDocuments(Option<String>),
    ClearLogcat,
    StartServer,
    KillServer,
    RestartServer,
    Raw(Vec<String>),
}

impl Mode {
    /// Server control talks to the host adb only; everything else needs the
    /// device registry loaded first.
    pub fn needs_registry(&self) -> bool {
        !matches!(
            self,
            Mode::StartServer | Mode::KillServer | Mode::RestartServer | Mode::Raw(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub mode: Mode,
    pub adb_dir: Option<PathBuf>,
    pub timeout_secs: Option<String>,
    pub target: Target,
    pub force: bool,
    pub no_root: bool,
    pub debug_mode: bool,
}

impl Args {
    pub fn parse() -> Option<Self> {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse flags (without the program name). Prints help or an error and
    /// returns `None` when the program should exit.
    pub fn parse_from<I: IntoIterator<Item = String>>(args: I) -> Option<Self> {
        let mut mode: Option<Mode> = None;
        let mut adb_dir: Option<PathBuf> = None;
        let mut timeout_secs: Option<String> = None;
        let mut target = Target::Any;
        let mut force = false;
        let mut no_root = false;
        let mut debug_mode = false;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--help" || arg == "-h" {
                print_help();
                return None;
            } else if arg == "--version" || arg == "-v" {
                println!(
                    "adb-wrap v{} (built {})",
                    env!("APP_VERSION_DISPLAY"),
                    env!("APP_BUILD_YEAR")
                );
                return None;
            } else if arg == "--" {
                mode = Some(Mode::Raw(args.by_ref().collect()));
            } else if arg == "--debug" {
                debug_mode = true;
            } else if arg == "--force" {
                force = true;
            } else if arg == "--no-root" {
                no_root = true;
            } else if arg == "--devices" {
                mode = Some(Mode::Devices);
            } else if arg == "--screenshot" || arg == "-s" {
                mode = Some(Mode::Screenshot(PathBuf::from(DEFAULT_SCREENSHOT_PATH)));
            } else if let Some(path) = arg.strip_prefix("--screenshot=") {
                mode = Some(Mode::Screenshot(PathBuf::from(path)));
            } else if arg == "--size" {
                mode = Some(Mode::ScreenSize);
            } else if arg == "--density" {
                mode = Some(Mode::ScreenDensity);
            } else if let Some(value) = arg.strip_prefix("--set-size=") {
                mode = Some(Mode::SetScreenSize(value.to_string()));
            } else if let Some(value) = arg.strip_prefix("--set-density=") {
                mode = Some(Mode::SetScreenDensity(value.to_string()));
            } else if arg == "--activity" {
                mode = Some(Mode::Activity);
            } else if arg == "--screen-state" {
                mode = Some(Mode::ScreenState);
            } else if let Some(name) = arg.strip_prefix("--package=") {
                mode = Some(Mode::PackagePath(name.to_string()));
            } else if let Some(key) = arg.strip_prefix("--prop=") {
                mode = Some(Mode::Prop(key.to_string()));
            } else if arg == "--open-docs" {
                mode = Some(Mode::OpenDocuments(None));
            } else if let Some(path) = arg.strip_prefix("--open-docs=") {
                mode = Some(Mode::OpenDocuments(Some(path.to_string())));
            } else if arg == "--clear-logcat" {
                mode = Some(Mode::ClearLogcat);
            } else if arg == "--start-server" {
                mode = Some(Mode::StartServer);
            } else if arg == "--kill-server" {
                mode = Some(Mode::KillServer);
            } else if arg == "--restart-server" {
                mode = Some(Mode::RestartServer);
            } else if let Some(dir) = arg.strip_prefix("--adb-dir=") {
                adb_dir = Some(PathBuf::from(dir));
            } else if let Some(val) = arg.strip_prefix("--timeout=") {
                timeout_secs = Some(val.to_string());
            } else if let Some(serial) = arg.strip_prefix("--serial=") {
                target = Target::Serial(serial.to_string());
            } else if let Some(id) = arg.strip_prefix("--transport=") {
                target = Target::Transport(id.to_string());
            } else {
                eprintln!("❌ Unknown argument: {}", arg);
                print_help();
                return None;
            }
        }

        Some(Args {
            mode: mode.unwrap_or(Mode::Devices),
            adb_dir,
            timeout_secs,
            target,
            force,
            no_root,
            debug_mode,
        })
    }
}

fn print_help() {
    println!("🤖 adb-wrap: thin wrapper around the adb tool");
    println!();
    println!("USAGE:");
    println!("    adb-wrap [FLAGS] [-- ADB_ARGS...]");
    println!();
    println!("MODES:");
    println!("    (no flags), --devices    List attached devices");
    println!("    --screenshot[=PATH], -s  Save a PNG screenshot (default {DEFAULT_SCREENSHOT_PATH})");
    println!("    --size, --density        Show screen size / density");
    println!("    --set-size=VALUE         Override screen size (WxH or 'reset')");
    println!("    --set-density=VALUE      Override screen density (N or 'reset')");
    println!("    --activity               Show the focused package/activity");
    println!("    --screen-state           Show whether the screen is on");
    println!("    --package=NAME           Show the APK path of a package");
    println!("    --prop=KEY               Read a system property");
    println!("    --open-docs[=PATH]       Open the Files app (optionally at PATH)");
    println!("    --clear-logcat           Clear the logcat buffer");
    println!("    --start-server           Start the adb server");
    println!("    --kill-server            Stop the adb server");
    println!("    --restart-server         Restart the adb server");
    println!("    -- ADB_ARGS...           Run adb with the given arguments");
    println!();
    println!("OPTIONS:");
    println!("    --adb-dir=DIR            Directory containing the adb binary");
    println!("    --timeout=N              Give up on an adb call after N seconds");
    println!("    --serial=S               Address the device with serial S");
    println!("    --transport=ID           Address the device with transport id ID");
    println!("    --force                  Force kill the server (Windows only)");
    println!("    --no-root                Do not run 'adb root' first");
    println!("    --debug                  Enable debug logging");
    println!("    --help, -h               Show this help message");
    println!("    --version, -v            Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    adb-wrap");
    println!("    adb-wrap --screenshot=shot.png --serial=emulator-5554");
    println!("    adb-wrap --restart-server --force");
    println!("    adb-wrap -- shell getprop ro.build.version.release");
}
