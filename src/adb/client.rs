use super::config::AdbConfig;
use super::error::{AdbError, AdbResult};
use super::parse;
use super::platform::{AdbBinary, Platform, resolve_binary};
use super::process::{CaptureMode, CommandOutput, Invocation, ProcessRunner, SystemRunner};
use super::types::{Device, DeviceProperties, ForegroundActivity, ImageCapture, Target, WmReading};
use std::time::{Duration, Instant};

const DOCUMENTS_UI_ACTIVITY: &str = "com.android.documentsui/.files.FilesActivity";
const EXTERNAL_STORAGE_TREE: &str = "content://com.android.externalstorage.documents/tree/primary:";

/// Device registry and command façade over the `adb` binary.
pub struct Adb<R: ProcessRunner = SystemRunner> {
    binary: AdbBinary,
    platform: Platform,
    timeout: Option<Duration>,
    gain_root: bool,
    runner: R,
    devices: Vec<Device>,
}

impl Adb<SystemRunner> {
    /// Resolve the binary, optionally gain root, and load the device list.
    pub async fn open(config: &AdbConfig) -> AdbResult<Self> {
        let mut adb = Self::with_runner(config, SystemRunner);
        adb.initialize().await?;
        Ok(adb)
    }
}

impl<R: ProcessRunner> Adb<R> {
    /// Build a client without running anything.
    pub fn with_runner(config: &AdbConfig, runner: R) -> Self {
        let binary = resolve_binary(config.platform, config.adb_dir_str().as_deref());
        log::debug!(
            "adb binary for {}: {}",
            config.platform,
            binary.shell_prefix()
        );
        Self {
            binary,
            platform: config.platform,
            timeout: config.timeout,
            gain_root: config.gain_root,
            runner,
            devices: Vec::new(),
        }
    }

    pub async fn initialize(&mut self) -> AdbResult<()> {
        if self.gain_root && !self.root().await {
            log::info!("adb root was not granted, continuing unprivileged");
        }
        self.refresh_devices().await?;
        Ok(())
    }

    pub fn binary(&self) -> &AdbBinary {
        &self.binary
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut R {
        &mut self.runner
    }

    /// Cached device list from the last refresh.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    // ---------------------------------------------------------------
    // Raw invocation
    // ---------------------------------------------------------------

    /// Run `adb <args>` and return its output, whatever the exit code.
    pub async fn run_adb<S: AsRef<str>>(
        &self,
        args: &[S],
        mode: CaptureMode,
    ) -> AdbResult<CommandOutput> {
        let args = args.iter().map(|a| a.as_ref().to_string()).collect();
        self.exec(args, mode).await
    }

    /// Run `adb <args>` and report whether it exited with 0.
    pub async fn run_adb_judge<S: AsRef<str>>(&self, args: &[S]) -> bool {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        self.exec_judge(args).await
    }

    async fn exec(&self, args: Vec<String>, mode: CaptureMode) -> AdbResult<CommandOutput> {
        let invocation =
            Invocation::new(self.binary.program(), args, mode).with_timeout(self.timeout);
        self.runner.run(&invocation).await
    }

    async fn exec_judge(&self, args: Vec<String>) -> bool {
        self.exec_checked(args, CaptureMode::Text).await.is_some()
    }

    /// Output of a successful run; launch errors and non-zero exits are
    /// logged and collapse to `None`.
    async fn exec_checked(&self, args: Vec<String>, mode: CaptureMode) -> Option<CommandOutput> {
        let command = args.join(" ");
        match self.exec(args, mode).await {
            Ok(out) if out.succeeded() => Some(out),
            Ok(out) => {
                log::warn!(
                    "adb {} exited with {:?}: {}",
                    command,
                    out.exit_code,
                    out.first_line().unwrap_or_default()
                );
                None
            }
            Err(e) => {
                log::warn!("adb {} failed: {}", command, e);
                None
            }
        }
    }

    // ---------------------------------------------------------------
    // Device registry
    // ---------------------------------------------------------------

    /// Re-run `devices -l` and replace the cached list.
    ///
    /// A failed `devices -l` clears the cache and returns an error, so an
    /// empty `Ok` slice always means no devices are attached.
    pub async fn refresh_devices(&mut self) -> AdbResult<&[Device]> {
        self.devices.clear();
        let args = vec!["devices".to_string(), "-l".to_string()];
        let out = self.exec(args, CaptureMode::Text).await?;
        if !out.succeeded() {
            return Err(AdbError::CommandFailed {
                command: format!("{} devices -l", self.binary.shell_prefix()),
                exit_code: out.exit_code,
                output: out.joined(),
            });
        }

        let mut devices = parse::parse_device_list(out.lines());
        for device in devices.iter_mut() {
            if device.state.has_properties() {
                let target = device.target();
                device.properties = Some(self.fetch_properties(&target).await);
            }
        }
        log::debug!("{} device(s) attached", devices.len());
        self.devices = devices;
        Ok(&self.devices)
    }

    async fn fetch_properties(&self, target: &Target) -> DeviceProperties {
        DeviceProperties {
            manufacturer: self.prop_or_empty(target, "ro.product.manufacturer").await,
            brand: self.prop_or_empty(target, "ro.product.brand").await,
            board: self.prop_or_empty(target, "ro.product.board").await,
            name: self.prop_or_empty(target, "ro.product.name").await,
        }
    }

    async fn prop_or_empty(&self, target: &Target, key: &str) -> String {
        self.get_prop(target, key).await.unwrap_or_default()
    }

    fn device_args(target: &Target, rest: &[&str]) -> Vec<String> {
        let mut args = target.to_args();
        args.extend(rest.iter().map(|s| s.to_string()));
        args
    }

    async fn shell_lines(&self, target: &Target, rest: &[&str]) -> Option<CommandOutput> {
        self.exec_checked(Self::device_args(target, rest), CaptureMode::Text)
            .await
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// `getprop <key>`, first line of the reply.
    pub async fn get_prop(&self, target: &Target, key: &str) -> Option<String> {
        let out = self.shell_lines(target, &["shell", "getprop", key]).await?;
        Some(out.first_line().unwrap_or_default().to_string())
    }

    pub async fn screen_size(&self, target: &Target) -> Option<WmReading> {
        let out = self.shell_lines(target, &["shell", "wm", "size"]).await?;
        parse::parse_wm_reading(out.lines(), "size")
    }

    pub async fn screen_density(&self, target: &Target) -> Option<WmReading> {
        let out = self.shell_lines(target, &["shell", "wm", "density"]).await?;
        parse::parse_wm_reading(out.lines(), "density")
    }

    /// `wm size <value>`; `"reset"` clears the override.
    pub async fn set_screen_size(&self, target: &Target, value: &str) -> bool {
        self.exec_judge(Self::device_args(target, &["shell", "wm", "size", value]))
            .await
    }

    /// `wm density <value>`; `"reset"` clears the override.
    pub async fn set_screen_density(&self, target: &Target, value: &str) -> bool {
        self.exec_judge(Self::device_args(target, &["shell", "wm", "density", value]))
            .await
    }

    /// PNG screenshot via `exec-out screencap -p`.
    pub async fn screenshot(&self, target: &Target) -> Option<ImageCapture> {
        let start = Instant::now();
        let out = self
            .exec_checked(
                Self::device_args(target, &["exec-out", "screencap", "-p"]),
                CaptureMode::Raw,
            )
            .await?;
        Some(ImageCapture {
            bytes: out.into_bytes(),
            duration_ms: start.elapsed().as_millis(),
        })
    }

    /// Installed APK path of `package`.
    pub async fn package_path(&self, target: &Target, package: &str) -> Option<String> {
        let out = self.shell_lines(target, &["shell", "pm", "path", package]).await?;
        parse::parse_package_path(out.first_line()?)
    }

    /// Package and activity of the focused window.
    pub async fn current_activity(&self, target: &Target) -> Option<ForegroundActivity> {
        let out = self
            .shell_lines(target, &["shell", "dumpsys window | grep mCurrentFocus"])
            .await?;
        parse::parse_current_focus(out.lines())
    }

    /// Whether the display is powered on.
    pub async fn screen_on(&self, target: &Target) -> bool {
        match self
            .shell_lines(target, &["shell", "dumpsys window policy | grep screenState"])
            .await
        {
            Some(out) => parse::parse_screen_on(out.lines()),
            None => false,
        }
    }

    // ---------------------------------------------------------------
    // Actions
    // ---------------------------------------------------------------

    /// `input <kind> <args...>`, e.g. `("tap", &["100", "200"])`.
    pub async fn send_input(
        &self,
        target: &Target,
        kind: &str,
        args: &[&str],
    ) -> AdbResult<CommandOutput> {
        let mut rest = vec!["shell", "input", kind];
        rest.extend_from_slice(args);
        self.exec(Self::device_args(target, &rest), CaptureMode::Text)
            .await
    }

    pub async fn clear_logcat(&self, target: &Target) -> AdbResult<CommandOutput> {
        self.exec(Self::device_args(target, &["logcat", "-c"]), CaptureMode::Text)
            .await
    }

    /// Open the DocumentsUI browser at the storage root, or at
    /// `primary:<path>` on external storage.
    pub async fn open_document_ui(&self, target: &Target, path: Option<&str>) -> bool {
        let uri;
        let mut rest = vec![
            "shell",
            "am",
            "start",
            "-a",
            "android.intent.action.VIEW",
            "-c",
            "android.intent.category.DEFAULT",
            "-t",
        ];
        match path.filter(|p| !p.is_empty()) {
            None => rest.push("vnd.android.document/root"),
            Some(path) => {
                uri = format!("{EXTERNAL_STORAGE_TREE}{path}/document/primary:{path}");
                rest.extend_from_slice(&["vnd.android.document/directory", "-d", uri.as_str()]);
            }
        }
        rest.push(DOCUMENTS_UI_ACTIVITY);
        self.exec_judge(Self::device_args(target, &rest)).await
    }

    // ---------------------------------------------------------------
    // Server lifecycle
    // ---------------------------------------------------------------

    pub async fn root(&self) -> bool {
        self.exec_judge(vec!["root".to_string()]).await
    }

    pub async fn start_server(&self) -> bool {
        log::info!("Starting adb server");
        self.exec_judge(vec!["start-server".to_string()]).await
    }

    /// Stop the adb server. `force` kills the process by name on Windows;
    /// elsewhere it falls back to `kill-server`.
    pub async fn kill_server(&self, force: bool) -> bool {
        if force {
            if self.platform == Platform::Windows {
                log::info!("Force killing {}", self.binary.file_name());
                let invocation = Invocation::new(
                    "taskkill",
                    vec![
                        "/f".to_string(),
                        "/im".to_string(),
                        self.binary.file_name().to_string(),
                    ],
                    CaptureMode::Text,
                )
                .with_timeout(self.timeout);
                return match self.runner.run(&invocation).await {
                    Ok(out) => out.succeeded(),
                    Err(e) => {
                        log::warn!("taskkill failed: {}", e);
                        false
                    }
                };
            }
            log::warn!(
                "Force termination is not implemented on {}, falling back to kill-server",
                self.platform
            );
        }
        log::info!("Stopping adb server");
        self.exec_judge(vec!["kill-server".to_string()]).await
    }

    pub async fn restart_server(&self, force: bool) -> bool {
        self.kill_server(force).await;
        self.start_server().await
    }
}
