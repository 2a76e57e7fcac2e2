use adb_wrap::adb::config::parse_timeout_secs;
use adb_wrap::adb::{Adb, AdbConfig, AdbResult, CaptureMode, Device, Target};
use adb_wrap::args::{Args, Mode};
use log::LevelFilter;

#[tokio::main]
async fn main() {
    let Some(args) = Args::parse() else {
        return;
    };
    init_logging(args.debug_mode);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(2);
        }
    };

    let mut adb = Adb::with_runner(&config, adb_wrap::adb::SystemRunner);
    log::debug!(
        "using {} on {}",
        adb.binary().shell_prefix(),
        adb.platform()
    );
    if args.mode.needs_registry()
        && let Err(e) = adb.initialize().await
    {
        eprintln!("❌ Device listing failed: {e}");
        std::process::exit(1);
    }

    let code = run(&adb, &args).await;
    std::process::exit(code);
}

fn init_logging(debug_mode: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if debug_mode {
        builder.filter(None, LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn build_config(args: &Args) -> AdbResult<AdbConfig> {
    let mut config = AdbConfig::from_env()?;
    if let Some(dir) = &args.adb_dir {
        config.set_adb_dir(&dir.to_string_lossy())?;
    }
    if let Some(raw) = &args.timeout_secs {
        config.timeout = Some(parse_timeout_secs("--timeout", raw)?);
    }
    if args.no_root {
        config.gain_root = false;
    }
    Ok(config)
}

fn print_device(device: &Device) {
    println!(
        "📱 {:<20} {:<13} transport_id:{}",
        device.serial, device.state, device.transport_id
    );
    if let Some(product) = &device.product {
        println!(
            "     product:{} model:{} device:{}",
            product.product, product.model, product.device
        );
    }
    if let Some(props) = &device.properties {
        println!(
            "     manufacturer:{} brand:{} board:{} name:{}",
            props.manufacturer, props.brand, props.board, props.name
        );
    }
}

/// Dispatch the selected mode; returns the process exit code.
async fn run(adb: &Adb, args: &Args) -> i32 {
    let target: &Target = &args.target;
    let ok = |success: bool, what: &str| {
        if success {
            println!("✅ {what}");
            0
        } else {
            println!("❌ {what} failed");
            1
        }
    };

    match &args.mode {
        Mode::Devices => {
            let devices = adb.devices();
            if devices.is_empty() {
                println!("❌ No devices found");
                return 1;
            }
            devices.iter().for_each(print_device);
            0
        }
        Mode::Screenshot(path) => match adb.screenshot(target).await {
            Some(cap) => {
                if let Err(e) = tokio::fs::write(path, &cap.bytes).await {
                    println!("❌ Write failed: {e}");
                    return 1;
                }
                match cap.dimensions() {
                    Ok((w, h)) => println!(
                        "✅ Screenshot {}x{} ({}ms) saved to {}",
                        w,
                        h,
                        cap.duration_ms,
                        path.display()
                    ),
                    Err(e) => println!(
                        "⚠️ Saved {} bytes to {} but could not decode them: {e}",
                        cap.bytes.len(),
                        path.display()
                    ),
                }
                0
            }
            None => {
                println!("❌ Screenshot failed");
                1
            }
        },
        Mode::ScreenSize | Mode::ScreenDensity => {
            let reading = if args.mode == Mode::ScreenSize {
                adb.screen_size(target).await
            } else {
                adb.screen_density(target).await
            };
            match reading {
                Some(reading) => {
                    println!("physical: {}", reading.physical);
                    if let Some(over) = &reading.overridden {
                        println!("override: {over}");
                    }
                    0
                }
                None => {
                    println!("❌ Could not read wm output");
                    1
                }
            }
        }
        Mode::SetScreenSize(value) => ok(
            adb.set_screen_size(target, value).await,
            &format!("Screen size set to {value}"),
        ),
        Mode::SetScreenDensity(value) => ok(
            adb.set_screen_density(target, value).await,
            &format!("Screen density set to {value}"),
        ),
        Mode::Activity => match adb.current_activity(target).await {
            Some(focus) => {
                println!(
                    "{}/{}",
                    focus.package,
                    focus.activity.as_deref().unwrap_or("-")
                );
                0
            }
            None => {
                println!("❌ No focused window");
                1
            }
        },
        Mode::ScreenState => {
            let on = adb.screen_on(target).await;
            println!("screen: {}", if on { "on" } else { "off" });
            0
        }
        Mode::PackagePath(name) => match adb.package_path(target, name).await {
            Some(path) => {
                println!("{path}");
                0
            }
            None => {
                println!("❌ Package '{name}' not found");
                1
            }
        },
        Mode::Prop(key) => match adb.get_prop(target, key).await {
            Some(value) => {
                println!("{value}");
                0
            }
            None => 1,
        },
        Mode::OpenDocuments(path) => ok(
            adb.open_document_ui(target, path.as_deref()).await,
            "Opened Files",
        ),
        Mode::ClearLogcat => match adb.clear_logcat(target).await {
            Ok(out) => ok(out.succeeded(), "Logcat cleared"),
            Err(e) => {
                println!("❌ {e}");
                1
            }
        },
        Mode::StartServer => ok(adb.start_server().await, "Server started"),
        Mode::KillServer => ok(adb.kill_server(args.force).await, "Server stopped"),
        Mode::RestartServer => ok(adb.restart_server(args.force).await, "Server restarted"),
        Mode::Raw(rest) => {
            let mut argv = target.to_args();
            argv.extend(rest.iter().cloned());
            match adb.run_adb(&argv, CaptureMode::Text).await {
                Ok(out) => {
                    for line in out.lines() {
                        println!("{line}");
                    }
                    out.exit_code.unwrap_or(1)
                }
                Err(e) => {
                    println!("❌ {e}");
                    1
                }
            }
        }
    }
}
