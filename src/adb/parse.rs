//! Parsers for adb's line-oriented text output.
//!
//! Everything here is pure: it takes captured lines and returns records,
//! so the formats can be tested without a device attached.

use super::error::{AdbError, AdbResult};
use super::types::{ConnectionState, Device, ForegroundActivity, ProductInfo, WmReading};

pub const DEVICE_LIST_HEADER: &str = "List of devices attached";
pub const PACKAGE_PREFIX: &str = "package:";
pub const FOCUS_MARKER: &str = "mCurrentFocus=Window";
pub const SCREEN_ON_MARKER: &str = "SCREEN_STATE_ON";

fn as_strs<S: AsRef<str>>(lines: &[S]) -> impl Iterator<Item = &str> {
    lines.iter().map(|line| line.as_ref())
}

/// Value of the first `key:value` token with the given key.
fn keyed<'a>(tokens: &[&'a str], key: &str) -> Option<&'a str> {
    tokens.iter().skip(2).find_map(|token| {
        token
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(':'))
    })
}

fn required<'a>(line: &str, tokens: &[&'a str], key: &str) -> AdbResult<&'a str> {
    keyed(tokens, key).ok_or_else(|| AdbError::malformed(line, format!("missing '{key}:' field")))
}

/// Parse one row of `adb devices -l`. Properties are never filled here;
/// the caller extends device/recovery rows with `getprop` lookups.
pub fn parse_device_line(line: &str) -> AdbResult<Device> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(AdbError::malformed(line, "expected serial and state"));
    }
    let state = ConnectionState::from_keyword(tokens[1]);

    if let ConnectionState::Unknown(keyword) = &state {
        return Ok(Device::unknown(keyword));
    }

    if state.has_product_info() {
        if tokens.len() < 6 {
            return Err(AdbError::malformed(
                line,
                format!("'{}' row needs 6 fields, got {}", state, tokens.len()),
            ));
        }
        let product = ProductInfo {
            product: required(line, &tokens, "product")?.to_string(),
            model: required(line, &tokens, "model")?.to_string(),
            device: required(line, &tokens, "device")?.to_string(),
        };
        let transport_id = required(line, &tokens, "transport_id")?.to_string();
        return Ok(Device {
            serial: tokens[0].to_string(),
            state,
            transport_id,
            product: Some(product),
            properties: None,
        });
    }

    // unauthorized / offline
    if tokens.len() < 3 {
        return Err(AdbError::malformed(
            line,
            format!("'{}' row needs 3 fields, got {}", state, tokens.len()),
        ));
    }
    let transport_id = required(line, &tokens, "transport_id")?.to_string();
    Ok(Device {
        serial: tokens[0].to_string(),
        state,
        transport_id,
        product: None,
        properties: None,
    })
}

/// Parse the full `adb devices -l` output. The header, daemon start-up
/// chatter and blank lines are ignored; malformed rows are logged and
/// skipped.
pub fn parse_device_list<S: AsRef<str>>(lines: &[S]) -> Vec<Device> {
    as_strs(lines)
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.starts_with("* ") && line.trim() != DEVICE_LIST_HEADER)
        .filter_map(|line| match parse_device_line(line) {
            Ok(device) => Some(device),
            Err(e) => {
                log::warn!("Skipping device row: {}", e);
                None
            }
        })
        .collect()
}

/// Parse `wm size` / `wm density` output. `metric` is `"size"` or `"density"`.
pub fn parse_wm_reading<S: AsRef<str>>(lines: &[S], metric: &str) -> Option<WmReading> {
    let physical_prefix = format!("Physical {metric}: ");
    let override_prefix = format!("Override {metric}: ");
    let mut physical = None;
    let mut overridden = None;
    for line in as_strs(lines) {
        if let Some(value) = line.strip_prefix(&physical_prefix) {
            physical = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix(&override_prefix) {
            overridden = Some(value.trim().to_string());
        }
    }
    Some(WmReading {
        physical: physical?,
        overridden,
    })
}

/// Path from the first line of `pm path <package>`.
pub fn parse_package_path(first_line: &str) -> Option<String> {
    first_line
        .trim()
        .strip_prefix(PACKAGE_PREFIX)
        .filter(|path| !path.is_empty())
        .map(str::to_string)
}

/// Foreground package/activity from `dumpsys window | grep mCurrentFocus`.
pub fn parse_current_focus<S: AsRef<str>>(lines: &[S]) -> Option<ForegroundActivity> {
    let line = as_strs(lines).find(|line| line.contains(FOCUS_MARKER))?;
    let start = line.find("Window{")? + "Window{".len();
    let end = line.rfind('}')?;
    if end < start {
        return None;
    }
    let component = line[start..end].split(' ').next_back()?;
    let (package, activity) = match component.split_once('/') {
        Some((package, activity)) => (package, Some(activity.to_string())),
        None => (component, None),
    };
    Some(ForegroundActivity {
        package: package.to_string(),
        activity,
    })
}

pub fn parse_screen_on<S: AsRef<str>>(lines: &[S]) -> bool {
    as_strs(lines).any(|line| line.contains(SCREEN_ON_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_row_canonical() {
        let dev =
            parse_device_line("0123456789AB   device   product:foo model:bar device:baz transport_id:3")
                .unwrap();
        assert_eq!(dev.serial, "0123456789AB");
        assert_eq!(dev.state, ConnectionState::Device);
        assert_eq!(dev.transport_id, "3");
        let product = dev.product.unwrap();
        assert_eq!(product.product, "foo");
        assert_eq!(product.model, "bar");
        assert_eq!(product.device, "baz");
        assert!(dev.properties.is_none());
    }

    #[test]
    fn device_row_with_usb_token() {
        let dev = parse_device_line(
            "1d36d8f1               device usb:1-4 product:OnePlus6 model:ONEPLUS_A6000 device:OnePlus6 transport_id:2",
        )
        .unwrap();
        assert_eq!(dev.serial, "1d36d8f1");
        assert_eq!(dev.transport_id, "2");
        assert_eq!(dev.product.unwrap().model, "ONEPLUS_A6000");
    }

    #[test]
    fn offline_row_has_no_product() {
        let dev = parse_device_line("EMULATOR01   offline  transport_id:1").unwrap();
        assert_eq!(dev.serial, "EMULATOR01");
        assert_eq!(dev.state, ConnectionState::Offline);
        assert_eq!(dev.transport_id, "1");
        assert!(dev.product.is_none());
        assert!(dev.properties.is_none());
    }

    #[test]
    fn sideload_and_rescue_rows() {
        for state in ["sideload", "rescue", "recovery"] {
            let line = format!("R58M12 {state} product:a model:b device:c transport_id:9");
            let dev = parse_device_line(&line).unwrap();
            assert_eq!(dev.state.as_str(), state);
            assert_eq!(dev.product.unwrap().device, "c");
        }
    }

    #[test]
    fn unknown_state_is_zero_valued() {
        let dev = parse_device_line("abc bootloader transport_id:4").unwrap();
        assert_eq!(dev, Device::unknown("bootloader"));
        assert!(dev.serial.is_empty());
        assert!(dev.transport_id.is_empty());
    }

    #[test]
    fn short_rows_are_malformed() {
        assert!(parse_device_line("lonely").unwrap_err().is_malformed_line());
        assert!(
            parse_device_line("abc device product:x model:y")
                .unwrap_err()
                .is_malformed_line()
        );
        assert!(parse_device_line("abc offline").unwrap_err().is_malformed_line());
        // Enough tokens, wrong keys
        assert!(
            parse_device_line("abc unauthorized usb:1-1")
                .unwrap_err()
                .is_malformed_line()
        );
    }

    #[test]
    fn device_list_skips_header_blank_and_malformed() {
        let lines = vec![
            "List of devices attached",
            "0123456789AB\tdevice product:foo model:bar device:baz transport_id:3",
            "",
            "broken device",
            "EMULATOR01   offline  transport_id:1",
        ];
        let devices = parse_device_list(&lines);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].serial, "0123456789AB");
        assert_eq!(devices[1].serial, "EMULATOR01");
    }

    #[test]
    fn device_list_ignores_daemon_chatter() {
        let lines = vec![
            "* daemon not running; starting now at tcp:5037",
            "* daemon started successfully",
            "List of devices attached",
            "emulator-5554 device product:sdk model:sdk device:generic transport_id:1",
        ];
        let devices = parse_device_list(&lines);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].serial, "emulator-5554");
    }

    #[test]
    fn empty_device_list() {
        let lines = vec!["List of devices attached"];
        assert!(parse_device_list(&lines).is_empty());
    }

    #[test]
    fn wm_size_physical_only() {
        let reading = parse_wm_reading(&["Physical size: 1080x1920"], "size").unwrap();
        assert_eq!(reading.physical, "1080x1920");
        assert_eq!(reading.values(), vec!["1080x1920"]);
    }

    #[test]
    fn wm_density_with_override() {
        let reading = parse_wm_reading(
            &["Physical density: 420", "Override density: 480"],
            "density",
        )
        .unwrap();
        assert_eq!(reading.values(), vec!["420", "480"]);
    }

    #[test]
    fn wm_without_physical_line() {
        assert!(parse_wm_reading(&["cmd: Can't find service: window"], "size").is_none());
    }

    #[test]
    fn package_path_prefix() {
        assert_eq!(
            parse_package_path("package:/system/app/Settings/Settings.apk").as_deref(),
            Some("/system/app/Settings/Settings.apk")
        );
        assert_eq!(parse_package_path(""), None);
        assert_eq!(parse_package_path("Error: unknown"), None);
    }

    #[test]
    fn current_focus_with_activity() {
        let lines = vec![
            "  mCurrentFocus=Window{a1b2c3 u0 com.android.settings/com.android.settings.Settings}",
        ];
        let focus = parse_current_focus(&lines).unwrap();
        assert_eq!(focus.package, "com.android.settings");
        assert_eq!(focus.activity.as_deref(), Some("com.android.settings.Settings"));
    }

    #[test]
    fn current_focus_without_activity() {
        let lines = vec!["  mCurrentFocus=Window{4f2e u0 StatusBar}"];
        let focus = parse_current_focus(&lines).unwrap();
        assert_eq!(focus.package, "StatusBar");
        assert_eq!(focus.activity, None);
    }

    #[test]
    fn current_focus_null() {
        assert!(parse_current_focus(&["  mCurrentFocus=null"]).is_none());
        let empty: Vec<String> = Vec::new();
        assert!(parse_current_focus(&empty).is_none());
    }

    #[test]
    fn screen_state() {
        assert!(parse_screen_on(&["    screenState=SCREEN_STATE_ON"]));
        assert!(!parse_screen_on(&["    screenState=SCREEN_STATE_OFF"]));
    }
}
