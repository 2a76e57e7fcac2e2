// Core adb record types
use super::error::AdbResult;
use serde::Serialize;
use std::fmt;

/// Connection state reported in the second column of `adb devices -l`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Device,
    Recovery,
    Sideload,
    Rescue,
    Unauthorized,
    Offline,
    Unknown(String),
}

impl ConnectionState {
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "device" => ConnectionState::Device,
            "recovery" => ConnectionState::Recovery,
            "sideload" => ConnectionState::Sideload,
            "rescue" => ConnectionState::Rescue,
            "unauthorized" => ConnectionState::Unauthorized,
            "offline" => ConnectionState::Offline,
            other => ConnectionState::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ConnectionState::Device => "device",
            ConnectionState::Recovery => "recovery",
            ConnectionState::Sideload => "sideload",
            ConnectionState::Rescue => "rescue",
            ConnectionState::Unauthorized => "unauthorized",
            ConnectionState::Offline => "offline",
            ConnectionState::Unknown(keyword) => keyword,
        }
    }

    /// States where adb reports product/model/device.
    pub fn has_product_info(&self) -> bool {
        matches!(
            self,
            ConnectionState::Device
                | ConnectionState::Recovery
                | ConnectionState::Sideload
                | ConnectionState::Rescue
        )
    }

    /// States where the device answers `getprop`.
    pub fn has_properties(&self) -> bool {
        matches!(self, ConnectionState::Device | ConnectionState::Recovery)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductInfo {
    pub product: String,
    pub model: String,
    pub device: String,
}

/// Properties read from the device with `getprop`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceProperties {
    pub manufacturer: String,
    pub brand: String,
    pub board: String,
    pub name: String,
}

/// One row of `adb devices -l`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub serial: String,
    pub state: ConnectionState,
    pub transport_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<DeviceProperties>,
}

impl Device {
    /// Placeholder record for a state keyword this crate does not know.
    pub fn unknown(keyword: &str) -> Self {
        Self {
            serial: String::new(),
            state: ConnectionState::Unknown(keyword.to_string()),
            transport_id: String::new(),
            product: None,
            properties: None,
        }
    }

    /// Address this device by its transport id.
    pub fn target(&self) -> Target {
        Target::Transport(self.transport_id.clone())
    }
}

/// Which device a command is sent to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Target {
    /// No selector; adb picks the only attached device.
    #[default]
    Any,
    Serial(String),
    Transport(String),
}

impl Target {
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Target::Any => Vec::new(),
            Target::Serial(serial) => vec!["-s".to_string(), serial.clone()],
            Target::Transport(id) => vec!["-t".to_string(), id.clone()],
        }
    }
}

/// Result of `wm size` or `wm density`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WmReading {
    pub physical: String,
    pub overridden: Option<String>,
}

impl WmReading {
    /// Physical value, followed by the override when one is active.
    pub fn values(&self) -> Vec<&str> {
        let mut values = vec![self.physical.as_str()];
        if let Some(over) = &self.overridden {
            values.push(over.as_str());
        }
        values
    }

    /// Value currently in effect on the device.
    pub fn effective(&self) -> &str {
        self.overridden.as_deref().unwrap_or(self.physical.as_str())
    }

    /// Parse an effective `WxH` size.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let (x, y) = self.effective().trim().split_once('x')?;
        Some((x.parse().ok()?, y.parse().ok()?))
    }
}

/// Package and activity holding window focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForegroundActivity {
    pub package: String,
    pub activity: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageCapture {
    pub bytes: Vec<u8>,
    pub duration_ms: u128,
}

impl ImageCapture {
    pub fn is_png(&self) -> bool {
        self.bytes.starts_with(b"\x89PNG\r\n\x1a\n")
    }

    pub fn dimensions(&self) -> AdbResult<(u32, u32)> {
        let img = image::load_from_memory(&self.bytes)?;
        Ok((img.width(), img.height()))
    }
}
