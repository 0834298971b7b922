use crate::domain::color::Rgb;
use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// Status document returned by `GET /status`.
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct DeviceStatus {
    #[serde(rename = "isOn")]
    pub is_on: bool,
    pub intensity: f64,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl DeviceStatus {
    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

impl Display for DeviceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let power = if self.is_on { "on" } else { "off" };
        write!(f, "{}, intensity {}%, color {}", power, (self.intensity * 100.0) as i64, self.rgb().to_hex())
    }
}
