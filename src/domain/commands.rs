use crate::domain::color::Rgb;

/// One outbound command understood by the lamp firmware.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PowerOn,
    PowerOff,
    SetColor(Rgb),
    SetIntensity(f64),
}
