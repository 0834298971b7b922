use crate::domain::color::ColorChoice;

/// User intents delivered to the store.
#[derive(Debug)]
pub enum Event {
    TurnOn,
    TurnOff,
    ApplyColor(ColorChoice),
    /// Continuous binding of the intensity control, never sent to the lamp by itself.
    SetIntensity(f64),
    /// Sends the current intensity when `commit` is set, i.e. once the control is released.
    ApplyIntensity { commit: bool },
}
