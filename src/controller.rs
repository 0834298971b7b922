use crate::domain::color::ColorChoice;
use crate::domain::events::Event;
use crate::store::ControlState;
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tokio::sync::watch::Receiver as WatchReceiver;

#[derive(Error, Debug, PartialEq)]
pub enum ControllerError {
    #[error("the store is no longer running")]
    StoreClosed,
}

/// Handle the user interface drives the lamp with.
///
/// Every method only queues an intent; the outcome shows up in [`ControlState::status_message`].
#[derive(Debug, Clone)]
pub struct LampController {
    tx: Sender<Event>,
    notifier_rx: WatchReceiver<ControlState>,
}

impl LampController {
    pub fn new(tx: Sender<Event>, notifier_rx: WatchReceiver<ControlState>) -> Self {
        LampController { tx, notifier_rx }
    }

    pub async fn turn_on(&self) -> Result<(), ControllerError> {
        self.send(Event::TurnOn).await
    }

    pub async fn turn_off(&self) -> Result<(), ControllerError> {
        self.send(Event::TurnOff).await
    }

    pub async fn apply_color(&self, choice: ColorChoice) -> Result<(), ControllerError> {
        self.send(Event::ApplyColor(choice)).await
    }

    /// Binds the intensity control. Values are clamped to `0.0..=1.0` and nothing is sent to the lamp.
    pub async fn set_intensity(&self, value: f64) -> Result<(), ControllerError> {
        self.send(Event::SetIntensity(value)).await
    }

    pub async fn apply_intensity(&self, commit: bool) -> Result<(), ControllerError> {
        self.send(Event::ApplyIntensity { commit }).await
    }

    pub fn state(&self) -> ControlState {
        self.notifier_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> WatchReceiver<ControlState> {
        self.notifier_rx.clone()
    }

    async fn send(&self, event: Event) -> Result<(), ControllerError> {
        self.tx.send(event).await.map_err(|_| ControllerError::StoreClosed)
    }
}
