use crate::device::{Transport, TransportError};
use crate::domain::color::ColorChoice;
use crate::domain::commands::Command;
use crate::domain::events::Event;
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::watch::{self, Receiver as WatchReceiver, Sender as WatchSender};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_INTENSITY: f64 = 0.6;
const COMPLETION_BUFFER_SIZE: usize = 16;

/// Everything the user interface observes. Only the [`Store`] changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    intensity: f64,
    selected_color: ColorChoice,
    busy: bool,
    status_message: String,
}

impl ControlState {
    pub fn new(selected_color: ColorChoice) -> Self {
        ControlState {
            intensity: DEFAULT_INTENSITY,
            selected_color,
            busy: false,
            status_message: "Ready".to_string(),
        }
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn selected_color(&self) -> &ColorChoice {
        &self.selected_color
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }
}

#[derive(Debug)]
struct Completion {
    request_id: u64,
    label: String,
    result: Result<(), TransportError>,
}

/// Owns the [`ControlState`] and turns intents into requests.
///
/// Requests run in their own tasks and report back over a private channel, so all state changes happen inside
/// [`Store::listen`]. Overlapping requests are not serialized: whichever completes last decides the final status.
#[derive(Debug)]
pub struct Store {
    state: ControlState,
    transport: Arc<dyn Transport>,
    rx: Receiver<Event>,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    notifier_tx: WatchSender<ControlState>,
    last_request_id: u64,
    in_flight: usize,
}

impl Store {
    pub fn new(rx: Receiver<Event>, transport: Arc<dyn Transport>, selected_color: ColorChoice) -> Self {
        let state = ControlState::new(selected_color);
        let (completion_tx, completion_rx) = mpsc::channel(COMPLETION_BUFFER_SIZE);
        let (notifier_tx, _) = watch::channel(state.clone());

        Store {
            state,
            transport,
            rx,
            completion_tx,
            completion_rx,
            notifier_tx,
            last_request_id: 0,
            in_flight: 0,
        }
    }

    pub fn notifier(&self) -> WatchReceiver<ControlState> {
        self.notifier_tx.subscribe()
    }

    /// Runs until every sender of intents is dropped and every request already issued has completed.
    #[instrument(skip(self))]
    pub async fn listen(&mut self) {
        let mut accepting = true;

        while accepting || self.in_flight > 0 {
            tokio::select! {
                event = self.rx.recv(), if accepting => match event {
                    Some(event) => {
                        debug!("🔵 Received event: {:?}", event);
                        self.handle_event(event);
                    }
                    None => {
                        accepting = false;
                        if self.in_flight > 0 {
                            info!(in_flight = self.in_flight, "🔵 No controllers left, waiting for {} request(s)...", self.in_flight);
                        }
                    }
                },
                Some(completion) = self.completion_rx.recv() => self.complete(completion),
                else => break,
            }
        }
        info!("🔵 No controllers left, stopping the store");
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::TurnOn => self.begin("Power On".to_string(), Command::PowerOn),
            Event::TurnOff => self.begin("Power Off".to_string(), Command::PowerOff),
            Event::ApplyColor(choice) => {
                debug!(color_id = %choice.id(), "🎨 Selected color '{}' {}", choice.name(), choice.rgb());
                let label = format!("Color {}", choice.name());
                let command = Command::SetColor(choice.rgb());
                self.state.selected_color = choice;
                self.begin(label, command);
            }
            Event::SetIntensity(value) => {
                if value.is_nan() {
                    warn!("⚠️ Ignoring intensity that is not a number");
                    return;
                }

                let intensity = value.clamp(0.0, 1.0);
                if intensity != self.state.intensity {
                    self.state.intensity = intensity;
                    self.publish();
                }
            }
            Event::ApplyIntensity { commit: false } => {}
            Event::ApplyIntensity { commit: true } => {
                let intensity = self.state.intensity;
                let percent = (intensity * 100.0) as i64;
                self.begin(format!("Intensity {}%", percent), Command::SetIntensity(intensity));
            }
        }
    }

    fn begin(&mut self, label: String, command: Command) {
        self.last_request_id += 1;
        let request_id = self.last_request_id;

        if self.state.busy {
            debug!(request_id, "A request is still in flight, the last one to complete sets the status");
        }

        self.in_flight += 1;
        self.state.busy = true;
        self.state.status_message = format!("Sending {}...", label.to_lowercase());
        self.publish();
        info!(request_id, ?command, "🟡 Sending {}...", label.to_lowercase());

        let transport = self.transport.clone();
        let completion_tx = self.completion_tx.downgrade();
        tokio::spawn(async move {
            let result = transport.send(&command).await;

            // The store may have been dropped while the request was in flight
            let Some(completion_tx) = completion_tx.upgrade() else {
                debug!(request_id, "Store is gone, dropping the result of '{}'", label);
                return;
            };
            completion_tx.send(Completion { request_id, label, result }).await.unwrap_or_default();
        });
    }

    fn complete(&mut self, completion: Completion) {
        let Completion { request_id, label, result } = completion;
        self.in_flight = self.in_flight.saturating_sub(1);

        self.state.status_message = match result {
            Ok(()) => {
                info!(request_id, "🟢 {} sent", label);
                format!("{} sent", label)
            }
            Err(e) => {
                warn!(request_id, "⚠️ Failed to send {}: {}", label.to_lowercase(), e);
                format!("Failed to send {}: {}", label.to_lowercase(), e)
            }
        };
        self.state.busy = false;
        self.publish();
    }

    fn publish(&self) {
        self.notifier_tx.send_replace(self.state.clone());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::color::{ColorCatalog, Rgb};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    type Gate = oneshot::Sender<Result<(), TransportError>>;

    /// Records every command and either answers right away or waits for a gate opened by the test.
    #[derive(Debug, Default)]
    pub(crate) struct FakeTransport {
        failing: bool,
        calls: Mutex<Vec<String>>,
        gates: Mutex<HashMap<String, oneshot::Receiver<Result<(), TransportError>>>>,
    }

    impl FakeTransport {
        pub(crate) fn succeeding() -> Arc<Self> {
            Arc::new(FakeTransport::default())
        }

        pub(crate) fn failing() -> Arc<Self> {
            Arc::new(FakeTransport {
                failing: true,
                ..FakeTransport::default()
            })
        }

        pub(crate) fn gate(&self, path: &str, body: Option<Value>) -> Gate {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(key(path, &body), rx);
            tx
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn key(path: &str, body: &Option<Value>) -> String {
        match body {
            Some(body) => format!("{} {}", path, body),
            None => path.to_string(),
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send_command(&self, path: &str, body: Option<Value>) -> Result<(), TransportError> {
            let key = key(path, &body);
            self.calls.lock().unwrap().push(key.clone());

            let gate = self.gates.lock().unwrap().remove(&key);
            if let Some(gate) = gate {
                return gate.await.unwrap_or(Err(TransportError::Timeout));
            }

            if self.failing { Err(TransportError::Timeout) } else { Ok(()) }
        }
    }

    fn store_with(transport: Arc<FakeTransport>) -> (Store, Sender<Event>) {
        let (tx, rx) = mpsc::channel(8);
        let store = Store::new(rx, transport, ColorCatalog::presets().default_choice().clone());
        (store, tx)
    }

    async fn next_completion(store: &mut Store) -> Completion {
        store.completion_rx.recv().await.expect("the store keeps a sender alive")
    }

    #[test]
    fn starts_ready() {
        let state = ControlState::new(ColorCatalog::presets().default_choice().clone());

        assert_eq!(state.intensity(), 0.6);
        assert_eq!(state.selected_color().name(), "Warm");
        assert!(!state.busy());
        assert_eq!(state.status_message(), "Ready");
    }

    #[tokio::test]
    async fn turn_on_succeeds() {
        let transport = FakeTransport::succeeding();
        let (mut store, _tx) = store_with(transport.clone());

        store.handle_event(Event::TurnOn);
        assert!(store.state.busy());
        assert_eq!(store.state.status_message(), "Sending power on...");

        let completion = next_completion(&mut store).await;
        store.complete(completion);

        assert!(!store.state.busy());
        assert_eq!(store.state.status_message(), "Power On sent");
        assert_eq!(transport.calls(), vec!["on"]);
    }

    #[tokio::test]
    async fn turn_off_reports_the_failure() {
        let (mut store, _tx) = store_with(FakeTransport::failing());

        store.handle_event(Event::TurnOff);
        let completion = next_completion(&mut store).await;
        store.complete(completion);

        assert!(!store.state.busy());
        assert_eq!(store.state.status_message(), "Failed to send power off: timeout");
    }

    #[rstest]
    #[case::success(FakeTransport::succeeding())]
    #[case::failure(FakeTransport::failing())]
    #[tokio::test]
    async fn busy_toggles_once_per_invocation(#[case] transport: Arc<FakeTransport>) {
        let (mut store, _tx) = store_with(transport);
        let mut notifier = store.notifier();

        store.handle_event(Event::ApplyIntensity { commit: true });
        assert!(notifier.has_changed().unwrap());
        assert!(notifier.borrow_and_update().busy());

        let completion = next_completion(&mut store).await;
        store.complete(completion);
        assert!(notifier.has_changed().unwrap());
        assert!(!notifier.borrow_and_update().busy());

        assert!(store.completion_rx.try_recv().is_err());
        assert!(!notifier.has_changed().unwrap());
    }

    #[tokio::test]
    async fn apply_color_selects_the_color_before_the_lamp_answers() {
        let transport = FakeTransport::succeeding();
        let gate = transport.gate("color", Some(json!({ "r": 170, "g": 210, "b": 255 })));
        let (mut store, _tx) = store_with(transport.clone());
        let cool = ColorChoice::new("Cool", Rgb::new(170, 210, 255));

        store.handle_event(Event::ApplyColor(cool.clone()));

        assert_eq!(store.state.selected_color(), &cool);
        assert_eq!(store.state.status_message(), "Sending color cool...");
        assert!(store.state.busy());

        gate.send(Ok(())).unwrap();
        let completion = next_completion(&mut store).await;
        store.complete(completion);

        assert_eq!(store.state.status_message(), "Color Cool sent");
        assert_eq!(store.state.selected_color(), &cool);
    }

    #[tokio::test]
    async fn last_completion_wins_over_issuance_order() {
        let transport = FakeTransport::succeeding();
        let warm_gate = transport.gate("color", Some(json!({ "r": 255, "g": 184, "b": 144 })));
        let blue_gate = transport.gate("color", Some(json!({ "r": 96, "g": 140, "b": 255 })));
        let (mut store, _tx) = store_with(transport);

        store.handle_event(Event::ApplyColor(ColorChoice::new("Warm", Rgb::new(255, 184, 144))));
        store.handle_event(Event::ApplyColor(ColorChoice::new("Blue", Rgb::new(96, 140, 255))));
        assert_eq!(store.state.status_message(), "Sending color blue...");

        blue_gate.send(Ok(())).unwrap();
        let completion = next_completion(&mut store).await;
        store.complete(completion);
        assert_eq!(store.state.status_message(), "Color Blue sent");
        assert!(!store.state.busy());

        warm_gate.send(Ok(())).unwrap();
        let completion = next_completion(&mut store).await;
        store.complete(completion);

        // The older request completed last, so it owns the final status
        assert_eq!(store.state.status_message(), "Color Warm sent");
        assert_eq!(store.state.selected_color().name(), "Blue");
        assert!(!store.state.busy());
    }

    #[tokio::test]
    async fn apply_intensity_without_commit_does_nothing() {
        let transport = FakeTransport::succeeding();
        let (mut store, _tx) = store_with(transport.clone());
        let notifier = store.notifier();
        let before = store.state.clone();

        store.handle_event(Event::ApplyIntensity { commit: false });
        tokio::task::yield_now().await;

        assert_eq!(store.state, before);
        assert!(!notifier.has_changed().unwrap());
        assert!(store.completion_rx.try_recv().is_err());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn apply_intensity_sends_the_current_value() {
        let transport = FakeTransport::succeeding();
        let (mut store, _tx) = store_with(transport.clone());

        store.handle_event(Event::SetIntensity(0.73));
        store.handle_event(Event::ApplyIntensity { commit: true });
        assert_eq!(store.state.status_message(), "Sending intensity 73%...");

        let completion = next_completion(&mut store).await;
        store.complete(completion);

        assert_eq!(store.state.status_message(), "Intensity 73% sent");
        assert_eq!(transport.calls(), vec![r#"intensity {"value":0.73}"#]);
    }

    #[rstest]
    #[case(0.25, 0.25)]
    #[case(0.0, 0.0)]
    #[case(1.0, 1.0)]
    #[case(-0.1, 0.0)]
    #[case(1.2, 1.0)]
    #[tokio::test]
    async fn set_intensity_clamps_to_the_unit_range(#[case] value: f64, #[case] expected: f64) {
        let (mut store, _tx) = store_with(FakeTransport::succeeding());

        store.handle_event(Event::SetIntensity(value));

        assert_eq!(store.state.intensity(), expected);
        assert!(!store.state.busy());
        assert_eq!(store.state.status_message(), "Ready");
    }

    #[tokio::test]
    async fn set_intensity_ignores_nan() {
        let (mut store, _tx) = store_with(FakeTransport::succeeding());

        store.handle_event(Event::SetIntensity(f64::NAN));

        assert_eq!(store.state.intensity(), DEFAULT_INTENSITY);
    }

    #[tokio::test]
    async fn requests_only_hold_a_weak_handle_on_the_store() {
        let transport = FakeTransport::succeeding();
        let gate = transport.gate("on", None);
        let (mut store, _tx) = store_with(transport.clone());
        let mut notifier = store.notifier();

        store.handle_event(Event::TurnOn);
        assert_eq!(store.completion_tx.strong_count(), 1);
        assert_eq!(store.completion_tx.weak_count(), 1);

        notifier.borrow_and_update();
        drop(store);

        gate.send(Ok(())).unwrap();
        tokio::task::yield_now().await;

        assert!(notifier.changed().await.is_err());
        assert_eq!(notifier.borrow().status_message(), "Sending power on...");
        assert!(notifier.borrow().busy());
    }

    #[tokio::test]
    async fn listen_finishes_requests_in_flight_before_stopping() -> Result<(), Box<dyn std::error::Error>> {
        let transport = FakeTransport::succeeding();
        let gate = transport.gate("on", None);
        let (mut store, tx) = store_with(transport);
        let mut notifier = store.notifier();

        tx.send(Event::TurnOn).await?;
        drop(tx);
        let listening = tokio::spawn(async move {
            store.listen().await;
            store
        });

        notifier.wait_for(|state| state.busy()).await?;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!listening.is_finished());

        gate.send(Ok(())).unwrap();
        let store = listening.await?;

        assert_eq!(store.state.status_message(), "Power On sent");
        assert!(!store.state.busy());
        assert_eq!(store.in_flight, 0);
        assert_eq!(notifier.borrow().status_message(), "Power On sent");
        Ok(())
    }

    #[tokio::test]
    async fn listen_stops_when_all_senders_are_dropped() {
        let (mut store, tx) = store_with(FakeTransport::succeeding());
        drop(tx);

        store.listen().await;
    }
}
