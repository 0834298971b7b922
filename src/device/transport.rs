use crate::device::device_status::DeviceStatus;
use crate::domain::DeviceEndpoint;
use crate::domain::commands::Command;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("timeout")]
    Timeout,
    #[error("the lamp responded with status {0}")]
    Status(StatusCode),
    #[error("could not encode the request body: {0}")]
    Body(#[from] serde_json::Error),
    #[error("intensity {0} is not a finite number")]
    NonFiniteIntensity(f64),
    #[error("{0}")]
    Request(reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() { TransportError::Timeout } else { TransportError::Request(error) }
    }
}

#[derive(Serialize)]
struct ColorBody {
    r: u8,
    g: u8,
    b: u8,
}

#[derive(Serialize)]
struct IntensityBody {
    value: f64,
}

/// Sends commands to the lamp. Values are passed through as is, range checks belong to the caller.
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    /// POSTs to `<endpoint>/<path>`. Only a 2xx status counts as success, the response body is ignored.
    async fn send_command(&self, path: &str, body: Option<Value>) -> Result<(), TransportError>;

    async fn power_on(&self) -> Result<(), TransportError> {
        self.send_command("on", None).await
    }

    async fn power_off(&self) -> Result<(), TransportError> {
        self.send_command("off", None).await
    }

    async fn set_color(&self, r: u8, g: u8, b: u8) -> Result<(), TransportError> {
        let body = serde_json::to_value(ColorBody { r, g, b })?;
        self.send_command("color", Some(body)).await
    }

    /// Finite values are sent as is, even outside `0.0..=1.0`. NaN and infinities have no JSON form and are refused
    /// without contacting the lamp.
    async fn set_intensity(&self, value: f64) -> Result<(), TransportError> {
        if !value.is_finite() {
            return Err(TransportError::NonFiniteIntensity(value));
        }
        let body = serde_json::to_value(IntensityBody { value })?;
        self.send_command("intensity", Some(body)).await
    }

    async fn send(&self, command: &Command) -> Result<(), TransportError> {
        match command {
            Command::PowerOn => self.power_on().await,
            Command::PowerOff => self.power_off().await,
            Command::SetColor(rgb) => self.set_color(rgb.r, rgb.g, rgb.b).await,
            Command::SetIntensity(value) => self.set_intensity(*value).await,
        }
    }
}

#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: DeviceEndpoint,
}

impl HttpTransport {
    pub fn new(client: Client, endpoint: DeviceEndpoint) -> Self {
        HttpTransport { client, endpoint }
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn status(&self) -> Result<DeviceStatus, TransportError> {
        debug!("Retrieving lamp status...");
        let response = self.client.get(self.endpoint.url_for("status")).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status_code = %status, "⚠️ Retrieving lamp status... failed");
            return Err(TransportError::Status(status));
        }

        let device_status = response.json::<DeviceStatus>().await?;
        debug!("Retrieving lamp status... OK");
        Ok(device_status)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, body), fields(endpoint = %self.endpoint))]
    async fn send_command(&self, path: &str, body: Option<Value>) -> Result<(), TransportError> {
        let mut request = self.client.post(self.endpoint.url_for(path));
        if let Some(body) = &body {
            request = request.json(body);
        }

        debug!(?body, "Sending '{}'...", path);
        let response = request.send().await.inspect_err(|e| warn!("⚠️ Sending '{}'... failed: {}", path, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status_code = %status, "⚠️ Sending '{}'... failed, the lamp rejected the command", path);
            return Err(TransportError::Status(status));
        }

        debug!(status_code = %status, "Sending '{}'... OK", path);
        Ok(())
    }
}
