use std::fmt::{Display, Formatter};
use thiserror::Error;
use url::Url;

/// Base address of the lamp, e.g. `http://192.168.4.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    base: String,
}

impl DeviceEndpoint {
    pub fn parse(address: &str) -> Result<Self, EndpointError> {
        let url = Url::parse(address.trim()).map_err(|e| EndpointError::InvalidUrl(address.to_string(), e))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(EndpointError::UnsupportedScheme(scheme.to_string())),
        }
        if url.host_str().is_none() {
            return Err(EndpointError::MissingHost(address.to_string()));
        }

        Ok(DeviceEndpoint {
            base: url.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }
}

impl Display for DeviceEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base)
    }
}

#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("invalid device url '{0}': {1}")]
    InvalidUrl(String, url::ParseError),
    #[error("unsupported scheme '{0}', expected http or https")]
    UnsupportedScheme(String),
    #[error("device url '{0}' has no host")]
    MissingHost(String),
}
