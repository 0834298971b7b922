pub mod color;
pub mod commands;
mod endpoint;
pub mod events;

pub use endpoint::{DeviceEndpoint, EndpointError};
