mod client;
mod device_status;
mod transport;

pub use client::{ClientError, new_client};
pub use device_status::DeviceStatus;
pub use transport::{HttpTransport, Transport, TransportError};
