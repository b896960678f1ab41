// hallctl-api: Async Rust client for the cinema hall device-control backend

pub mod backend;
pub mod error;
pub mod push;
pub mod transport;

pub use backend::{Ack, BackendClient};
pub use error::{Error, ErrorKind};
pub use push::{StatusFrames, websocket_stream};
pub use transport::{TlsMode, TransportConfig};
