// Backend API client and endpoint groups.

pub mod client;
pub mod models;

mod audio;
mod player;
mod projector;
mod status;

pub use client::BackendClient;
pub use models::Ack;
