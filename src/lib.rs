pub mod client;
pub mod config;
pub mod error;
pub mod server;

pub use client::EpsClient;
pub use config::Settings;
pub use error::TrackingError;
pub use server::build_app;
