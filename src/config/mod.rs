//! Configuration management for trackdown.
//!
//! TOML configuration lives in the user's config directory; the one required
//! credential (the recognition API key) comes from the environment.

pub mod credentials;
pub mod file;

pub use credentials::load_api_key;
pub use file::{get_config_path, TrackdownConfig};
