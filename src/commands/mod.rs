//! Application command handlers for trackdown.
//!
//! # Commands
//! - `listen`: interactive record → identify → download surface (default)
//! - `config`: open the configuration file in the user's preferred editor
//! - `list_devices`: list available audio input devices
//! - `logs`: display recent log entries

pub mod config;
pub mod list_devices;
pub mod listen;
pub mod logs;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use listen::handle_listen;
pub use logs::handle_logs;
