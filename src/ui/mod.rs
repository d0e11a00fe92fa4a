//! Terminal user interface for trackdown.

pub mod fatal;
pub mod screen;

pub use fatal::show_fatal;
pub use screen::{ListenScreen, ScreenCommand};
