//! Song recognition via the Shazam RapidAPI endpoint.
//!
//! One multipart upload per captured clip; the response either identifies a
//! track or reports no match.

pub mod api;
pub mod track;

pub use api::{Recognition, ShazamClient};
pub use track::Track;
