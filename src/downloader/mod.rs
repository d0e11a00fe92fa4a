//! Audio download via the external yt-dlp tool.

pub mod ytdlp;

pub use ytdlp::{find_yt_dlp, search_query, YtDlpFetcher};
