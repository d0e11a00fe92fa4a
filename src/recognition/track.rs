//! Track metadata returned by the recognition service.

use serde::Deserialize;

/// Nested genre information as returned by the Shazam API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Genres {
    /// Primary genre label, e.g. "Pop"
    #[serde(default)]
    pub primary: Option<String>,
}

/// Metadata for a recognized song.
///
/// Deserialized straight from the `track` field of the recognition response.
/// Album and genre are frequently absent; the display accessors substitute
/// "N/A" so the UI never has to branch on them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Track {
    /// Song title
    pub title: String,
    /// Subtitle, in practice the artist name
    pub subtitle: String,
    /// Album name, when the service provides one
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub genres: Option<Genres>,
}

impl Track {
    /// Album name for display, "N/A" when absent.
    pub fn album_display(&self) -> &str {
        self.album.as_deref().unwrap_or("N/A")
    }

    /// Primary genre for display, "N/A" when absent.
    pub fn genre_display(&self) -> &str {
        self.genres
            .as_ref()
            .and_then(|g| g.primary.as_deref())
            .unwrap_or("N/A")
    }

    /// One-line "Title by Artist" summary for status messages.
    pub fn summary(&self) -> String {
        format!("{} by {}", self.title, self.subtitle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(album: Option<&str>, genre: Option<&str>) -> Track {
        Track {
            title: "Song".to_string(),
            subtitle: "Artist".to_string(),
            album: album.map(str::to_string),
            genres: genre.map(|g| Genres {
                primary: Some(g.to_string()),
            }),
        }
    }

    #[test]
    fn display_accessors_substitute_na() {
        let bare = track(None, None);
        assert_eq!(bare.album_display(), "N/A");
        assert_eq!(bare.genre_display(), "N/A");

        let full = track(Some("Album"), Some("Pop"));
        assert_eq!(full.album_display(), "Album");
        assert_eq!(full.genre_display(), "Pop");
    }

    #[test]
    fn genre_absent_inside_genres_object() {
        let t = Track {
            genres: Some(Genres { primary: None }),
            ..track(None, None)
        };
        assert_eq!(t.genre_display(), "N/A");
    }

    #[test]
    fn summary_formats_title_and_artist() {
        assert_eq!(track(None, None).summary(), "Song by Artist");
    }
}
