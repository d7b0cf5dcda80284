//! Output record and raw extraction fields.

use serde::{Deserialize, Serialize};

/// Normalized metadata for one catalog title.
///
/// `duration` is whole minutes as a string, empty when the page did not
/// carry a usable value. Lists keep page order and may contain duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieInfo {
    pub dvdid: String,
    pub url: String,
    pub title: String,
    pub plot: String,
    pub cover: String,
    pub director: String,
    pub publish_date: String,
    pub duration: String,
    pub genre: Vec<String>,
    pub actress: Vec<String>,
    pub producer: String,
    pub serial: String,
}

impl MovieInfo {
    /// Create an empty record for an identifier.
    pub fn new(dvdid: impl Into<String>) -> Self {
        Self {
            dvdid: dvdid.into(),
            ..Default::default()
        }
    }

    /// Whether extraction produced a title.
    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }
}

/// Field values read off a detail page, before franchise mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub identifier: String,
    pub canonical_url: String,
    pub title: String,
    pub synopsis: String,
    pub cover_url: String,
    pub director: String,
    pub release_date: String,
    /// Whole minutes, `None` when absent or non-numeric.
    pub duration_minutes: Option<i64>,
    pub performers: Vec<String>,
    pub genres: Vec<String>,
    pub producer_candidate: String,
    pub serial_candidate: String,
}

impl RawFields {
    /// Write these fields into `movie`.
    ///
    /// Franchise titles have no maker row on-site, so their series value
    /// becomes the producer and `serial` is left untouched.
    pub fn apply_to(self, movie: &mut MovieInfo, is_franchise: bool) {
        movie.dvdid = self.identifier;
        movie.url = self.canonical_url;
        movie.title = self.title;
        movie.plot = self.synopsis;
        movie.cover = self.cover_url;
        movie.director = self.director;
        movie.publish_date = self.release_date;
        movie.duration = self
            .duration_minutes
            .map(|m| m.to_string())
            .unwrap_or_default();
        movie.genre = self.genres;
        movie.actress = self.performers;

        if is_franchise {
            movie.producer = self.serial_candidate;
        } else {
            movie.producer = self.producer_candidate;
            movie.serial = self.serial_candidate;
        }
    }
}
