use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

/// Poster shown when no metadata source has one
pub const FALLBACK_POSTER: &str = "/fallback-poster.png";

/// A user's relationship to a movie
///
/// Serialized lowercase; any casing is accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum MovieStatus {
    Watchlist,
    Watched,
    Dismissed,
    Liked,
}

impl MovieStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovieStatus::Watchlist => "watchlist",
            MovieStatus::Watched => "watched",
            MovieStatus::Dismissed => "dismissed",
            MovieStatus::Liked => "liked",
        }
    }
}

impl Display for MovieStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovieStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "watchlist" => Ok(MovieStatus::Watchlist),
            "watched" => Ok(MovieStatus::Watched),
            "dismissed" => Ok(MovieStatus::Dismissed),
            "liked" => Ok(MovieStatus::Liked),
            other => Err(format!("unknown movie status: {}", other)),
        }
    }
}

impl TryFrom<String> for MovieStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Display metadata for a movie, gathered from TMDb or OMDb
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    pub poster_url: Option<String>,
    pub year: Option<i32>,
    pub director: Option<String>,
    pub imdb_rating: Option<String>,
    pub lead_actor: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl MovieDetails {
    /// Record returned when every metadata source fails
    pub fn fallback() -> Self {
        Self {
            poster_url: Some(FALLBACK_POSTER.to_string()),
            ..Self::default()
        }
    }

    /// Whether this carries anything beyond the fallback poster
    pub fn is_populated(&self) -> bool {
        let real_poster = self
            .poster_url
            .as_deref()
            .is_some_and(|url| url != FALLBACK_POSTER);
        real_poster
            || self.year.is_some()
            || self.director.is_some()
            || self.imdb_rating.is_some()
            || self.lead_actor.is_some()
            || !self.genres.is_empty()
    }
}

/// A movie on one of the user's lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMovie {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_title: String,
    pub status: MovieStatus,
    #[serde(flatten)]
    pub details: MovieDetails,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserMovie {
    pub fn new(user_id: Uuid, movie_title: String, status: MovieStatus, order: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            movie_title,
            status,
            details: MovieDetails::default(),
            rating: None,
            feedback: None,
            order,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields written by an upsert keyed on (user, title)
#[derive(Debug, Clone, PartialEq)]
pub struct MovieUpsert {
    pub movie_title: String,
    pub status: MovieStatus,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
}
