use serde::{Deserialize, Serialize};

mod user;
mod user_movie;

pub use user::{MovieRatings, OnboardingStep, Preferences, Rating, User};
pub use user_movie::{MovieDetails, MovieStatus, MovieUpsert, UserMovie, FALLBACK_POSTER};

/// A recommended title with whatever metadata could be found for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    #[serde(flatten)]
    pub details: MovieDetails,
}

// ============================================================================
// TMDb API Types
// ============================================================================

pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// Response from GET /3/search/movie
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// Response from GET /3/movie/{id}
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbMovieDetails {
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}

/// Response from GET /3/movie/{id}/credits
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
    #[serde(default)]
    pub crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCrewMember {
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
}

impl TmdbMovie {
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| format!("{}{}", TMDB_IMAGE_BASE, path))
    }

    /// Year component of `release_date` ("2010-07-16" -> 2010)
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|date| date.split('-').next())
            .and_then(|year| year.parse().ok())
    }
}

impl MovieDetails {
    /// Combines a TMDb search hit with its details and credits.
    ///
    /// Details and credits are optional: either call may fail without losing
    /// what the search hit already told us.
    pub fn from_tmdb(
        movie: &TmdbMovie,
        details: Option<TmdbMovieDetails>,
        credits: Option<TmdbCredits>,
    ) -> Self {
        let details = details.unwrap_or_default();
        let credits = credits.unwrap_or_default();

        Self {
            poster_url: Some(movie.poster_url().unwrap_or_else(|| FALLBACK_POSTER.to_string())),
            year: movie.release_year(),
            director: credits
                .crew
                .iter()
                .find(|member| member.job.as_deref() == Some("Director"))
                .map(|member| member.name.clone()),
            imdb_rating: details
                .vote_average
                .filter(|score| *score > 0.0)
                .map(|score| format!("{:.1}", score)),
            lead_actor: credits.cast.first().map(|member| member.name.clone()),
            genres: details.genres.into_iter().map(|genre| genre.name).collect(),
        }
    }
}

// ============================================================================
// OMDb API Types
// ============================================================================

/// Response from GET /?t={title}
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbMovie {
    pub response: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub actors: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl OmdbMovie {
    pub fn is_found(&self) -> bool {
        self.response.eq_ignore_ascii_case("true")
    }
}

/// OMDb uses "N/A" for missing values
fn omdb_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "N/A")
}

impl From<OmdbMovie> for MovieDetails {
    fn from(movie: OmdbMovie) -> Self {
        let year = omdb_value(movie.year).and_then(|year| {
            year.chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
                .parse()
                .ok()
        });
        let split = |list: Option<String>| -> Vec<String> {
            omdb_value(list)
                .map(|list| {
                    list.split(',')
                        .map(|item| item.trim().to_string())
                        .filter(|item| !item.is_empty())
                        .collect()
                })
                .unwrap_or_default()
        };

        Self {
            poster_url: Some(
                omdb_value(movie.poster).unwrap_or_else(|| FALLBACK_POSTER.to_string()),
            ),
            year,
            director: split(movie.director).into_iter().next(),
            imdb_rating: omdb_value(movie.imdb_rating),
            lead_actor: split(movie.actors).into_iter().next(),
            genres: split(movie.genre),
        }
    }
}
