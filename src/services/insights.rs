/// What the service has learned about a user, and what it sends to the AI
use serde::Serialize;
use std::collections::BTreeSet;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{MovieStatus, OnboardingStep, Preferences, User, UserMovie},
    services::{
        catalog::{self, Genre},
        recommendations::exclusions,
    },
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub profile: Preferences,
    pub onboarding_step: OnboardingStep,
    pub ratings: RatingSummary,
    pub genre_analysis: GenreAnalysis,
    pub lists: ListCounts,
    pub progress: Progress,
    /// Titles the recommender will not suggest again, sorted
    pub excluded_titles: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub total_rated: usize,
    pub liked: Vec<String>,
    pub disliked: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreAnalysis {
    pub liked_genres: Vec<Genre>,
    pub disliked_genres: Vec<Genre>,
    /// Liked genres that never show up among dislikes
    pub genre_preferences: Vec<Genre>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCounts {
    pub watchlist: usize,
    pub watched: usize,
    pub liked: usize,
    pub dismissed: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub has_completed_onboarding: bool,
    pub has_rated_movies: bool,
    pub has_watchlist: bool,
    pub has_watched_movies: bool,
    pub total_interactions: usize,
}

/// Genres of `titles`, from the catalog where known and the title text otherwise
fn genres_of_titles(titles: &[String]) -> BTreeSet<Genre> {
    titles
        .iter()
        .flat_map(|title| {
            let known = catalog::genres_of(title);
            if known.is_empty() {
                Genre::detect(title)
            } else {
                known.to_vec()
            }
        })
        .collect()
}

pub fn analyze_genres(liked: &[String], disliked: &[String]) -> GenreAnalysis {
    let liked = genres_of_titles(liked);
    let disliked = genres_of_titles(disliked);

    GenreAnalysis {
        genre_preferences: liked.difference(&disliked).copied().collect(),
        liked_genres: liked.into_iter().collect(),
        disliked_genres: disliked.into_iter().collect(),
    }
}

pub fn count_lists(movies: &[UserMovie]) -> ListCounts {
    let mut counts = ListCounts::default();
    for movie in movies {
        match movie.status {
            MovieStatus::Watchlist => counts.watchlist += 1,
            MovieStatus::Watched => counts.watched += 1,
            MovieStatus::Liked => counts.liked += 1,
            MovieStatus::Dismissed => counts.dismissed += 1,
        }
    }
    counts
}

pub fn summarize(user: &User, movies: &[UserMovie]) -> Insights {
    let liked = user.liked_titles();
    let disliked = user.disliked_titles();
    let lists = count_lists(movies);

    let mut excluded_titles: Vec<String> = exclusions(user, movies).into_iter().collect();
    excluded_titles.sort();

    Insights {
        profile: user.preferences.clone(),
        onboarding_step: user.onboarding_step,
        genre_analysis: analyze_genres(&liked, &disliked),
        progress: Progress {
            has_completed_onboarding: user.onboarding_step.is_complete(),
            has_rated_movies: !user.movie_ratings.is_empty(),
            has_watchlist: lists.watchlist > 0,
            has_watched_movies: lists.watched > 0,
            total_interactions: user.movie_ratings.len() + movies.len(),
        },
        ratings: RatingSummary {
            total_rated: user.movie_ratings.len(),
            liked,
            disliked,
        },
        lists,
        excluded_titles,
    }
}

pub async fn for_user(store: &dyn Store, user_id: uuid::Uuid) -> AppResult<Insights> {
    let user = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let movies = store.list_user_movies(user_id).await?;
    Ok(summarize(&user, &movies))
}
