use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{MovieStatus, MovieUpsert, Rating, UserMovie},
};

/// Body of POST /api/user-movies
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRequest {
    pub movie_title: String,
    pub status: MovieStatus,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedOutcome {
    pub success: bool,
    pub message: String,
    pub watched_count: usize,
}

fn normalize_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("movieTitle is required".to_string()));
    }
    Ok(title.to_string())
}

pub async fn list(store: &dyn Store, user_id: Uuid) -> AppResult<Vec<UserMovie>> {
    store.list_user_movies(user_id).await
}

/// Creates or updates the user's row for a title
pub async fn upsert(store: &dyn Store, user_id: Uuid, request: UpsertRequest) -> AppResult<UserMovie> {
    let upsert = MovieUpsert {
        movie_title: normalize_title(&request.movie_title)?,
        status: request.status,
        rating: request.rating.map(|r| i32::from(r.stars())),
        feedback: request
            .feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty()),
    };

    let movie = store.upsert_user_movie(user_id, &upsert).await?;
    tracing::info!(
        user_id = %user_id,
        movie_id = %movie.id,
        status = %movie.status,
        "User movie saved"
    );
    Ok(movie)
}

/// Marks a title as watched and reports how many watched titles the user has
pub async fn add_watched(store: &dyn Store, user_id: Uuid, movie_title: &str) -> AppResult<WatchedOutcome> {
    let title = normalize_title(movie_title)?;
    let upsert = MovieUpsert {
        movie_title: title.clone(),
        status: MovieStatus::Watched,
        rating: None,
        feedback: None,
    };
    store.upsert_user_movie(user_id, &upsert).await?;

    let watched_count = store
        .list_user_movies(user_id)
        .await?
        .iter()
        .filter(|m| m.status == MovieStatus::Watched)
        .count();

    Ok(WatchedOutcome {
        success: true,
        message: format!("\"{}\" added to watched", title),
        watched_count,
    })
}

pub async fn set_status(
    store: &dyn Store,
    user_id: Uuid,
    movie_id: Uuid,
    status: MovieStatus,
) -> AppResult<UserMovie> {
    store.set_movie_status(user_id, movie_id, status).await
}

pub async fn delete(store: &dyn Store, user_id: Uuid, movie_id: Uuid) -> AppResult<()> {
    if store.delete_user_movie(user_id, movie_id).await? {
        tracing::info!(user_id = %user_id, movie_id = %movie_id, "User movie deleted");
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Movie {} not found", movie_id)))
    }
}

/// Sets each movie's `order` to its index in `order`
pub async fn reorder(store: &dyn Store, user_id: Uuid, order: &[Uuid]) -> AppResult<()> {
    let mut seen = HashSet::with_capacity(order.len());
    if let Some(duplicate) = order.iter().find(|id| !seen.insert(**id)) {
        return Err(AppError::InvalidInput(format!(
            "movie {} appears more than once",
            duplicate
        )));
    }

    store.reorder_user_movies(user_id, order).await?;
    tracing::debug!(user_id = %user_id, count = order.len(), "User movies reordered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn request(title: &str, status: MovieStatus) -> UpsertRequest {
        UpsertRequest {
            movie_title: title.to_string(),
            status,
            rating: None,
            feedback: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_trims_and_rejects_blank_titles() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let movie = upsert(&store, user_id, request("  Heat ", MovieStatus::Watchlist))
            .await
            .unwrap();
        assert_eq!(movie.movie_title, "Heat");

        let err = upsert(&store, user_id, request("   ", MovieStatus::Watchlist))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_upsert_stores_rating_as_stars() {
        let store = MemoryStore::new();
        let mut req = request("Heat", MovieStatus::Liked);
        req.rating = Some(Rating::new(4).unwrap());
        req.feedback = Some("great heist".to_string());

        let movie = upsert(&store, Uuid::new_v4(), req).await.unwrap();
        assert_eq!(movie.rating, Some(4));
        assert_eq!(movie.feedback.as_deref(), Some("great heist"));
    }

    #[tokio::test]
    async fn test_add_watched_counts_only_watched() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        upsert(&store, user_id, request("Alien", MovieStatus::Watchlist))
            .await
            .unwrap();

        let first = add_watched(&store, user_id, "Heat").await.unwrap();
        assert_eq!(first.watched_count, 1);

        let second = add_watched(&store, user_id, "Alien").await.unwrap();
        assert_eq!(second.watched_count, 2);

        // Idempotent for the same title
        let again = add_watched(&store, user_id, "Alien").await.unwrap();
        assert_eq!(again.watched_count, 2);
        assert_eq!(list(&store, user_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let err = delete(&store, user_id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let movie = upsert(&store, user_id, request("Heat", MovieStatus::Watchlist)).await.unwrap();
        tokio_test::assert_ok!(delete(&store, user_id, movie.id).await);
        tokio_test::assert_err!(delete(&store, user_id, movie.id).await);
    }

    #[tokio::test]
    async fn test_reorder_rejects_duplicates() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let a = upsert(&store, user_id, request("A", MovieStatus::Watchlist)).await.unwrap();
        let b = upsert(&store, user_id, request("B", MovieStatus::Watchlist)).await.unwrap();

        let err = reorder(&store, user_id, &[a.id, a.id]).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        tokio_test::assert_ok!(reorder(&store, user_id, &[b.id, a.id]).await);
        let titles: Vec<String> = list(&store, user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.movie_title)
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }
}
