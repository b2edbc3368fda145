use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::store::{OnboardingUpdate, Store},
    error::{AppError, AppResult},
    models::{MovieDetails, MovieStatus, MovieUpsert, User, UserMovie},
};

#[derive(Default)]
struct MemoryInner {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Uuid>,
    movies: HashMap<Uuid, UserMovie>,
}

/// In-process store used when no database is configured, and by tests
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn movie_not_found(movie_id: Uuid) -> AppError {
    AppError::NotFound(format!("Movie {} not found", movie_id))
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn find_or_create_user(&self, email: &str, name: Option<&str>) -> AppResult<User> {
        let mut inner = self.inner.write().await;

        if let Some(user) = inner.users.values_mut().find(|u| u.email == email) {
            // A name is only filled in, never replaced
            if user.name.is_none() {
                user.name = name.map(str::to_string);
            }
            return Ok(user.clone());
        }

        let user = User::new(email.to_string(), name.map(str::to_string));
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&user_id).cloned())
    }

    async fn advance_onboarding(&self, user_id: Uuid, update: OnboardingUpdate) -> AppResult<User> {
        let mut inner = self.inner.write().await;

        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.onboarding_step != update.expected_step {
            return Err(AppError::Conflict(format!(
                "Expected onboarding step {}, user is at {}",
                update.expected_step, user.onboarding_step
            )));
        }

        if let Some(preferences) = update.preferences {
            user.preferences = preferences;
        }
        if let Some(ratings) = update.movie_ratings {
            user.movie_ratings = ratings;
        }
        user.onboarding_step = update.next_step;
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn create_session(&self, user_id: Uuid) -> AppResult<Uuid> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user_id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        let token = Uuid::new_v4();
        inner.sessions.insert(token, user_id);
        Ok(token)
    }

    async fn resolve_session(&self, token: Uuid) -> AppResult<Option<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner.sessions.get(&token).copied())
    }

    async fn list_user_movies(&self, user_id: Uuid) -> AppResult<Vec<UserMovie>> {
        let inner = self.inner.read().await;
        let mut movies: Vec<UserMovie> = inner
            .movies
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        movies.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
        Ok(movies)
    }

    async fn upsert_user_movie(&self, user_id: Uuid, upsert: &MovieUpsert) -> AppResult<UserMovie> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner
            .movies
            .values_mut()
            .find(|m| m.user_id == user_id && m.movie_title == upsert.movie_title)
        {
            existing.status = upsert.status;
            if upsert.rating.is_some() {
                existing.rating = upsert.rating;
            }
            if upsert.feedback.is_some() {
                existing.feedback = upsert.feedback.clone();
            }
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        let next_order = inner
            .movies
            .values()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.order + 1)
            .max()
            .unwrap_or(0);

        let mut movie = UserMovie::new(user_id, upsert.movie_title.clone(), upsert.status, next_order);
        movie.rating = upsert.rating;
        movie.feedback = upsert.feedback.clone();
        inner.movies.insert(movie.id, movie.clone());
        Ok(movie)
    }

    async fn set_movie_status(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        status: MovieStatus,
    ) -> AppResult<UserMovie> {
        let mut inner = self.inner.write().await;
        let movie = inner
            .movies
            .get_mut(&movie_id)
            .filter(|m| m.user_id == user_id)
            .ok_or_else(|| movie_not_found(movie_id))?;

        movie.status = status;
        movie.updated_at = Utc::now();
        Ok(movie.clone())
    }

    async fn update_movie_details(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        details: &MovieDetails,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let movie = inner
            .movies
            .get_mut(&movie_id)
            .filter(|m| m.user_id == user_id)
            .ok_or_else(|| movie_not_found(movie_id))?;

        movie.details = details.clone();
        movie.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_user_movie(&self, user_id: Uuid, movie_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .movies
            .get(&movie_id)
            .is_some_and(|m| m.user_id == user_id);
        if owned {
            inner.movies.remove(&movie_id);
        }
        Ok(owned)
    }

    async fn reorder_user_movies(&self, user_id: Uuid, order: &[Uuid]) -> AppResult<()> {
        let mut inner = self.inner.write().await;

        // Validate everything before touching any row
        if let Some(missing) = order.iter().find(|id| {
            !inner
                .movies
                .get(*id)
                .is_some_and(|m| m.user_id == user_id)
        }) {
            return Err(movie_not_found(*missing));
        }

        let now = Utc::now();
        for (index, id) in order.iter().enumerate() {
            if let Some(movie) = inner.movies.get_mut(id) {
                movie.order = index as i32;
                movie.updated_at = now;
            }
        }
        Ok(())
    }
}
