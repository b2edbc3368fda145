use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{MovieDetails, MovieRatings, MovieStatus, MovieUpsert, OnboardingStep, Preferences, User, UserMovie},
};

/// Changes applied when a user completes an onboarding step
#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingUpdate {
    /// Step the user must currently be on
    pub expected_step: OnboardingStep,
    pub next_step: OnboardingStep,
    /// Replaces the stored preferences when set
    pub preferences: Option<Preferences>,
    /// Replaces the stored ratings when set
    pub movie_ratings: Option<MovieRatings>,
}

/// Persistence for users, sessions and user movie lists
///
/// Every user-movie operation is scoped by `user_id`: a row belonging to
/// another user behaves exactly like a missing row.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Returns the user with this email, creating it on first sign-in
    async fn find_or_create_user(&self, email: &str, name: Option<&str>) -> AppResult<User>;

    async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>>;

    /// Applies an onboarding step atomically.
    ///
    /// Fails with `NotFound` for an unknown user and `Conflict` when the user
    /// is not on `update.expected_step`.
    async fn advance_onboarding(&self, user_id: Uuid, update: OnboardingUpdate) -> AppResult<User>;

    async fn create_session(&self, user_id: Uuid) -> AppResult<Uuid>;

    async fn resolve_session(&self, token: Uuid) -> AppResult<Option<Uuid>>;

    /// The user's movies ordered by `order`, then creation time
    async fn list_user_movies(&self, user_id: Uuid) -> AppResult<Vec<UserMovie>>;

    /// Inserts or updates the row for (user, title).
    ///
    /// New rows are appended after the user's last movie. On update, `rating`
    /// and `feedback` are only overwritten when provided.
    async fn upsert_user_movie(&self, user_id: Uuid, upsert: &MovieUpsert) -> AppResult<UserMovie>;

    async fn set_movie_status(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        status: MovieStatus,
    ) -> AppResult<UserMovie>;

    async fn update_movie_details(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        details: &MovieDetails,
    ) -> AppResult<()>;

    /// Returns whether a row was deleted
    async fn delete_user_movie(&self, user_id: Uuid, movie_id: Uuid) -> AppResult<bool>;

    /// Sets `order` to each id's index in `order`, all or nothing.
    ///
    /// Fails with `NotFound` if any id is not one of the user's movies.
    async fn reorder_user_movies(&self, user_id: Uuid, order: &[Uuid]) -> AppResult<()>;
}
