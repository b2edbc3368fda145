pub mod ai;
pub mod catalog;
pub mod chat;
pub mod insights;
pub mod metadata;
pub mod onboarding;
pub mod recommendations;
pub mod user_movies;
