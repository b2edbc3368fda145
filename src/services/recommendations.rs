/// Personalized recommendations
///
/// The user's profile and ratings go to the AI chain; whatever comes back is
/// filtered against everything the user already has. If no provider answers,
/// the static catalog is filtered by the user's favorite genre instead. The
/// result and the user's own lists are then enriched with metadata.
use serde::Serialize;
use std::collections::HashSet;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{Recommendation, User, UserMovie},
    services::{
        ai::{
            extract::{self, extract_titles},
            prompt, ProviderChain, Tier,
        },
        catalog,
        metadata::MetadataService,
    },
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    pub user_movies: Vec<UserMovie>,
    pub source: Tier,
}

/// Lowercased titles the user must not be recommended again
pub fn exclusions(user: &User, movies: &[UserMovie]) -> HashSet<String> {
    movies
        .iter()
        .map(|m| m.movie_title.as_str())
        .chain(user.movie_ratings.keys().map(String::as_str))
        .map(|title| title.trim().to_lowercase())
        .collect()
}

/// The same titles as [`exclusions`] as the user wrote them, for the prompt
pub fn excluded_titles(user: &User, movies: &[UserMovie]) -> Vec<String> {
    let titles = movies
        .iter()
        .map(|m| m.movie_title.as_str())
        .chain(user.movie_ratings.keys().map(String::as_str));
    let mut titles = extract::dedupe(titles);
    titles.sort_by_key(|t| t.to_lowercase());
    titles
}

/// Drops excluded and repeated titles, keeping at most `limit`
pub fn filter_titles(titles: Vec<String>, exclude: &HashSet<String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    titles
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| {
            let key = t.to_lowercase();
            !exclude.contains(&key) && seen.insert(key)
        })
        .take(limit)
        .collect()
}

/// Titles from the first tier that yields anything new, then the static catalog
async fn pick_titles(
    ai: &ProviderChain,
    user: &User,
    movies: &[UserMovie],
    exclude: &HashSet<String>,
) -> (Vec<String>, Tier) {
    let request = prompt::recommendation_prompt(user, &excluded_titles(user, movies));

    let parse = |text: &str| {
        extract_titles(text)
            .map(|titles| filter_titles(titles, exclude, prompt::RECOMMENDATION_COUNT))
            .filter(|titles| !titles.is_empty())
    };

    match ai.run(&request, parse).await {
        Ok(outcome) => (outcome.value, outcome.tier),
        Err(exhausted) => {
            tracing::warn!(
                user_id = %user.id,
                failures = %exhausted.summary().unwrap_or_default(),
                "All AI providers failed, using static recommendations"
            );
            let titles = catalog::fallback_titles(
                user.preferences.favorite_genre.as_deref(),
                exclude,
                prompt::RECOMMENDATION_COUNT,
            );
            (titles, Tier::Static)
        }
    }
}

/// Recommendations for `user_id`, plus their lists with metadata filled in
pub async fn recommend(
    store: &dyn Store,
    ai: &ProviderChain,
    metadata: &MetadataService,
    user_id: uuid::Uuid,
) -> AppResult<RecommendationResponse> {
    let user = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let mut user_movies = store.list_user_movies(user_id).await?;

    let exclude = exclusions(&user, &user_movies);
    let (titles, source) = pick_titles(ai, &user, &user_movies, &exclude).await;

    let recommendations = metadata.enrich_batch(&titles).await;

    // Only titles that have never been enriched are looked up
    let missing: Vec<usize> = user_movies
        .iter()
        .enumerate()
        .filter(|(_, m)| !m.details.is_populated())
        .map(|(i, _)| i)
        .collect();
    let missing_titles: Vec<String> = missing
        .iter()
        .map(|&i| user_movies[i].movie_title.clone())
        .collect();
    let enriched = metadata.enrich_batch(&missing_titles).await;

    for (index, found) in missing.into_iter().zip(enriched) {
        let movie = &mut user_movies[index];
        if found.details.is_populated() {
            if let Err(e) = store
                .update_movie_details(user_id, movie.id, &found.details)
                .await
            {
                tracing::warn!(movie_id = %movie.id, error = %e, "Failed to persist movie metadata");
            }
        }
        movie.details = found.details;
    }

    tracing::info!(
        user_id = %user_id,
        source = %source,
        count = recommendations.len(),
        "Recommendations generated"
    );

    Ok(RecommendationResponse {
        recommendations,
        user_movies,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::{MovieDetails, MovieStatus, MovieUpsert, OnboardingStep, Rating, FALLBACK_POSTER},
        services::{
            ai::{AiProvider, MockAiProvider, ProviderError},
            metadata::{MetadataProvider, MockMetadataProvider},
        },
    };
    use std::{sync::Arc, time::Duration};

    fn chain_replying(reply: Result<&'static str, ProviderError>) -> ProviderChain {
        let mut provider = MockAiProvider::new();
        provider.expect_tier().return_const(Tier::OpenAi);
        provider
            .expect_complete()
            .returning(move |_| reply.clone().map(str::to_string));
        ProviderChain::new(
            vec![Arc::new(provider) as Arc<dyn AiProvider>],
            Duration::from_secs(5),
            0,
            Duration::from_secs(60),
        )
    }

    fn no_metadata() -> MetadataService {
        MetadataService::new(vec![], None, 4)
    }

    async fn horror_fan(store: &MemoryStore) -> User {
        let user = store.find_or_create_user("fan@example.com", None).await.unwrap();
        let mut preferences = user.preferences.clone();
        preferences.favorite_genre = Some("Horror".to_string());
        store
            .advance_onboarding(
                user.id,
                crate::db::OnboardingUpdate {
                    expected_step: OnboardingStep::NeedsInitialSurvey,
                    next_step: OnboardingStep::NeedsMovieRatings,
                    preferences: Some(preferences),
                    movie_ratings: None,
                },
            )
            .await
            .unwrap();
        store
            .advance_onboarding(
                user.id,
                crate::db::OnboardingUpdate {
                    expected_step: OnboardingStep::NeedsMovieRatings,
                    next_step: OnboardingStep::NeedsCasualQuestions,
                    preferences: None,
                    movie_ratings: Some([("Hereditary".to_string(), Rating::new(5).unwrap())].into()),
                },
            )
            .await
            .unwrap()
    }

    async fn add(store: &MemoryStore, user: &User, title: &str) -> UserMovie {
        store
            .upsert_user_movie(
                user.id,
                &MovieUpsert {
                    movie_title: title.to_string(),
                    status: MovieStatus::Watchlist,
                    rating: None,
                    feedback: None,
                },
            )
            .await
            .unwrap()
    }

    #[test]
    fn test_filter_titles() {
        let exclude: HashSet<String> = ["heat".to_string()].into();
        let titles = filter_titles(
            vec![
                "Heat".to_string(),
                "Alien".to_string(),
                " alien ".to_string(),
                "Ronin".to_string(),
            ],
            &exclude,
            5,
        );
        assert_eq!(titles, vec!["Alien", "Ronin"]);
    }

    #[tokio::test]
    async fn test_prompt_lists_exclusions_as_written() {
        let store = MemoryStore::new();
        let user = horror_fan(&store).await;
        add(&store, &user, "Get Out").await;
        add(&store, &user, "hereditary").await;
        let movies = store.list_user_movies(user.id).await.unwrap();
        let user = store.get_user(user.id).await.unwrap().unwrap();

        assert_eq!(excluded_titles(&user, &movies), vec!["Get Out", "hereditary"]);

        let mut provider = MockAiProvider::new();
        provider.expect_tier().return_const(Tier::Gemini);
        provider
            .expect_complete()
            .withf(|prompt: &str| prompt.contains("do not suggest them: Get Out, hereditary"))
            .times(1)
            .returning(|_| Ok(r#"["The Thing"]"#.to_string()));
        let ai = ProviderChain::new(
            vec![Arc::new(provider) as Arc<dyn AiProvider>],
            Duration::from_secs(5),
            0,
            Duration::from_secs(60),
        );

        let response = recommend(&store, &ai, &no_metadata(), user.id).await.unwrap();
        assert_eq!(response.source, Tier::Gemini);
    }

    #[tokio::test]
    async fn test_ai_titles_are_filtered_against_lists_and_ratings() {
        let store = MemoryStore::new();
        let user = horror_fan(&store).await;
        add(&store, &user, "Get Out").await;

        let ai = chain_replying(Ok(
            r#"[{"title": "get out"}, {"title": "Hereditary"}, {"title": "The Thing"}]"#,
        ));
        let response = recommend(&store, &ai, &no_metadata(), user.id).await.unwrap();

        assert_eq!(response.source, Tier::OpenAi);
        let titles: Vec<&str> = response.recommendations.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["The Thing"]);
        assert_eq!(response.recommendations[0].details.poster_url.as_deref(), Some(FALLBACK_POSTER));
    }

    #[tokio::test]
    async fn test_only_excluded_titles_from_ai_falls_back() {
        let store = MemoryStore::new();
        let user = horror_fan(&store).await;

        let ai = chain_replying(Ok(r#"["Hereditary"]"#));
        let response = recommend(&store, &ai, &no_metadata(), user.id).await.unwrap();
        assert_eq!(response.source, Tier::Static);
        assert!(!response.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_static_fallback_respects_genre_and_exclusions() {
        let store = MemoryStore::new();
        let user = horror_fan(&store).await;
        add(&store, &user, "Get Out").await;

        let ai = chain_replying(Err(ProviderError::MissingApiKey));
        let response = recommend(&store, &ai, &no_metadata(), user.id).await.unwrap();

        assert_eq!(response.source, Tier::Static);
        let titles: Vec<&str> = response.recommendations.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["The Witch", "A Quiet Place", "It Follows", "The Babadook", "The Conjuring"]
        );
        assert_eq!(response.user_movies.len(), 1);
    }

    #[tokio::test]
    async fn test_user_movies_metadata_is_persisted() {
        let store = MemoryStore::new();
        let user = horror_fan(&store).await;
        let movie = add(&store, &user, "Get Out").await;

        let mut source = MockMetadataProvider::new();
        source.expect_source().return_const("tmdb");
        source.expect_lookup().returning(|title| {
            Ok(Some(MovieDetails {
                poster_url: Some(format!("https://img/{title}.jpg")),
                year: Some(2017),
                ..MovieDetails::default()
            }))
        });
        let metadata = MetadataService::new(vec![Arc::new(source) as Arc<dyn MetadataProvider>], None, 2);

        let ai = chain_replying(Err(ProviderError::MissingApiKey));
        let response = recommend(&store, &ai, &metadata, user.id).await.unwrap();

        assert_eq!(response.user_movies[0].details.year, Some(2017));
        let stored = store.list_user_movies(user.id).await.unwrap();
        assert_eq!(stored[0].id, movie.id);
        assert_eq!(
            stored[0].details.poster_url.as_deref(),
            Some("https://img/Get Out.jpg")
        );
        assert!(response.recommendations.iter().all(|r| r.details.year == Some(2017)));
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let ai = chain_replying(Err(ProviderError::MissingApiKey));
        let err = recommend(&store, &ai, &no_metadata(), uuid::Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
