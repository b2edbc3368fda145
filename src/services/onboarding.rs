/// Onboarding wizard: survey, then ratings, then casual questions
///
/// Each submission is only accepted on its own step. The step check and the
/// write happen together in the store so concurrent submissions cannot both
/// advance the same user.
use serde::{Deserialize, Serialize};

use crate::{
    db::{OnboardingUpdate, Store},
    error::{AppError, AppResult},
    models::{MovieRatings, OnboardingStep, User},
    services::{
        ai::{
            chain::summarize,
            extract::{self, extract_titles},
            prompt, ProviderChain, Tier,
        },
        catalog,
    },
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurveyInput {
    pub favorite_genre: Option<String>,
    pub favorite_director: Option<String>,
    pub mood: Option<String>,
    pub casual_answers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyOutcome {
    pub success: bool,
    /// Exactly ten distinct titles to rate
    pub movies: Vec<String>,
    pub source: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub success: bool,
    pub onboarding_step: OnboardingStep,
}

#[derive(Debug, Clone, Serialize)]
pub struct CasualQuestion {
    pub question: &'static str,
    pub options: [&'static str; 4],
}

pub const CASUAL_QUESTIONS: [CasualQuestion; 3] = [
    CasualQuestion {
        question: "A perfect movie night for me is...",
        options: [
            "Action-packed and exciting",
            "Funny and lighthearted",
            "Thought-provoking and deep",
            "A classic I can watch again",
        ],
    },
    CasualQuestion {
        question: "I prefer movies that are...",
        options: [
            "Critically acclaimed",
            "Popular and well-known",
            "Hidden gems",
            "Visually stunning",
        ],
    },
    CasualQuestion {
        question: "When it comes to plot, I enjoy...",
        options: [
            "Complex twists and turns",
            "A straightforward, strong story",
            "Character-driven stories",
            "Mind-bending or abstract concepts",
        ],
    },
];

pub fn casual_questions() -> &'static [CasualQuestion] {
    &CASUAL_QUESTIONS
}

fn require_step(user: &User, expected: OnboardingStep) -> AppResult<()> {
    if user.onboarding_step == expected {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "onboarding step is {}, expected {}",
            user.onboarding_step, expected
        )))
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_answers(answers: Vec<String>) -> Vec<String> {
    answers
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

/// Exactly `SURVEY_MOVIE_COUNT` distinct titles: the generated ones first,
/// topped up from the curated lists
fn fill_survey_titles(generated: Vec<String>) -> Vec<String> {
    let curated = catalog::SURVEY_FALLBACK
        .iter()
        .chain(catalog::SURVEY_PADDING.iter())
        .copied();

    let mut titles = extract::dedupe(generated.iter().map(String::as_str).chain(curated));
    titles.truncate(prompt::SURVEY_MOVIE_COUNT);
    titles
}

/// Saves the survey answers and generates the titles for the rating step
pub async fn submit_survey(
    store: &dyn Store,
    ai: &ProviderChain,
    user: &User,
    input: SurveyInput,
) -> AppResult<SurveyOutcome> {
    require_step(user, OnboardingStep::NeedsInitialSurvey)?;

    let mut preferences = user.preferences.clone();
    preferences.favorite_genre = clean(input.favorite_genre);
    preferences.favorite_director = clean(input.favorite_director);
    preferences.mood = clean(input.mood);
    let answers = clean_answers(input.casual_answers);
    if !answers.is_empty() {
        preferences.casual_answers = answers;
    }

    let request = prompt::survey_prompt(&preferences);
    let (generated, source, ai_error) = match ai.run(&request, extract_titles).await {
        Ok(outcome) => (
            outcome.value,
            outcome.tier,
            summarize(&outcome.failures),
        ),
        Err(exhausted) => (Vec::new(), Tier::Static, exhausted.summary()),
    };

    let movies = fill_survey_titles(generated);
    preferences.dynamic_movies_to_rate = movies.clone();

    store
        .advance_onboarding(
            user.id,
            OnboardingUpdate {
                expected_step: OnboardingStep::NeedsInitialSurvey,
                next_step: OnboardingStep::NeedsMovieRatings,
                preferences: Some(preferences),
                movie_ratings: None,
            },
        )
        .await?;

    tracing::info!(user_id = %user.id, source = %source, "Onboarding survey saved");

    Ok(SurveyOutcome {
        success: true,
        movies,
        source,
        ai_error,
    })
}

/// Stores the user's ratings of the survey titles
pub async fn submit_ratings(store: &dyn Store, user: &User, ratings: MovieRatings) -> AppResult<StepOutcome> {
    require_step(user, OnboardingStep::NeedsMovieRatings)?;

    let ratings: MovieRatings = ratings
        .into_iter()
        .map(|(title, rating)| (title.trim().to_string(), rating))
        .filter(|(title, _)| !title.is_empty())
        .collect();

    if ratings.is_empty() {
        return Err(AppError::InvalidInput("at least one rating is required".to_string()));
    }

    let updated = store
        .advance_onboarding(
            user.id,
            OnboardingUpdate {
                expected_step: OnboardingStep::NeedsMovieRatings,
                next_step: OnboardingStep::NeedsCasualQuestions,
                preferences: None,
                movie_ratings: Some(ratings),
            },
        )
        .await?;

    tracing::info!(
        user_id = %user.id,
        rated = updated.movie_ratings.len(),
        "Movie ratings saved"
    );

    Ok(StepOutcome {
        success: true,
        onboarding_step: updated.onboarding_step,
    })
}

/// Records the casual question answers and completes onboarding
pub async fn submit_casual_answers(store: &dyn Store, user: &User, answers: Vec<String>) -> AppResult<StepOutcome> {
    require_step(user, OnboardingStep::NeedsCasualQuestions)?;

    let answers = clean_answers(answers);
    if answers.is_empty() {
        return Err(AppError::InvalidInput("answers must not be empty".to_string()));
    }

    let mut preferences = user.preferences.clone();
    preferences.casual_answers = answers;

    let updated = store
        .advance_onboarding(
            user.id,
            OnboardingUpdate {
                expected_step: OnboardingStep::NeedsCasualQuestions,
                next_step: OnboardingStep::OnboardingComplete,
                preferences: Some(preferences),
                movie_ratings: None,
            },
        )
        .await?;

    tracing::info!(user_id = %user.id, "Onboarding complete");

    Ok(StepOutcome {
        success: true,
        onboarding_step: updated.onboarding_step,
    })
}
