use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display, str::FromStr};
use uuid::Uuid;

/// Where a user is in the onboarding wizard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnboardingStep {
    #[default]
    NeedsInitialSurvey,
    NeedsMovieRatings,
    NeedsCasualQuestions,
    OnboardingComplete,
}

impl OnboardingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingStep::NeedsInitialSurvey => "NEEDS_INITIAL_SURVEY",
            OnboardingStep::NeedsMovieRatings => "NEEDS_MOVIE_RATINGS",
            OnboardingStep::NeedsCasualQuestions => "NEEDS_CASUAL_QUESTIONS",
            OnboardingStep::OnboardingComplete => "ONBOARDING_COMPLETE",
        }
    }

    /// The step that follows this one, or `None` once onboarding is complete
    pub fn next(&self) -> Option<OnboardingStep> {
        match self {
            OnboardingStep::NeedsInitialSurvey => Some(OnboardingStep::NeedsMovieRatings),
            OnboardingStep::NeedsMovieRatings => Some(OnboardingStep::NeedsCasualQuestions),
            OnboardingStep::NeedsCasualQuestions => Some(OnboardingStep::OnboardingComplete),
            OnboardingStep::OnboardingComplete => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        *self == OnboardingStep::OnboardingComplete
    }
}

impl Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnboardingStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEEDS_INITIAL_SURVEY" => Ok(OnboardingStep::NeedsInitialSurvey),
            "NEEDS_MOVIE_RATINGS" => Ok(OnboardingStep::NeedsMovieRatings),
            "NEEDS_CASUAL_QUESTIONS" => Ok(OnboardingStep::NeedsCasualQuestions),
            "ONBOARDING_COMPLETE" => Ok(OnboardingStep::OnboardingComplete),
            other => Err(format!("unknown onboarding step: {}", other)),
        }
    }
}

/// Free-form taste profile collected during onboarding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub favorite_genre: Option<String>,
    pub favorite_director: Option<String>,
    pub mood: Option<String>,
    pub casual_answers: Vec<String>,
    /// Titles generated for the rating step
    pub dynamic_movies_to_rate: Vec<String>,
}

/// A 1-5 star rating
///
/// Clients send either a number or a numeric string; both are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawRating", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(stars: u8) -> Result<Self, String> {
        if (Self::MIN..=Self::MAX).contains(&stars) {
            Ok(Self(stars))
        } else {
            Err(format!(
                "rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                stars
            ))
        }
    }

    pub fn stars(&self) -> u8 {
        self.0
    }

    pub fn is_liked(&self) -> bool {
        self.0 >= 4
    }

    pub fn is_disliked(&self) -> bool {
        self.0 <= 2
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRating {
    Number(f64),
    Text(String),
}

impl TryFrom<RawRating> for Rating {
    type Error = String;

    fn try_from(raw: RawRating) -> Result<Self, Self::Error> {
        let value = match raw {
            RawRating::Number(n) => n,
            RawRating::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("rating is not a number: {:?}", s))?,
        };
        if value.fract() != 0.0 || value < 0.0 || value > u8::MAX as f64 {
            return Err(format!("rating must be a whole number of stars, got {}", value));
        }
        Rating::new(value as u8)
    }
}

/// Title -> rating, as submitted in the rating step
pub type MovieRatings = BTreeMap<String, Rating>;

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub preferences: Preferences,
    pub movie_ratings: MovieRatings,
    pub onboarding_step: OnboardingStep,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            preferences: Preferences::default(),
            movie_ratings: MovieRatings::new(),
            onboarding_step: OnboardingStep::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Titles rated 4 stars or more
    pub fn liked_titles(&self) -> Vec<String> {
        self.movie_ratings
            .iter()
            .filter(|(_, rating)| rating.is_liked())
            .map(|(title, _)| title.clone())
            .collect()
    }

    /// Titles rated 2 stars or fewer
    pub fn disliked_titles(&self) -> Vec<String> {
        self.movie_ratings
            .iter()
            .filter(|(_, rating)| rating.is_disliked())
            .map(|(title, _)| title.clone())
            .collect()
    }
}
