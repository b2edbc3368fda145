/// Prompt text sent to every provider in the chain
use crate::models::{Preferences, User};

pub const SURVEY_MOVIE_COUNT: usize = 10;
pub const RECOMMENDATION_COUNT: usize = 5;

fn or_unspecified(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or("not specified")
}

fn join_or_none(titles: &[String]) -> String {
    if titles.is_empty() {
        "none".to_string()
    } else {
        titles.join(", ")
    }
}

/// Asks for movies the user should rate during onboarding
pub fn survey_prompt(preferences: &Preferences) -> String {
    let answers = if preferences.casual_answers.is_empty() {
        "None".to_string()
    } else {
        preferences
            .casual_answers
            .iter()
            .enumerate()
            .map(|(i, answer)| format!("Q{}: {}", i + 1, answer))
            .collect::<Vec<_>>()
            .join("\n  ")
    };

    format!(
        "Based on these preferences, recommend {count} well-known movies the user can rate:\n\
         - Favorite Genre: {genre}\n\
         - Favorite Director: {director}\n\
         - Mood: {mood}\n\
         - Vibe check answers:\n  {answers}\n\
         Return ONLY a valid JSON array of movie titles. Example: [\"The Shawshank Redemption\", \"Pulp Fiction\"]",
        count = SURVEY_MOVIE_COUNT,
        genre = or_unspecified(&preferences.favorite_genre),
        director = or_unspecified(&preferences.favorite_director),
        mood = or_unspecified(&preferences.mood),
    )
}

/// Asks for new titles that fit the user's taste and avoid `exclude`
pub fn recommendation_prompt(user: &User, exclude: &[String]) -> String {
    let prefs = &user.preferences;
    format!(
        "You are a movie expert. A user has these preferences:\n\
         - Favorite Genre: {genre}\n\
         - Favorite Director: {director}\n\
         - Mood: {mood}\n\
         - Casual answers: {answers}\n\
         Movies they loved: {liked}\n\
         Movies they disliked: {disliked}\n\
         They already have these movies on their lists, do not suggest them: {exclude}\n\
         Recommend {count} new movies they haven't seen that match their taste. \
         Return ONLY a JSON array of objects with a \"title\" key. Example: [{{\"title\": \"Blade Runner 2049\"}}]",
        genre = or_unspecified(&prefs.favorite_genre),
        director = or_unspecified(&prefs.favorite_director),
        mood = or_unspecified(&prefs.mood),
        answers = join_or_none(&prefs.casual_answers),
        liked = join_or_none(&user.liked_titles()),
        disliked = join_or_none(&user.disliked_titles()),
        exclude = join_or_none(exclude),
        count = RECOMMENDATION_COUNT,
    )
}

/// Free-text request for one recommendation in reply to a chat message
pub fn chat_prompt(user: &User, list_titles: &[String], message: &str) -> String {
    let prefs = &user.preferences;
    format!(
        "You are a friendly and insightful movie recommendation expert.\n\
         The user's favorite genre is {genre}, favorite director {director}, current mood {mood}.\n\
         Movies they loved: {liked}\n\
         Movies already on their lists: {lists}\n\
         The user's latest request is: \"{message}\"\n\
         Provide one specific and thoughtful movie recommendation.",
        genre = or_unspecified(&prefs.favorite_genre),
        director = or_unspecified(&prefs.favorite_director),
        mood = or_unspecified(&prefs.mood),
        liked = join_or_none(&user.liked_titles()),
        lists = join_or_none(list_titles),
        message = message.trim(),
    )
}
