use serde::{Deserialize, Serialize};

use crate::{
    db::Store,
    error::{AppError, AppResult},
    services::{
        ai::{prompt, ProviderChain, Tier},
        catalog,
        recommendations::exclusions,
    },
};

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub source: Tier,
}

/// Content of the most recent non-blank user message
fn latest_user_message(messages: &[ChatMessage]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .filter(|m| m.role.eq_ignore_ascii_case("user"))
        .map(|m| m.content.trim())
        .find(|content| !content.is_empty())
}

/// Answers the user's latest chat message with one recommendation
pub async fn reply(
    store: &dyn Store,
    ai: &ProviderChain,
    user_id: uuid::Uuid,
    messages: &[ChatMessage],
) -> AppResult<ChatReply> {
    let message = latest_user_message(messages)
        .ok_or_else(|| AppError::InvalidInput("a user message is required".to_string()))?;

    let user = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let movies = store.list_user_movies(user_id).await?;
    let list_titles: Vec<String> = movies.iter().map(|m| m.movie_title.clone()).collect();

    let request = prompt::chat_prompt(&user, &list_titles, message);
    let parse = |text: &str| Some(text.trim().to_string()).filter(|t| !t.is_empty());

    match ai.run(&request, parse).await {
        Ok(outcome) => Ok(ChatReply {
            reply: outcome.value,
            source: outcome.tier,
        }),
        Err(exhausted) => {
            tracing::warn!(
                user_id = %user_id,
                failures = %exhausted.summary().unwrap_or_default(),
                "Chat falling back to the static catalog"
            );
            let exclude = exclusions(&user, &movies);
            let reply = catalog::fallback_titles(user.preferences.favorite_genre.as_deref(), &exclude, 1)
                .into_iter()
                .next()
                .map(|title| format!("How about \"{}\"? It's a great pick based on your taste.", title))
                .unwrap_or_else(|| {
                    "You've already seen everything I know about. Try searching for a title instead.".to_string()
                });
            Ok(ChatReply {
                reply,
                source: Tier::Static,
            })
        }
    }
}
