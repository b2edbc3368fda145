use axum::{extract::State, Json};
use serde::Deserialize;

use super::extract::AppJson;
use crate::{
    error::AppResult,
    middleware::CurrentUser,
    services::chat::{self, ChatMessage, ChatReply},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

pub async fn chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<ChatRequest>,
) -> AppResult<Json<ChatReply>> {
    let reply = chat::reply(state.store.as_ref(), &state.ai, user.id, &request.messages).await?;
    Ok(Json(reply))
}
