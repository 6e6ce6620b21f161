use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::sse::{Event, KeepAlive, Sse},
};
use chatrelay_contracts::{ChatRequest, Role};
use futures::{Stream, StreamExt};
use tracing::info;

use crate::api::state::AppState;
use crate::error::{RelayError, Result};
use crate::relay::relay_stream;

/// Returns the query to send upstream: the content of the most recent turn,
/// which must come from the user.
pub fn latest_query(request: &ChatRequest) -> Result<&str> {
    let last = request.messages.last().ok_or(RelayError::EmptyConversation)?;
    if last.role != Role::User {
        return Err(RelayError::LastTurnNotUser);
    }
    if last.content.trim().is_empty() {
        return Err(RelayError::EmptyQuery);
    }
    Ok(&last.content)
}

// POST /api/chat-messages
pub async fn chat_messages(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, RelayError>>>> {
    let Json(request) = payload.map_err(|rejection| RelayError::InvalidBody(rejection.body_text()))?;
    let query = latest_query(&request)?;

    info!(
        user = %request.user,
        turns = request.messages.len(),
        "relaying chat turn"
    );

    let response = state.upstream.open(query, &request.user).await?;
    let events = relay_stream(response.bytes_stream()).map(|item| {
        item.and_then(|chunk| {
            Event::default()
                .json_data(&chunk)
                .map_err(|e| RelayError::Internal(e.to_string()))
        })
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(state.keep_alive)))
}
