use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};

use crate::{
    error::{ApiError, StoreError},
    models::{Envelope, Payload, User},
    response::send_json,
    state::AppState,
};

// Bodies are decoded from raw bytes so the Content-Type header is not
// required, only well-formed JSON. The router lifts the body size limit.

#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let user: User = serde_json::from_slice(&body).map_err(ApiError::InvalidCreateBody)?;
    let id = state.store.create(user);
    state.users_created_counter.add(1, &[]);
    tracing::info!(%id, "User created");

    Ok(send_json(&Envelope::data(Payload::Id(id)), StatusCode::CREATED))
}

#[tracing::instrument(skip_all)]
pub async fn get_users(State(state): State<AppState>) -> Response {
    let users = state.store.get_all();
    tracing::debug!(count = users.len(), "Listing users");

    send_json(&Envelope::data(Payload::Users(users)), StatusCode::OK)
}

#[tracing::instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let user = state.store.get(&id)?;

    Ok(send_json(&Envelope::data(Payload::User(user)), StatusCode::OK))
}

#[tracing::instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let user: User = match serde_json::from_slice(&body) {
        Ok(user) => user,
        // An unknown id is reported ahead of a bad body.
        Err(_) if !state.store.contains(&id) => {
            return Err(StoreError::NotFound(id).into());
        }
        Err(err) => return Err(ApiError::InvalidUpdateBody(err)),
    };
    let user = state.store.update(&id, user)?;
    tracing::info!("User updated");

    Ok(send_json(&Envelope::data(Payload::User(user)), StatusCode::OK))
}

#[tracing::instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let user = state.store.delete(&id)?;
    state.users_deleted_counter.add(1, &[]);
    tracing::info!("User deleted");

    Ok(send_json(&Envelope::data(Payload::User(user)), StatusCode::OK))
}
