//! Call Management API handlers
//!
//! Requests arrive already authenticated; the verified user id is carried in
//! the `x-user-id` header.

use super::dto::{
    ApiResponse, CallResponse, MuteResponse, NextSpeakerResponse, StartCallRequest,
};
use crate::domain::calling::{CallSessionManager, NextSpeaker};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::value_objects::{CallId, GroupId, UserId};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Header carrying the verified user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// API state
#[derive(Clone)]
pub struct AppState {
    pub call_manager: Arc<CallSessionManager>,
}

/// Domain error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::NotAllowed(_) => StatusCode::FORBIDDEN,
            DomainError::CallEnded(_) | DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::ValidationError(_) => StatusCode::BAD_REQUEST,
            DomainError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("API: request failed: {}", self.0);
        }
        let message = match &self.0 {
            DomainError::NotFound(m)
            | DomainError::NotAllowed(m)
            | DomainError::CallEnded(m)
            | DomainError::Conflict(m)
            | DomainError::ValidationError(m)
            | DomainError::Storage(m)
            | DomainError::Internal(m) => m.clone(),
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

/// Verified caller, taken from the `x-user-id` header
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| {
                DomainError::ValidationError(format!("Missing {} header", USER_ID_HEADER))
            })?
            .to_str()
            .map_err(|_| DomainError::ValidationError("Invalid user id".to_string()))?;

        let user = value
            .parse::<UserId>()
            .map_err(|_| DomainError::ValidationError(format!("Invalid user id: {}", value)))?;
        Ok(Self(user))
    }
}

fn parse_call_id(id: &str) -> Result<CallId, ApiError> {
    id.parse::<CallId>()
        .map_err(|_| ApiError(DomainError::ValidationError(format!("Invalid call ID: {}", id))))
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Start a call
pub async fn start_call(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    payload: Result<Json<StartCallRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CallResponse>>), ApiError> {
    let Json(req) = payload.map_err(|e| {
        DomainError::ValidationError(format!("Invalid request body: {}", e.body_text()))
    })?;
    info!("API: Starting call in group {} for {}", req.group, admin);

    let call = state
        .call_manager
        .start_call(admin, GroupId::from_uuid(req.group))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Call successfully started!", call.into())),
    ))
}

/// Get a call by ID
pub async fn get_call(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CallResponse> {
    let call_id = parse_call_id(&id)?;
    let call = state.call_manager.get_call(&call_id).await?;
    Ok(Json(ApiResponse::success(call.into())))
}

/// Join a call as a participant
pub async fn join_call(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<CallResponse> {
    let call_id = parse_call_id(&id)?;
    info!("API: {} joining call {}", user, call_id);

    let call = state.call_manager.join_call(user, &call_id).await?;
    Ok(Json(ApiResponse::with_message("Joined the call", call.into())))
}

/// Switch between participant and listener
pub async fn switch_participant_mode(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<CallResponse> {
    let call_id = parse_call_id(&id)?;
    info!("API: {} switching mode in call {}", user, call_id);

    let call = state
        .call_manager
        .switch_participant_mode(user, &call_id)
        .await?;
    Ok(Json(ApiResponse::with_message("Switched mode", call.into())))
}

/// Queue up to speak
pub async fn request_to_speak(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<CallResponse> {
    let call_id = parse_call_id(&id)?;
    info!("API: {} requesting to speak in call {}", user, call_id);

    let call = state.call_manager.request_to_speak(user, &call_id).await?;
    Ok(Json(ApiResponse::with_message("Added to the speaker queue", call.into())))
}

/// Advance the speaker queue (admin only)
pub async fn call_next_speaker(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<NextSpeakerResponse> {
    let call_id = parse_call_id(&id)?;
    info!("API: {} calling next speaker in call {}", admin, call_id);

    let next = state.call_manager.call_next_speaker(admin, &call_id).await?;
    let message = match next {
        NextSpeaker::Called(_) => "Next speaker called",
        NextSpeaker::QueueEmpty => "No more speakers in the queue",
    };

    Ok(Json(ApiResponse::with_message(
        message,
        NextSpeakerResponse {
            speaker: next.speaker(),
        },
    )))
}

/// Toggle the caller's mute flag
pub async fn mute_switch(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<MuteResponse> {
    let call_id = parse_call_id(&id)?;

    let is_muted = state.call_manager.mute_switch(user, &call_id).await?;
    Ok(Json(ApiResponse::with_message(
        format!("User {} mute status changed", user),
        MuteResponse { user, is_muted },
    )))
}

/// Leave a call
pub async fn leave_call(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<CallResponse> {
    let call_id = parse_call_id(&id)?;
    info!("API: {} leaving call {}", user, call_id);

    let call = state.call_manager.leave_call(user, &call_id).await?;
    Ok(Json(ApiResponse::with_message("Left the call", call.into())))
}

/// End a call (admin only)
pub async fn end_call(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let call_id = parse_call_id(&id)?;
    info!("API: {} ending call {}", admin, call_id);

    state.call_manager.end_call(admin, &call_id).await?;
    Ok(Json(ApiResponse::with_message("Call ended successfully", ())))
}

/// Health check endpoint
pub async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("OK"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DomainError::NotAllowed("x".into()), StatusCode::FORBIDDEN),
            (DomainError::CallEnded("x".into()), StatusCode::CONFLICT),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (DomainError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::Storage("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError(error).status(), status);
        }
    }

    #[test]
    fn test_parse_call_id_rejects_garbage() {
        let err = parse_call_id("not-a-call").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
