//! Call API data transfer objects

use crate::domain::calling::Call;
use crate::domain::shared::value_objects::{CallId, GroupId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Request to start a call in a circle
#[derive(Debug, Deserialize)]
pub struct StartCallRequest {
    pub group: Uuid,
}

/// Call response
#[derive(Debug, Serialize, Deserialize)]
pub struct CallResponse {
    pub id: CallId,
    pub group: GroupId,
    pub admin: UserId,
    pub participants: Vec<UserId>,
    pub listeners: Vec<UserId>,
    pub speaker_queue: Vec<UserId>,
    pub is_muted: BTreeMap<UserId, bool>,
    pub is_ongoing: bool,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<Call> for CallResponse {
    fn from(call: Call) -> Self {
        Self {
            id: *call.id(),
            group: *call.group(),
            admin: *call.admin(),
            participants: call.participants().iter().copied().collect(),
            listeners: call.listeners().iter().copied().collect(),
            speaker_queue: call.speaker_queue().iter().copied().collect(),
            is_muted: call.mute_flags().clone(),
            is_ongoing: call.is_ongoing(),
            created_at: call.created_at(),
            ended_at: call.ended_at(),
        }
    }
}

/// Mute toggle response
#[derive(Debug, Serialize, Deserialize)]
pub struct MuteResponse {
    pub user: UserId,
    pub is_muted: bool,
}

/// Speaker queue advance response; `speaker` is absent when the queue was empty
#[derive(Debug, Serialize, Deserialize)]
pub struct NextSpeakerResponse {
    pub speaker: Option<UserId>,
}

/// Generic API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_response_from_call() {
        let admin = UserId::new();
        let mut call = Call::new(CallId::new(), GroupId::new(), admin);
        let user = UserId::new();
        call.join(user).unwrap();
        call.request_to_speak(user).unwrap();

        let response = CallResponse::from(call);
        assert_eq!(response.admin, admin);
        assert_eq!(response.participants, vec![user]);
        assert_eq!(response.speaker_queue, vec![user]);
        assert!(response.listeners.is_empty());
        assert!(response.is_ongoing);
    }

    #[test]
    fn test_error_response_skips_empty_fields() {
        let response: ApiResponse<()> = ApiResponse::error("Call x does not exist".to_string());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Call x does not exist");
        assert!(json.get("data").is_none());
        assert!(json.get("message").is_none());
    }
}
