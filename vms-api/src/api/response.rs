//! Success envelope shared by JSON handlers

use serde::Serialize;

/// `{"status": "success", "message"?, "data"?}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: &str, data: T) -> Self {
        Self {
            status: "success",
            message: Some(message.to_string()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Message with no payload
    pub fn message(message: &str) -> Self {
        Self {
            status: "success",
            message: Some(message.to_string()),
            data: None,
        }
    }
}
