use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// JSON envelope shared by every API response body.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApiResponse;

    #[test]
    fn success_envelope_carries_data_without_message() {
        let value = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();

        assert_eq!(
            value,
            serde_json::json!({ "success": true, "data": [1, 2], "message": null })
        );
    }

    #[test]
    fn error_envelope_carries_message_without_data() {
        let value = serde_json::to_value(ApiResponse::<()>::error("Forbidden")).unwrap();

        assert_eq!(
            value,
            serde_json::json!({ "success": false, "data": null, "message": "Forbidden" })
        );
    }
}
