use serde::{Deserialize, Serialize};

/// Body returned by every MedShare REST endpoint on error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub message: Option<String>,
}

impl ErrorMessage {
    pub fn new(message: impl ToString) -> Self {
        ErrorMessage {
            message: Some(message.to_string()),
        }
    }
}

impl From<String> for ErrorMessage {
    fn from(message: String) -> Self {
        ErrorMessage::new(message)
    }
}
