use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AddNoteRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    pub date: i64,
    pub owners: Vec<String>,
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct AddOwnerRequest {
    #[serde(rename = "noteID")]
    pub note_id: String,
    #[serde(rename = "newOwner")]
    pub new_owner: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteNoteRequest {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimpleResponse {
    pub success: bool,
    pub message: String,
}

impl SimpleResponse {
    pub fn new(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
        }
    }
}
