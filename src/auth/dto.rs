use serde::{Deserialize, Serialize};

/// Request body for both signup and signin.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

/// Response returned after a successful signin.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserExistsRequest {
    pub email: String,
}
