use serde::{Deserialize, Serialize};

/// JWT payload carried by every bearer token this system issues.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String, // user ID
    #[serde(rename = "userEmail")]
    pub user_email: String, // username (email shaped)
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}

/// A single named string claim handed to the token issuer.
#[derive(Debug, Clone)]
pub struct TokenClaim {
    pub name: &'static str,
    pub value: String,
}

impl TokenClaim {
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Claim names owned by the issuer itself.
pub const REGISTERED_CLAIMS: [&str; 4] = ["iss", "aud", "iat", "exp"];
