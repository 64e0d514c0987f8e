use argon2::{
    password_hash::{Output, SaltString},
    Argon2, PasswordHasher,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

/// Password digest stored next to the salt it was derived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltedHash {
    pub hash: String,
    pub salt: String,
}

fn digest(plain: &str, salt: &SaltString) -> anyhow::Result<Output> {
    let hashed = Argon2::default()
        .hash_password(plain.as_bytes(), salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?;
    hashed
        .hash
        .ok_or_else(|| anyhow::anyhow!("argon2 produced no output"))
}

/// Draws a fresh salt from the OS RNG and hashes `plain` with it.
pub fn generate_salted_hash(plain: &str) -> anyhow::Result<SaltedHash> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = digest(plain, &salt)?;
    Ok(SaltedHash {
        hash: hash.to_string(),
        salt: salt.as_str().to_owned(),
    })
}

/// Recomputes the digest with the stored salt. Malformed stored values never match.
pub fn verify(plain: &str, stored: &SaltedHash) -> bool {
    let salt = match SaltString::from_b64(&stored.salt) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "stored salt is malformed");
            return false;
        }
    };
    let expected = match Output::b64_decode(&stored.hash) {
        Ok(o) => o,
        Err(e) => {
            warn!(error = %e, "stored hash is malformed");
            return false;
        }
    };
    match digest(plain, &salt) {
        // Output's PartialEq is constant-time.
        Ok(actual) => actual == expected,
        Err(_) => false,
    }
}
