use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::auth::{dto::UserExistsRequest, repo::UserRepo};

/// Answers whether a username belongs to a registered user.
///
/// Failures of any kind answer `false`: a note is never shared with someone
/// the credential store could not vouch for.
#[async_trait]
pub trait UserExistenceChecker: Send + Sync {
    async fn user_exists(&self, email: &str) -> bool;
}

/// Asks the auth service's `GET /userExists` over HTTP, bounded by a client timeout.
#[derive(Clone)]
pub struct HttpUserExistenceChecker {
    http: reqwest::Client,
    url: String,
}

impl HttpUserExistenceChecker {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .context("build user-check http client")?;
        Ok(Self {
            http,
            url: format!("{}/userExists", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl UserExistenceChecker for HttpUserExistenceChecker {
    async fn user_exists(&self, email: &str) -> bool {
        let body = UserExistsRequest {
            email: email.to_owned(),
        };
        match self.http.get(&self.url).json(&body).send().await {
            Ok(resp) => {
                debug!(status = %resp.status(), "user existence answered");
                resp.status().is_success()
            }
            Err(e) if e.is_timeout() => {
                warn!(url = %self.url, "user existence check timed out");
                false
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "user existence check failed");
                false
            }
        }
    }
}

/// Checks a credential store directly when both services share a process.
#[derive(Clone)]
pub struct RepoUserExistence {
    users: Arc<dyn UserRepo>,
}

impl RepoUserExistence {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserExistenceChecker for RepoUserExistence {
    async fn user_exists(&self, email: &str) -> bool {
        match self.users.user_exists(email).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "user existence lookup failed");
                false
            }
        }
    }
}
