use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo::{PgUserRepo, UserRepo};
use crate::config::{AppConfig, UserServiceConfig};
use crate::notes::repo::{NoteRepo, PgNoteRepo};
use crate::notes::users::{HttpUserExistenceChecker, UserExistenceChecker};

#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<dyn UserRepo>,
    pub config: Arc<AppConfig>,
}

impl AuthState {
    pub fn init(db: PgPool, config: Arc<AppConfig>) -> Self {
        let users = Arc::new(PgUserRepo::new(db)) as Arc<dyn UserRepo>;
        Self::from_parts(users, config)
    }

    pub fn from_parts(users: Arc<dyn UserRepo>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }
}

#[derive(Clone)]
pub struct NotesState {
    pub notes: Arc<dyn NoteRepo>,
    pub users: Arc<dyn UserExistenceChecker>,
    pub config: Arc<AppConfig>,
}

impl NotesState {
    pub fn init(
        db: PgPool,
        config: Arc<AppConfig>,
        user_service: &UserServiceConfig,
    ) -> anyhow::Result<Self> {
        let notes = Arc::new(PgNoteRepo::new(db)) as Arc<dyn NoteRepo>;
        let users = Arc::new(HttpUserExistenceChecker::new(
            &user_service.base_url,
            user_service.timeout(),
        )?) as Arc<dyn UserExistenceChecker>;
        Ok(Self::from_parts(notes, users, config))
    }

    pub fn from_parts(
        notes: Arc<dyn NoteRepo>,
        users: Arc<dyn UserExistenceChecker>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            notes,
            users,
            config,
        }
    }
}

impl FromRef<AuthState> for JwtKeys {
    fn from_ref(state: &AuthState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl FromRef<NotesState> for JwtKeys {
    fn from_ref(state: &NotesState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}
