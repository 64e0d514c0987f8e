use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthRequest, AuthResponse, UserExistsRequest},
        jwt::{AuthUser, JwtKeys},
        password::{generate_salted_hash, verify},
        repo_types::User,
    },
    http::{internal, ApiJson},
    state::AuthState,
};

const BAD_CREDENTIALS: &str = "Incorrect username or password";

pub fn auth_routes() -> Router<AuthState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/userExists", get(user_exists))
}

pub fn session_routes() -> Router<AuthState> {
    Router::new()
        .route("/authenticate", get(authenticate))
        .route("/secret", get(secret))
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^(.+)@(.+)$").unwrap();
    }
    EMAIL_RE.is_match(username)
}

/// Blank, short and badly shaped input all get the same answer.
pub(crate) fn is_valid_signup(req: &AuthRequest) -> bool {
    let blank = req.password.trim().is_empty();
    let too_short = req.password.chars().count() < 8;
    is_valid_username(&req.username) && !blank && !too_short
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AuthState>,
    ApiJson(payload): ApiJson<AuthRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if !is_valid_signup(&payload) {
        warn!("signup rejected: invalid data");
        return Err((StatusCode::CONFLICT, "Invalid data".into()));
    }

    let salted = generate_salted_hash(&payload.password).map_err(internal)?;
    let user = User::new(payload.username, salted);

    let acknowledged = state.users.insert_user(&user).await.map_err(internal)?;
    if !acknowledged {
        warn!(username = %user.username, "signup rejected: username taken");
        return Err((StatusCode::CONFLICT, "Could not create user".into()));
    }

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(StatusCode::OK)
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AuthState>,
    ApiJson(payload): ApiJson<AuthRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let user = match state.users.get_user_by_username(&payload.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(username = %payload.username, "signin unknown username");
            return Err((StatusCode::CONFLICT, BAD_CREDENTIALS.into()));
        }
        Err(e) => return Err(internal(e)),
    };

    if !verify(&payload.password, &user.salted_hash()) {
        warn!(user_id = %user.id, "signin invalid password");
        return Err((StatusCode::CONFLICT, BAD_CREDENTIALS.into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_user(&user).map_err(internal)?;

    info!(user_id = %user.id, "user signed in");
    Ok(Json(AuthResponse { token }))
}

/// Email may arrive as `?email=` or as a JSON body.
#[instrument(skip(state, query, body))]
pub async fn user_exists(
    State(state): State<AuthState>,
    query: Option<Query<UserExistsRequest>>,
    body: Option<Json<UserExistsRequest>>,
) -> Result<StatusCode, (StatusCode, String)> {
    let email = match (query, body) {
        (Some(Query(q)), _) => q.email,
        (None, Some(Json(b))) => b.email,
        (None, None) => return Err((StatusCode::BAD_REQUEST, "Missing email".into())),
    };

    if state.users.user_exists(&email).await.map_err(internal)? {
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

pub async fn authenticate(AuthUser(_claims): AuthUser) -> StatusCode {
    StatusCode::OK
}

pub async fn secret(AuthUser(claims): AuthUser) -> String {
    format!(
        "Your userId is {} with email {}",
        claims.user_id, claims.user_email
    )
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{app::build_auth_app, state::fake};

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(resp: axum::response::Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn creds(username: &str, password: &str) -> Value {
        json!({ "username": username, "password": password })
    }

    #[test]
    fn signup_validation_rules() {
        let req = |u: &str, p: &str| AuthRequest {
            username: u.into(),
            password: p.into(),
        };
        assert!(is_valid_signup(&req("u1@test.com", "password1")));
        assert!(is_valid_signup(&req("a@b", "12345678")));
        assert!(!is_valid_signup(&req("no-at-sign", "password1")));
        assert!(!is_valid_signup(&req("@test.com", "password1")));
        assert!(!is_valid_signup(&req("u1@", "password1")));
        assert!(!is_valid_signup(&req("u1@test.com", "short")));
        assert!(!is_valid_signup(&req("u1@test.com", "          ")));
        assert!(!is_valid_signup(&req("u1@test.com", "")));
    }

    #[tokio::test]
    async fn signup_signin_flow() {
        let (auth, _) = fake::states();
        let app = build_auth_app(auth);

        let resp = app
            .clone()
            .oneshot(post_json("/signup", creds("u1@test.com", "password1")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.is_empty());

        let resp = app
            .clone()
            .oneshot(post_json("/signin", creds("u1@test.com", "password1")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
        let token = body["token"].as_str().unwrap();
        assert!(!token.is_empty());

        let resp = app
            .clone()
            .oneshot(post_json("/signin", creds("u1@test.com", "password2")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(body_text(resp).await, BAD_CREDENTIALS);

        let resp = app
            .clone()
            .oneshot(post_json("/signup", creds("u1@test.com", "password1")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_user_and_bad_password_look_the_same() {
        let (auth, _) = fake::states();
        let app = build_auth_app(auth);
        app.clone()
            .oneshot(post_json("/signup", creds("u1@test.com", "password1")))
            .await
            .unwrap();

        let unknown = app
            .clone()
            .oneshot(post_json("/signin", creds("ghost@test.com", "password1")))
            .await
            .unwrap();
        let wrong = app
            .oneshot(post_json("/signin", creds("u1@test.com", "nope-nope")))
            .await
            .unwrap();
        assert_eq!(unknown.status(), wrong.status());
        assert_eq!(body_text(unknown).await, body_text(wrong).await);
    }

    #[tokio::test]
    async fn signup_rejects_invalid_data_with_conflict() {
        let (auth, _) = fake::states();
        let app = build_auth_app(auth);
        let resp = app
            .oneshot(post_json("/signup", creds("not-an-email", "password1")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(body_text(resp).await, "Invalid data");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (auth, _) = fake::states();
        let app = build_auth_app(auth);

        let resp = app
            .clone()
            .oneshot(post_json("/signup", json!({ "username": "u1@test.com" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/signin")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn user_exists_by_query_or_body() {
        let (auth, _) = fake::states();
        let app = build_auth_app(auth);
        app.clone()
            .oneshot(post_json("/signup", creds("u1@test.com", "password1")))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/userExists?email=u1@test.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let mut req = post_json("/userExists", json!({ "email": "ghost@test.com" }));
        *req.method_mut() = axum::http::Method::GET;
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .oneshot(Request::builder().uri("/userExists").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn protected_routes_need_a_valid_token() {
        let (auth, _) = fake::states();
        let app = build_auth_app(auth);
        app.clone()
            .oneshot(post_json("/signup", creds("u1@test.com", "password1")))
            .await
            .unwrap();
        let resp = app
            .clone()
            .oneshot(post_json("/signin", creds("u1@test.com", "password1")))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
        let token = body["token"].as_str().unwrap().to_owned();

        let resp = app
            .clone()
            .oneshot(get_with_token("/authenticate", &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .clone()
            .oneshot(get_with_token("/secret", &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let text = body_text(resp).await;
        assert!(text.starts_with("Your userId is "));
        assert!(text.ends_with("with email u1@test.com"));

        let resp = app
            .clone()
            .oneshot(get_with_token("/authenticate", "garbage"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app
            .oneshot(Request::builder().uri("/secret").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
