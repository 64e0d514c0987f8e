use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    http::{internal, ApiJson},
    notes::{
        dto::{AddNoteRequest, AddOwnerRequest, DeleteNoteRequest, SimpleResponse},
        html::render_notes_page,
        repo_types::Note,
    },
    state::NotesState,
};

pub fn read_routes() -> Router<NotesState> {
    Router::new()
        .route("/notes", get(all_notes_page))
        .route("/getNotes", get(get_notes))
}

pub fn write_routes() -> Router<NotesState> {
    Router::new()
        .route("/addNote", post(add_note))
        .route("/deleteNote", post(delete_note))
        .route("/addOwnerToNote", post(add_owner_to_note))
}

/// Every note, unfiltered, for any authenticated caller.
#[instrument(skip(state, _user))]
pub async fn all_notes_page(
    State(state): State<NotesState>,
    _user: AuthUser,
) -> Result<Html<String>, (StatusCode, String)> {
    let notes = state.notes.get_all_notes().await.map_err(internal)?;
    Ok(Html(render_notes_page(&notes)))
}

#[instrument(skip(state, claims), fields(user = %claims.user_email))]
pub async fn get_notes(
    State(state): State<NotesState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<Note>>, (StatusCode, String)> {
    let notes = state
        .notes
        .get_notes_for_user(&claims.user_email)
        .await
        .map_err(internal)?;
    Ok(Json(notes))
}

#[instrument(skip(state, claims, payload), fields(user = %claims.user_email))]
pub async fn add_note(
    State(state): State<NotesState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<AddNoteRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let note = Note::new(
        payload.id,
        payload.title,
        payload.content,
        payload.date,
        payload.owners,
        payload.color,
    );
    if note.owners.is_empty() {
        warn!("note without owners rejected");
        return Err((StatusCode::CONFLICT, "A note needs at least one owner".into()));
    }

    if state
        .notes
        .save_note(&note, &claims.user_email)
        .await
        .map_err(internal)?
    {
        info!(note_id = %note.id, "note saved");
        Ok(StatusCode::OK)
    } else {
        warn!(note_id = %note.id, "replace of foreign note rejected");
        Err((StatusCode::CONFLICT, String::new()))
    }
}

#[instrument(skip(state, claims, payload), fields(user = %claims.user_email))]
pub async fn delete_note(
    State(state): State<NotesState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<DeleteNoteRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let removed = state
        .notes
        .delete_note_for_user(&claims.user_email, &payload.id)
        .await
        .map_err(internal)?;
    if removed {
        info!(note_id = %payload.id, "note released by user");
        Ok(StatusCode::OK)
    } else {
        warn!(note_id = %payload.id, "delete refused");
        Err((StatusCode::CONFLICT, String::new()))
    }
}

#[instrument(skip(state, claims, payload), fields(user = %claims.user_email))]
pub async fn add_owner_to_note(
    State(state): State<NotesState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<AddOwnerRequest>,
) -> Result<Json<SimpleResponse>, (StatusCode, String)> {
    if !state.users.user_exists(&payload.new_owner).await {
        return Ok(Json(SimpleResponse::new(
            false,
            "No user with this E-Mail exists",
        )));
    }

    let already = state
        .notes
        .is_owner_of_note(&payload.note_id, &payload.new_owner)
        .await
        .map_err(internal)?;
    if already {
        return Ok(Json(SimpleResponse::new(
            false,
            "This user is already an owner of this note",
        )));
    }

    let added = state
        .notes
        .add_owner_to_note(&payload.note_id, &payload.new_owner, &claims.user_email)
        .await
        .map_err(internal)?;
    if added {
        info!(note_id = %payload.note_id, new_owner = %payload.new_owner, "owner added");
        Ok(Json(SimpleResponse::new(
            true,
            format!("{} can now see this note", payload.new_owner),
        )))
    } else {
        warn!(note_id = %payload.note_id, "owner add refused");
        Err((StatusCode::CONFLICT, "Not an owner or unknown error".into()))
    }
}
