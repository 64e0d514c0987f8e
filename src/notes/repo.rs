use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::notes::repo_types::Note;

/// Note store: owns every `Note` record and its owner list.
#[async_trait]
pub trait NoteRepo: Send + Sync {
    /// Every note regardless of owner.
    async fn get_all_notes(&self) -> anyhow::Result<Vec<Note>>;
    async fn get_notes_for_user(&self, username: &str) -> anyhow::Result<Vec<Note>>;
    async fn get_note(&self, note_id: &str) -> anyhow::Result<Option<Note>>;
    /// Insert, or fully replace the note with the same id when `requesting_user` already owns it.
    /// Notes without owners are refused.
    async fn save_note(&self, note: &Note, requesting_user: &str) -> anyhow::Result<bool>;
    async fn is_owner_of_note(&self, note_id: &str, username: &str) -> anyhow::Result<bool>;
    /// Appends `new_owner` when `requesting_user` already owns the note and `new_owner` does not.
    async fn add_owner_to_note(
        &self,
        note_id: &str,
        new_owner: &str,
        requesting_user: &str,
    ) -> anyhow::Result<bool>;
    /// Drops `username` from the owners, deleting the note when it was the last one.
    async fn delete_note_for_user(&self, username: &str, note_id: &str) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgNoteRepo {
    db: PgPool,
}

impl PgNoteRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NoteRepo for PgNoteRepo {
    async fn get_all_notes(&self) -> anyhow::Result<Vec<Note>> {
        let rows = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, title, content, date, owners, color
            FROM notes
            ORDER BY date DESC, id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list all notes")?;
        Ok(rows)
    }

    async fn get_notes_for_user(&self, username: &str) -> anyhow::Result<Vec<Note>> {
        let rows = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, title, content, date, owners, color
            FROM notes
            WHERE $1 = ANY(owners)
            ORDER BY date DESC, id
            "#,
        )
        .bind(username)
        .fetch_all(&self.db)
        .await
        .context("list notes by owner")?;
        Ok(rows)
    }

    async fn get_note(&self, note_id: &str) -> anyhow::Result<Option<Note>> {
        let row = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, title, content, date, owners, color
            FROM notes
            WHERE id = $1
            "#,
        )
        .bind(note_id)
        .fetch_optional(&self.db)
        .await
        .context("get note")?;
        Ok(row)
    }

    async fn save_note(&self, note: &Note, requesting_user: &str) -> anyhow::Result<bool> {
        if note.owners.is_empty() {
            return Ok(false);
        }
        // A conflicting row is only replaced when the requester owns it; otherwise 0 rows.
        let result = sqlx::query(
            r#"
            INSERT INTO notes (id, title, content, date, owners, color)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
               SET title = EXCLUDED.title,
                   content = EXCLUDED.content,
                   date = EXCLUDED.date,
                   owners = EXCLUDED.owners,
                   color = EXCLUDED.color
             WHERE $7 = ANY(notes.owners)
            "#,
        )
        .bind(&note.id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.date)
        .bind(&note.owners)
        .bind(&note.color)
        .bind(requesting_user)
        .execute(&self.db)
        .await
        .context("upsert note")?;
        Ok(result.rows_affected() == 1)
    }

    async fn is_owner_of_note(&self, note_id: &str, username: &str) -> anyhow::Result<bool> {
        let owned = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM notes WHERE id = $1 AND $2 = ANY(owners))"#,
        )
        .bind(note_id)
        .bind(username)
        .fetch_one(&self.db)
        .await
        .context("check note ownership")?;
        Ok(owned)
    }

    async fn add_owner_to_note(
        &self,
        note_id: &str,
        new_owner: &str,
        requesting_user: &str,
    ) -> anyhow::Result<bool> {
        // One conditional statement: membership checks and the append see the same row version.
        let result = sqlx::query(
            r#"
            UPDATE notes
               SET owners = array_append(owners, $2)
             WHERE id = $1
               AND $3 = ANY(owners)
               AND NOT ($2 = ANY(owners))
            "#,
        )
        .bind(note_id)
        .bind(new_owner)
        .bind(requesting_user)
        .execute(&self.db)
        .await
        .context("add note owner")?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_note_for_user(&self, username: &str, note_id: &str) -> anyhow::Result<bool> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let owners = sqlx::query_scalar::<_, Vec<String>>(
            r#"
            SELECT owners
              FROM notes
             WHERE id = $1 AND $2 = ANY(owners)
               FOR UPDATE
            "#,
        )
        .bind(note_id)
        .bind(username)
        .fetch_optional(&mut *tx)
        .await
        .context("lock note")?;

        let Some(owners) = owners else {
            return Ok(false);
        };

        let result = if owners.len() > 1 {
            sqlx::query(r#"UPDATE notes SET owners = array_remove(owners, $2) WHERE id = $1"#)
                .bind(note_id)
                .bind(username)
                .execute(&mut *tx)
                .await
                .context("remove note owner")?
        } else {
            sqlx::query(r#"DELETE FROM notes WHERE id = $1"#)
                .bind(note_id)
                .execute(&mut *tx)
                .await
                .context("delete note")?
        };

        tx.commit().await.context("commit tx")?;
        Ok(result.rows_affected() == 1)
    }
}

/// Process-local note store. Every mutation runs under one write guard.
#[derive(Default)]
pub struct MemoryNoteRepo {
    notes: RwLock<Vec<Note>>,
}

impl MemoryNoteRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut notes: Vec<Note>) -> Vec<Note> {
    notes.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
    notes
}

#[async_trait]
impl NoteRepo for MemoryNoteRepo {
    async fn get_all_notes(&self) -> anyhow::Result<Vec<Note>> {
        Ok(newest_first(self.notes.read().await.clone()))
    }

    async fn get_notes_for_user(&self, username: &str) -> anyhow::Result<Vec<Note>> {
        let notes = self.notes.read().await;
        Ok(newest_first(
            notes.iter().filter(|n| n.is_owned_by(username)).cloned().collect(),
        ))
    }

    async fn get_note(&self, note_id: &str) -> anyhow::Result<Option<Note>> {
        Ok(self.notes.read().await.iter().find(|n| n.id == note_id).cloned())
    }

    async fn save_note(&self, note: &Note, requesting_user: &str) -> anyhow::Result<bool> {
        if note.owners.is_empty() {
            return Ok(false);
        }
        let mut notes = self.notes.write().await;
        match notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) if existing.is_owned_by(requesting_user) => *existing = note.clone(),
            Some(_) => return Ok(false),
            None => notes.push(note.clone()),
        }
        Ok(true)
    }

    async fn is_owner_of_note(&self, note_id: &str, username: &str) -> anyhow::Result<bool> {
        let notes = self.notes.read().await;
        Ok(notes
            .iter()
            .any(|n| n.id == note_id && n.is_owned_by(username)))
    }

    async fn add_owner_to_note(
        &self,
        note_id: &str,
        new_owner: &str,
        requesting_user: &str,
    ) -> anyhow::Result<bool> {
        let mut notes = self.notes.write().await;
        let Some(note) = notes.iter_mut().find(|n| n.id == note_id) else {
            return Ok(false);
        };
        if !note.is_owned_by(requesting_user) || note.is_owned_by(new_owner) {
            return Ok(false);
        }
        note.owners.push(new_owner.to_owned());
        Ok(true)
    }

    async fn delete_note_for_user(&self, username: &str, note_id: &str) -> anyhow::Result<bool> {
        let mut notes = self.notes.write().await;
        let Some(pos) = notes
            .iter()
            .position(|n| n.id == note_id && n.is_owned_by(username))
        else {
            return Ok(false);
        };
        if notes[pos].owners.len() > 1 {
            notes[pos].owners.retain(|o| o != username);
        } else {
            notes.remove(pos);
        }
        Ok(true)
    }
}
