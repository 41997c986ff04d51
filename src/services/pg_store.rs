//! Postgres-backed `ChatStore`.
//!
//! DESIGN
//! ======
//! Timestamps are epoch milliseconds produced by the database (`now_ms()`),
//! so message order follows commit-time clocks rather than app-server
//! clocks. The `seq` identity column breaks ties between messages created in
//! the same millisecond.
//!
//! CONCURRENCY
//! ===========
//! - Pair uniqueness is enforced by a unique index over
//!   `LEAST/GREATEST(user1_id, user2_id)`; racing creators both fall through
//!   `ON CONFLICT DO NOTHING` to the same re-select.
//! - `append_message` runs the participant-checked insert and the summary
//!   update in one transaction. Both summary columns are written by one
//!   `UPDATE`, so concurrent senders resolve last-write-wins without mixing
//!   one message's text with another's timestamp.

use frames::{ChatSummary, UserSummary};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::store::{
    Chat, ChatError, ChatStore, Message, Recipient, User, ensure_distinct_users, normalize_username, summary_text,
};

const CHAT_COLUMNS: &str = "id, user1_id, user2_id, last_message, last_message_timestamp, created_at, updated_at";

pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_chat_by_pair(&self, user1_id: Uuid, user2_id: Uuid) -> Result<Option<Chat>, ChatError> {
        let row = sqlx::query(&format!(
            "SELECT {CHAT_COLUMNS}
             FROM chats
             WHERE LEAST(user1_id, user2_id) = LEAST($1::uuid, $2::uuid)
               AND GREATEST(user1_id, user2_id) = GREATEST($1::uuid, $2::uuid)"
        ))
        .bind(user1_id)
        .bind(user2_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(chat_from_row))
    }
}

fn chat_from_row(r: &PgRow) -> Chat {
    Chat {
        id: r.get("id"),
        user1_id: r.get("user1_id"),
        user2_id: r.get("user2_id"),
        last_message: r.get("last_message"),
        last_message_timestamp: r.get("last_message_timestamp"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

fn user_from_row(r: &PgRow) -> User {
    User {
        id: r.get("id"),
        username: r.get("username"),
        push_token: r.get("push_token"),
        created_at: r.get("created_at"),
    }
}

#[async_trait::async_trait]
impl ChatStore for PgChatStore {
    async fn create_user(&self, username: &str) -> Result<User, ChatError> {
        let username = normalize_username(username)?;
        let result = sqlx::query(
            "INSERT INTO users (id, username) VALUES ($1, $2)
             RETURNING id, username, push_token, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(user_from_row(&row)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(ChatError::UsernameTaken(username.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, user_id: Uuid) -> Result<User, ChatError> {
        let row = sqlx::query("SELECT id, username, push_token, created_at FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(user_from_row)
            .ok_or_else(|| ChatError::UsersNotFound(vec![user_id]))
    }

    async fn set_push_token(&self, user_id: Uuid, token: Option<&str>) -> Result<(), ChatError> {
        let result = sqlx::query("UPDATE users SET push_token = $2 WHERE id = $1")
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ChatError::UsersNotFound(vec![user_id]));
        }
        Ok(())
    }

    async fn find_participant_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Chat, ChatError> {
        let row = sqlx::query(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1 AND (user1_id = $2 OR user2_id = $2)"
        ))
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(chat_from_row).ok_or(ChatError::NotFound)
    }

    async fn find_or_create_chat(&self, user1_id: Uuid, user2_id: Uuid) -> Result<Chat, ChatError> {
        ensure_distinct_users(user1_id, user2_id)?;

        if let Some(chat) = self.find_chat_by_pair(user1_id, user2_id).await? {
            return Ok(chat);
        }

        let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = ANY($1)")
            .bind(vec![user1_id, user2_id])
            .fetch_all(&self.pool)
            .await?;
        let missing: Vec<Uuid> = [user1_id, user2_id]
            .into_iter()
            .filter(|id| !found.contains(id))
            .collect();
        if !missing.is_empty() {
            return Err(ChatError::UsersNotFound(missing));
        }

        sqlx::query("INSERT INTO chats (id, user1_id, user2_id) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING")
            .bind(Uuid::new_v4())
            .bind(user1_id)
            .bind(user2_id)
            .execute(&self.pool)
            .await?;

        // Whether we inserted or lost a race, the pair now has exactly one chat.
        self.find_chat_by_pair(user1_id, user2_id)
            .await?
            .ok_or(ChatError::NotFound)
    }

    async fn list_chats_for_user(&self, user_id: Uuid) -> Result<Vec<ChatSummary>, ChatError> {
        let rows = sqlx::query(
            "SELECT c.id, c.last_message, c.last_message_timestamp, c.created_at, c.updated_at,
                    u.id AS other_id, u.username AS other_username
             FROM chats c
             JOIN users u ON u.id = CASE WHEN c.user1_id = $1 THEN c.user2_id ELSE c.user1_id END
             WHERE c.user1_id = $1 OR c.user2_id = $1
             ORDER BY c.last_message_timestamp DESC NULLS LAST, c.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| ChatSummary {
                id: r.get("id"),
                other_user: UserSummary { id: r.get("other_id"), username: r.get("other_username") },
                last_message: r.get("last_message"),
                last_message_timestamp: r.get("last_message_timestamp"),
                created_at: r.get("created_at"),
                updated_at: r.get("updated_at"),
            })
            .collect())
    }

    async fn append_message(&self, chat_id: Uuid, sender_id: Uuid, content: &str) -> Result<Message, ChatError> {
        let mut tx = self.pool.begin().await?;

        // Participant check and insert in one statement: no row, no message.
        let inserted = sqlx::query_as::<_, (Uuid, i64)>(
            "INSERT INTO messages (id, chat_id, sender_id, content)
             SELECT $1, c.id, $3, $4
             FROM chats c
             WHERE c.id = $2 AND (c.user1_id = $3 OR c.user2_id = $3)
             RETURNING id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(chat_id)
        .bind(sender_id)
        .bind(content)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((id, created_at)) = inserted else {
            // Dropping the transaction rolls it back.
            return Err(ChatError::NotFound);
        };

        sqlx::query(
            "UPDATE chats
             SET last_message = $2, last_message_timestamp = $3, updated_at = $3
             WHERE id = $1",
        )
        .bind(chat_id)
        .bind(summary_text(content))
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Message { id, chat_id, sender_id, content: content.to_owned(), created_at })
    }

    async fn list_messages(&self, chat_id: Uuid, user_id: Uuid) -> Result<Vec<Message>, ChatError> {
        self.find_participant_chat(chat_id, user_id).await?;

        let rows = sqlx::query_as::<_, (Uuid, Uuid, Uuid, String, i64)>(
            "SELECT id, chat_id, sender_id, content, created_at
             FROM messages
             WHERE chat_id = $1
             ORDER BY created_at ASC, seq ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, chat_id, sender_id, content, created_at)| Message { id, chat_id, sender_id, content, created_at })
            .collect())
    }

    async fn recipient_for_chat(&self, chat_id: Uuid, sender_id: Uuid) -> Result<Option<Recipient>, ChatError> {
        let row = sqlx::query(
            "SELECT r.id AS recipient_id, r.push_token, s.username AS sender_username
             FROM chats c
             JOIN users r ON r.id = CASE WHEN c.user1_id = $2 THEN c.user2_id ELSE c.user1_id END
             JOIN users s ON s.id = $2
             WHERE c.id = $1 AND (c.user1_id = $2 OR c.user2_id = $2)",
        )
        .bind(chat_id)
        .bind(sender_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Recipient {
            user_id: r.get("recipient_id"),
            push_token: r.get("push_token"),
            sender_username: r.get("sender_username"),
        }))
    }
}

#[cfg(test)]
#[path = "pg_store_test.rs"]
mod tests;
