use super::util::{downcast, dup_key_name, is_dup_key, profile_from_row};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

pub struct MySqlUserRepo;

impl MySqlUserRepo {
    pub fn new() -> Self {
        MySqlUserRepo
    }
}

fn store_err(e: impl std::fmt::Display) -> UserError {
    UserError::Store(e.to_string())
}

/// Only the username index can collide once the row is ours.
fn upsert_err(e: sqlx::Error) -> UserError {
    if is_dup_key(&e) {
        UserError::UsernameTaken
    } else {
        store_err(format!("upsert profile: {e}"))
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn upsert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        profile: &UserProfile,
    ) -> Result<(), UserError> {
        let tx = downcast(tx).map_err(store_err)?;

        // Insert first: a gap-locking `SELECT … FOR UPDATE` miss lets two first
        // syncs for one user deadlock on their inserts.
        let inserted = sqlx::query(
            r#"
INSERT INTO user_profile (user_id, username, username_key, image)
VALUES (?, ?, ?, ?)
"#,
        )
        .bind(profile.user_id)
        .bind(profile.username.as_str())
        .bind(profile.username.key())
        .bind(profile.image.as_deref())
        .execute(tx.conn())
        .await;

        match inserted {
            Ok(_) => return Ok(()),
            // the user already has a row; fall through to update it
            Err(e) if dup_key_name(&e).as_deref() == Some("PRIMARY") => {}
            Err(e) => return Err(upsert_err(e)),
        }

        sqlx::query(
            r#"
UPDATE user_profile
SET username = ?, username_key = ?, image = ?
WHERE user_id = ?
"#,
        )
        .bind(profile.username.as_str())
        .bind(profile.username.key())
        .bind(profile.image.as_deref())
        .bind(profile.user_id)
        .execute(tx.conn())
        .await
        .map_err(upsert_err)?;

        Ok(())
    }

    async fn get_profile_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<UserProfile, UserError> {
        let tx = downcast(tx).map_err(store_err)?;

        let row = sqlx::query("SELECT user_id, username, image FROM user_profile WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| store_err(format!("query profile: {e}")))?
            .ok_or(UserError::NotFound)?;

        profile_from_row(&row, "").map_err(store_err)
    }

    async fn get_id_by_username_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        username: &Username,
    ) -> Result<UserId, UserError> {
        let tx = downcast(tx).map_err(store_err)?;

        let row = sqlx::query(
            "SELECT user_id, username, image FROM user_profile WHERE username_key = ?",
        )
        .bind(username.key())
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| store_err(format!("query user_id: {e}")))?
        .ok_or(UserError::NotFound)?;

        Ok(profile_from_row(&row, "").map_err(store_err)?.user_id)
    }
}
