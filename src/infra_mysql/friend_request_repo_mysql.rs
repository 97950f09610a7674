use super::util::{downcast, is_dup_key, profile_from_row, uuid_column};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlFriendRequestRepo {
    pool: MySqlPool,
}

impl MySqlFriendRequestRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const REQUEST_COLUMNS: &str = "f.request_id, f.requester, f.recipient, f.status, \
     f.conversation_id, f.created_at, f.updated_at";

const ENTRY_COLUMNS: &str = "f.request_id, f.requester, f.recipient, f.status, \
     f.conversation_id, f.created_at, f.updated_at, \
     u.user_id AS friend_user_id, u.username AS friend_username, u.image AS friend_image";

fn store_err(e: impl std::fmt::Display) -> RelationError {
    RelationError::Store(e.to_string())
}

fn request_from_row(row: &MySqlRow) -> anyhow::Result<FriendRequest> {
    let status: String = row.try_get("status")?;
    let conversation_id: Option<Vec<u8>> = row.try_get("conversation_id")?;
    let conversation_id = conversation_id
        .map(|bytes| uuid::Uuid::from_slice(&bytes).map(ConversationId))
        .transpose()?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(FriendRequest {
        request_id: FriendRequestId(uuid_column(row, "request_id")?),
        requester: UserId(uuid_column(row, "requester")?),
        recipient: UserId(uuid_column(row, "recipient")?),
        status: status.parse().map_err(anyhow::Error::msg)?,
        conversation_id,
        created_at,
        updated_at,
    })
}

fn entry_from_row(row: &MySqlRow, viewer: UserId) -> anyhow::Result<FriendEntry> {
    let request = request_from_row(row)?;
    let friend = profile_from_row(row, "friend_")?;
    Ok(FriendEntry::from_request(&request, viewer, friend))
}

impl MySqlFriendRequestRepo {
    async fn fetch_entries(
        &self,
        sql: &str,
        user_id: UserId,
        binds: usize,
        what: &str,
    ) -> Result<Vec<FriendEntry>, RelationError> {
        let mut query = sqlx::query(sql);
        for _ in 0..binds {
            query = query.bind(user_id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_err(format!("{what}: {e}")))?;

        rows.iter()
            .map(|row| entry_from_row(row, user_id))
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(|e| store_err(format!("decode {what}: {e}")))
    }
}

#[async_trait::async_trait]
impl FriendRequestRepo for MySqlFriendRequestRepo {
    async fn insert_pending_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request: &FriendRequest,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx).map_err(store_err)?;
        let pair = request.pair();

        let res = sqlx::query(
            r#"
INSERT INTO friend_request
    (request_id, requester, recipient, user_min, user_max, status, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(request.request_id)
        .bind(request.requester)
        .bind(request.recipient)
        .bind(pair.min())
        .bind(pair.max())
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(tx.conn())
        .await;

        match res {
            Ok(_) => Ok(()),
            // lost the race on uq_friend_request_active_pair
            Err(e) if is_dup_key(&e) => Err(RelationError::Conflict(
                "an active friend request already exists".to_owned(),
            )),
            Err(e) => Err(store_err(format!("insert friend request: {e}"))),
        }
    }

    async fn find_active_by_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let tx = downcast(tx).map_err(store_err)?;

        let sql = format!(
            r#"
SELECT {REQUEST_COLUMNS}
FROM friend_request f
WHERE f.user_min = ? AND f.user_max = ?
  AND f.status IN ('pending', 'accepted')
"#
        );
        let row = sqlx::query(&sql)
            .bind(pair.min())
            .bind(pair.max())
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| store_err(format!("select active pair: {e}")))?;

        row.as_ref()
            .map(request_from_row)
            .transpose()
            .map_err(|e| store_err(format!("decode friend request: {e}")))
    }

    async fn get_for_update_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let tx = downcast(tx).map_err(store_err)?;

        let sql = format!(
            r#"
SELECT {REQUEST_COLUMNS}
FROM friend_request f
WHERE f.request_id = ?
FOR UPDATE
"#
        );
        let row = sqlx::query(&sql)
            .bind(request_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| store_err(format!("lock friend request: {e}")))?;

        row.as_ref()
            .map(request_from_row)
            .transpose()
            .map_err(|e| store_err(format!("decode friend request: {e}")))
    }

    async fn update_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request: &FriendRequest,
        expected: FriendRequestStatus,
    ) -> Result<bool, RelationError> {
        let tx = downcast(tx).map_err(store_err)?;

        let res = sqlx::query(
            r#"
UPDATE friend_request
SET status = ?, conversation_id = ?, updated_at = ?
WHERE request_id = ? AND status = ?
"#,
        )
        .bind(request.status.as_str())
        .bind(request.conversation_id)
        .bind(request.updated_at)
        .bind(request.request_id)
        .bind(expected.as_str())
        .execute(tx.conn())
        .await
        .map_err(|e| store_err(format!("update friend request: {e}")))?;

        Ok(res.rows_affected() == 1)
    }

    async fn list_incoming_pending(
        &self,
        user_id: UserId,
    ) -> Result<Vec<FriendEntry>, RelationError> {
        let sql = format!(
            r#"
SELECT {ENTRY_COLUMNS}
FROM friend_request f
JOIN user_profile u ON u.user_id = f.requester
WHERE f.recipient = ? AND f.status = 'pending'
ORDER BY f.created_at ASC, f.seq ASC
"#
        );
        self.fetch_entries(&sql, user_id, 1, "list incoming").await
    }

    async fn list_outgoing_pending(
        &self,
        user_id: UserId,
    ) -> Result<Vec<FriendEntry>, RelationError> {
        let sql = format!(
            r#"
SELECT {ENTRY_COLUMNS}
FROM friend_request f
JOIN user_profile u ON u.user_id = f.recipient
WHERE f.requester = ? AND f.status = 'pending'
ORDER BY f.created_at ASC, f.seq ASC
"#
        );
        self.fetch_entries(&sql, user_id, 1, "list outgoing").await
    }

    async fn list_accepted(&self, user_id: UserId) -> Result<Vec<FriendEntry>, RelationError> {
        let sql = format!(
            r#"
SELECT {ENTRY_COLUMNS}
FROM friend_request f
JOIN user_profile u ON u.user_id = IF(f.requester = ?, f.recipient, f.requester)
WHERE f.status = 'accepted'
  AND (f.requester = ? OR f.recipient = ?)
ORDER BY f.updated_at DESC, f.seq DESC
"#
        );
        self.fetch_entries(&sql, user_id, 3, "list accepted").await
    }
}
