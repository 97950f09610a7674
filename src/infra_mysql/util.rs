use super::repo_tx_mysql::MySqlTx;
use crate::domain_model::*;
use crate::domain_port::*;
use anyhow::anyhow;
use sqlx::mysql::{MySqlDatabaseError, MySqlRow};
use sqlx::Row;
use uuid::Uuid;

pub fn downcast(tx: &mut dyn StorageTx) -> anyhow::Result<&mut MySqlTx> {
    tx.downcast_mut::<MySqlTx>()
        .ok_or_else(|| anyhow!("transaction does not belong to the mysql store"))
}

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == 1062; // ER_DUP_ENTRY
        }
    }

    false
}

/// Name of the unique index a duplicate-key error hit, without the table prefix
/// MySQL 8 adds (`user_profile.PRIMARY` -> `PRIMARY`).
pub fn dup_key_name(err: &sqlx::Error) -> Option<String> {
    if !is_dup_key(err) {
        return None;
    }
    match err {
        sqlx::Error::Database(db) => violated_key(db.message()).map(str::to_string),
        _ => None,
    }
}

fn violated_key(message: &str) -> Option<&str> {
    let (_, rest) = message.rsplit_once("for key '")?;
    let key = rest.strip_suffix('\'')?;
    Some(key.rsplit_once('.').map_or(key, |(_, name)| name))
}

pub fn uuid_column(row: &MySqlRow, column: &str) -> anyhow::Result<Uuid> {
    let bytes: Vec<u8> = row.try_get(column)?;
    Ok(Uuid::from_slice(&bytes)?)
}

pub fn profile_from_row(row: &MySqlRow, prefix: &str) -> anyhow::Result<UserProfile> {
    let user_id = UserId(uuid_column(row, &format!("{prefix}user_id"))?);
    let username: String = row.try_get(format!("{prefix}username").as_str())?;
    let image: Option<String> = row.try_get(format!("{prefix}image").as_str())?;

    Ok(UserProfile {
        user_id,
        username: Username::parse(&username)?,
        image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violated_key_strips_table_prefix() {
        assert_eq!(
            violated_key("Duplicate entry 'x' for key 'user_profile.PRIMARY'"),
            Some("PRIMARY")
        );
        assert_eq!(
            violated_key("Duplicate entry 'bob' for key 'user_profile.uq_user_profile_username_key'"),
            Some("uq_user_profile_username_key")
        );
    }

    #[test]
    fn violated_key_accepts_unprefixed_names() {
        assert_eq!(
            violated_key("Duplicate entry 'x' for key 'PRIMARY'"),
            Some("PRIMARY")
        );
        assert_eq!(violated_key("Deadlock found when trying to get lock"), None);
    }
}
