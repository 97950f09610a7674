use crate::logger::*;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

/// Opens the pool and brings the schema up to date.
pub async fn connect_mysql(dsn: &str, max_connections: u32) -> anyhow::Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(dsn)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!(max_connections, "mysql pool ready");

    Ok(pool)
}
