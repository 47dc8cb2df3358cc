//! SqliteBookingStore - BookingStore trait implementation for SQLite

use async_trait::async_trait;
use sqlx::sqlite::{
    Sqlite, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteSynchronous,
};
use sqlx::{SqliteConnection, Transaction};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use staydesk_core::{
    Booking, BookingStatus, BookingStore, Error, Payment, Record, ResourceKind, Result,
    booking_store::{decode, payable_booking, record_id},
    tenant::{TenantId, partition_key},
};

/// Schema version written by this build
pub const SCHEMA_VERSION: i32 = 1;

/// SQLite-backed booking store
///
/// Safe to share across tasks; the pool hands out connections per call.
#[derive(Clone)]
pub struct SqliteBookingStore {
    pool: SqlitePool,
}

impl SqliteBookingStore {
    /// Open (creating if missing) the database at `path`
    ///
    /// A leading `~` is expanded to the home directory.
    ///
    /// # Errors
    /// - `Error::Io` if the parent directory cannot be created
    /// - `Error::Database` if the connection or schema setup fails
    pub async fn new(path: impl Into<PathBuf>, max_connections: u32) -> Result<Self> {
        let path = expand_tilde(path.into());
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(&path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal)
                    .busy_timeout(Duration::from_secs(5)),
            )
            .await
            .map_err(|e| Error::Database(format!("Failed to open {}: {}", path.display(), e)))?;

        let store = Self { pool };
        store.initialize_schema().await?;

        let version = store.schema_version().await?;
        if version != SCHEMA_VERSION {
            return Err(Error::Database(format!(
                "Unsupported schema version: {}",
                version
            )));
        }

        info!(path = %path.display(), "Opened SQLite booking store");
        Ok(store)
    }

    /// Currently recorded schema version
    pub async fn schema_version(&self) -> Result<i32> {
        sqlx::query_scalar::<_, i32>("SELECT MAX(version) FROM schema_version")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
            .bind(SCHEMA_VERSION)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                partition TEXT NOT NULL,
                kind TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (partition, kind, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_records_room ON records(partition, kind, json_extract(body, '$.room_id'))",
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    /// Open a transaction holding the database write lock
    ///
    /// Dropping the transaction without committing rolls it back, so a
    /// cancelled request never returns a connection mid-transaction.
    async fn begin_immediate(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool.begin_with("BEGIN IMMEDIATE").await.map_err(db_err)
    }
}

fn db_err(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}

fn expand_tilde(path: PathBuf) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string())
}

fn parse_body(body: &str) -> Result<Record> {
    Ok(serde_json::from_str(body)?)
}

fn conflict_error(booking: &Booking) -> Error {
    Error::Conflict {
        room_id: booking.room_id.clone(),
        check_in: booking.check_in,
        check_out: booking.check_out,
    }
}

async fn fetch_booking(
    conn: &mut SqliteConnection,
    partition: &str,
    id: &str,
) -> Result<Option<Booking>> {
    let body: Option<String> = sqlx::query_scalar(
        "SELECT body FROM records WHERE partition = ? AND kind = ? AND id = ?",
    )
    .bind(partition)
    .bind(ResourceKind::Bookings.as_str())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_err)?;
    body.map(|b| decode(parse_body(&b)?)).transpose()
}

async fn fetch_room_bookings(
    conn: &mut SqliteConnection,
    partition: &str,
    room_id: &str,
) -> Result<Vec<Booking>> {
    let bodies: Vec<String> = sqlx::query_scalar(
        "SELECT body FROM records WHERE partition = ? AND kind = ? AND json_extract(body, '$.room_id') = ? ORDER BY id",
    )
    .bind(partition)
    .bind(ResourceKind::Bookings.as_str())
    .bind(room_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    bodies
        .iter()
        .map(|b| decode(parse_body(b)?))
        .collect()
}

async fn ensure_no_conflict(
    conn: &mut SqliteConnection,
    partition: &str,
    booking: &Booking,
) -> Result<()> {
    let existing = fetch_room_bookings(conn, partition, &booking.room_id).await?;
    if existing.iter().any(|other| other.conflicts_with(booking)) {
        return Err(conflict_error(booking));
    }
    Ok(())
}

async fn write_booking(
    conn: &mut SqliteConnection,
    partition: &str,
    booking: &Booking,
) -> Result<()> {
    let body = serde_json::to_string(booking)?;
    sqlx::query(
        r#"
        INSERT INTO records (partition, kind, id, body) VALUES (?, ?, ?, ?)
        ON CONFLICT (partition, kind, id) DO UPDATE SET body = excluded.body, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(partition)
    .bind(ResourceKind::Bookings.as_str())
    .bind(&booking.id)
    .bind(body)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(())
}

async fn insert_booking_locked(
    conn: &mut SqliteConnection,
    partition: &str,
    booking: &Booking,
) -> Result<()> {
    if fetch_booking(conn, partition, &booking.id).await?.is_some() {
        return Err(Error::Domain(format!("Booking {} already exists", booking.id)));
    }
    ensure_no_conflict(conn, partition, booking).await?;
    write_booking(conn, partition, booking).await
}

async fn update_booking_locked(
    conn: &mut SqliteConnection,
    partition: &str,
    booking: &Booking,
    expected_status: BookingStatus,
) -> Result<()> {
    let current = fetch_booking(conn, partition, &booking.id)
        .await?
        .ok_or_else(|| Error::not_found("Booking", &booking.id))?;
    if current.status != expected_status {
        return Err(Error::Domain(format!(
            "Booking {} is {}, expected {}",
            booking.id, current.status, expected_status
        )));
    }
    ensure_no_conflict(conn, partition, booking).await?;
    write_booking(conn, partition, booking).await
}

async fn insert_payment_locked(
    conn: &mut SqliteConnection,
    partition: &str,
    payment: &Payment,
) -> Result<Booking> {
    let booking = payable_booking(
        fetch_booking(conn, partition, &payment.booking_id).await?,
        &payment.booking_id,
    )?;
    let result = sqlx::query(
        "INSERT OR IGNORE INTO records (partition, kind, id, body) VALUES (?, ?, ?, ?)",
    )
    .bind(partition)
    .bind(ResourceKind::Payments.as_str())
    .bind(&payment.id)
    .bind(serde_json::to_string(payment)?)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    if result.rows_affected() == 0 {
        return Err(Error::Domain(format!("Payment {} already exists", payment.id)));
    }
    Ok(booking)
}

async fn replace_payment_locked(
    conn: &mut SqliteConnection,
    partition: &str,
    payment: &Payment,
) -> Result<Booking> {
    let exists: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM records WHERE partition = ? AND kind = ? AND id = ?",
    )
    .bind(partition)
    .bind(ResourceKind::Payments.as_str())
    .bind(&payment.id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_err)?;
    if exists.is_none() {
        return Err(Error::not_found("Payment", &payment.id));
    }

    let booking = payable_booking(
        fetch_booking(conn, partition, &payment.booking_id).await?,
        &payment.booking_id,
    )?;
    sqlx::query(
        "UPDATE records SET body = ?, updated_at = CURRENT_TIMESTAMP WHERE partition = ? AND kind = ? AND id = ?",
    )
    .bind(serde_json::to_string(payment)?)
    .bind(partition)
    .bind(ResourceKind::Payments.as_str())
    .bind(&payment.id)
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(booking)
}

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn list_records(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
    ) -> Result<Vec<Record>> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM records WHERE partition = ? AND kind = ? ORDER BY id",
        )
        .bind(partition_key(tenant_id))
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        bodies.iter().map(|b| parse_body(b)).collect()
    }

    async fn get_record(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
        id: &str,
    ) -> Result<Option<Record>> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM records WHERE partition = ? AND kind = ? AND id = ?",
        )
        .bind(partition_key(tenant_id))
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        body.map(|b| parse_body(&b)).transpose()
    }

    async fn insert_record(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
        record: Record,
    ) -> Result<Record> {
        let id = record_id(&record)?;
        let result = sqlx::query(
            "INSERT OR IGNORE INTO records (partition, kind, id, body) VALUES (?, ?, ?, ?)",
        )
        .bind(partition_key(tenant_id))
        .bind(kind.as_str())
        .bind(id)
        .bind(serde_json::to_string(&record)?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(Error::Domain(format!(
                "{} {} already exists",
                kind.label(),
                id
            )));
        }
        Ok(record)
    }

    async fn replace_record(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
        id: &str,
        record: Record,
    ) -> Result<Record> {
        let result = sqlx::query(
            "UPDATE records SET body = ?, updated_at = CURRENT_TIMESTAMP WHERE partition = ? AND kind = ? AND id = ?",
        )
        .bind(serde_json::to_string(&record)?)
        .bind(partition_key(tenant_id))
        .bind(kind.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(kind.label(), id));
        }
        Ok(record)
    }

    async fn delete_record(
        &self,
        tenant_id: Option<&TenantId>,
        kind: ResourceKind,
        id: &str,
    ) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM records WHERE partition = ? AND kind = ? AND id = ?")
                .bind(partition_key(tenant_id))
                .bind(kind.as_str())
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(kind.label(), id));
        }
        Ok(())
    }

    async fn room_bookings(
        &self,
        tenant_id: Option<&TenantId>,
        room_id: &str,
    ) -> Result<Vec<Booking>> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_room_bookings(&mut conn, partition_key(tenant_id), room_id).await
    }

    async fn insert_booking(
        &self,
        tenant_id: Option<&TenantId>,
        booking: Booking,
    ) -> Result<Booking> {
        let partition = partition_key(tenant_id);
        let mut tx = self.begin_immediate().await?;
        insert_booking_locked(&mut tx, partition, &booking).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(booking)
    }

    async fn update_booking(
        &self,
        tenant_id: Option<&TenantId>,
        booking: Booking,
        expected_status: BookingStatus,
    ) -> Result<Booking> {
        let partition = partition_key(tenant_id);
        let mut tx = self.begin_immediate().await?;
        update_booking_locked(&mut tx, partition, &booking, expected_status).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(booking)
    }

    async fn insert_payment(
        &self,
        tenant_id: Option<&TenantId>,
        payment: Payment,
    ) -> Result<(Payment, Booking)> {
        let partition = partition_key(tenant_id);
        let mut tx = self.begin_immediate().await?;
        let booking = insert_payment_locked(&mut tx, partition, &payment).await?;
        tx.commit().await.map_err(db_err)?;
        Ok((payment, booking))
    }

    async fn replace_payment(
        &self,
        tenant_id: Option<&TenantId>,
        payment: Payment,
    ) -> Result<(Payment, Booking)> {
        let partition = partition_key(tenant_id);
        let mut tx = self.begin_immediate().await?;
        let booking = replace_payment_locked(&mut tx, partition, &payment).await?;
        tx.commit().await.map_err(db_err)?;
        Ok((payment, booking))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
