use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{PgConnection, Row};
use tracing::{debug, error, info, warn};

use crate::config::DatabaseConfig;
use crate::domain::{
    Account, AccountId, Amount, LockOrder, TransferRecord, check_amount_range, settle,
    transfer_deltas, validate_transfer,
};

use super::{LedgerStore, MIGRATION_001_INITIAL, StoreError, TxStage};

/// SQLSTATE raised when a serializable transaction loses a conflict
const SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE raised when the engine breaks a lock cycle
const DEADLOCK_DETECTED: &str = "40P01";

/// Ledger store backed by PostgreSQL.
///
/// Transfers run at SERIALIZABLE isolation and take `FOR UPDATE` row locks
/// in [`LockOrder`]. No in-process locking: the engine is the only
/// arbiter between concurrent operations.
pub struct PgLedgerStore {
    pool: PgPool,
    operation_timeout: Duration,
}

impl PgLedgerStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: PgPool, operation_timeout: Duration) -> Self {
        Self {
            pool,
            operation_timeout,
        }
    }

    /// Open a bounded connection pool from configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            max_connections = config.max_connections,
            "PostgreSQL connection pool established"
        );
        Ok(Self::new(pool, config.operation_timeout))
    }

    /// Open a pool from a connection URL such as `DATABASE_URL`.
    pub async fn connect_url(database_url: &str, operation_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool, operation_timeout))
    }

    /// Run database migrations. Safe to run repeatedly.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize the store (connect + migrate).
    pub async fn init(config: &DatabaseConfig) -> Result<Self> {
        let store = Self::connect(config).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Bound an operation by the configured timeout. Only for work that has
    /// not yet asked the server to commit: a timeout here is retryable.
    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.operation_timeout, operation).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.operation_timeout, "Ledger operation timed out");
                Err(StoreError::Timeout(self.operation_timeout))
            }
        }
    }

    async fn run_transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .bounded(async { self.pool.begin().await.map_err(|e| classify(e, TxStage::Begin)) })
            .await?;

        debug!(source, destination, %amount, "Transfer started");

        let applied = self
            .bounded(Self::apply_transfer(&mut tx, source, destination, amount))
            .await;
        if let Err(err) = applied {
            match tokio::time::timeout(self.operation_timeout, tx.rollback()).await {
                Ok(Ok(())) => {}
                Ok(Err(rollback_err)) => {
                    warn!(error = %rollback_err, "Rollback failed, connection will be discarded");
                }
                Err(_) => warn!("Rollback timed out, connection will be discarded"),
            }
            debug!(source, destination, %amount, error = %err, "Transfer rolled back");
            return Err(err);
        }

        // The server may apply a COMMIT we stopped waiting for: a timeout
        // here is not retryable.
        let committed = match tokio::time::timeout(self.operation_timeout, tx.commit()).await {
            Ok(result) => result.map_err(|e| classify(e, TxStage::Commit)),
            Err(_) => Err(commit_outcome_unknown(self.operation_timeout)),
        };
        match committed {
            Ok(()) => {
                info!(source, destination, %amount, "Transfer committed");
                Ok(())
            }
            Err(err) => {
                error!(source, destination, %amount, error = %err, "Commit failed");
                Err(err)
            }
        }
    }

    /// Every statement of a transfer, run inside one open transaction.
    async fn apply_transfer(
        conn: &mut PgConnection,
        source: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> Result<(), StoreError> {
        // Must be the first statement of the transaction.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *conn)
            .await
            .map_err(|e| classify(e, TxStage::Begin))?;

        let order = LockOrder::new(source, destination);
        let mut locked = [Amount::ZERO; 2];
        for (balance, id) in locked.iter_mut().zip(order.accounts()) {
            let row = sqlx::query("SELECT balance FROM accounts WHERE id = $1 FOR UPDATE")
                .bind(i64::from(id))
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| classify(e, TxStage::Lock))?
                .ok_or(StoreError::AccountNotFound(id))?;
            *balance = row
                .try_get("balance")
                .map_err(|e| classify(e, TxStage::Lock))?;
        }

        settle(source, destination, amount, locked).map_err(|e| {
            let err = StoreError::settlement(e, source, amount);
            debug!(source, destination, %amount, error = %err, "Transfer rejected");
            err
        })?;

        for (id, delta) in transfer_deltas(source, destination, amount) {
            let result = sqlx::query("UPDATE accounts SET balance = balance + $1 WHERE id = $2")
                .bind(delta)
                .bind(i64::from(id))
                .execute(&mut *conn)
                .await
                .map_err(|e| classify(e, TxStage::Update))?;

            if result.rows_affected() != 1 {
                error!(account_id = id, rows = result.rows_affected(), "Balance update hit no row");
                return Err(StoreError::AccountNotFoundDuringUpdate(id));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO transfers (source_account_id, destination_account_id, amount)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(i64::from(source))
        .bind(i64::from(destination))
        .bind(amount)
        .execute(&mut *conn)
        .await
        .map_err(|e| classify(e, TxStage::Audit))?;

        Ok(())
    }

    fn row_to_account(row: &PgRow) -> Result<Account, sqlx::Error> {
        Ok(Account {
            id: decode_account_id(row, "id")?,
            balance: row.try_get("balance")?,
        })
    }

    fn row_to_transfer(row: &PgRow) -> Result<TransferRecord, sqlx::Error> {
        Ok(TransferRecord {
            sequence: row.try_get("sequence")?,
            source: decode_account_id(row, "source_account_id")?,
            destination: decode_account_id(row, "destination_account_id")?,
            amount: row.try_get("amount")?,
            recorded_at: row.try_get("recorded_at")?,
        })
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn get_account(&self, id: AccountId) -> Result<Account, StoreError> {
        self.bounded(async {
            let row = sqlx::query("SELECT id, balance FROM accounts WHERE id = $1")
                .bind(i64::from(id))
                .fetch_optional(&self.pool)
                .await;

            match row {
                Ok(Some(row)) => Self::row_to_account(&row).map_err(|e| {
                    error!(account_id = id, error = %e, "Failed to decode account");
                    StoreError::transaction(TxStage::Read, e.to_string())
                }),
                Ok(None) => Err(StoreError::AccountNotFound(id)),
                Err(sqlx::Error::PoolTimedOut) => Err(StoreError::PoolExhausted),
                Err(e) => {
                    warn!(account_id = id, error = %e, "Account lookup failed");
                    Err(StoreError::AccountNotFound(id))
                }
            }
        })
        .await
    }

    async fn create_account(
        &self,
        id: AccountId,
        initial_balance: Amount,
    ) -> Result<Account, StoreError> {
        let initial_balance =
            check_amount_range(initial_balance).map_err(|e| StoreError::AccountCreationFailed {
                account_id: id,
                reason: e.to_string(),
            })?;

        self.bounded(async {
            let result = sqlx::query(
                r#"
                INSERT INTO accounts (id, balance)
                VALUES ($1, $2)
                RETURNING id, balance
                "#,
            )
            .bind(i64::from(id))
            .bind(initial_balance)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(row) => {
                    let account = Self::row_to_account(&row).map_err(|e| {
                        StoreError::AccountCreationFailed {
                            account_id: id,
                            reason: e.to_string(),
                        }
                    })?;
                    info!(account_id = id, balance = %account.balance, "Account created");
                    Ok(account)
                }
                Err(sqlx::Error::PoolTimedOut) => Err(StoreError::PoolExhausted),
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    warn!(account_id = id, "Duplicate account rejected by unique constraint");
                    Err(StoreError::DuplicateAccount(id))
                }
                Err(e) => {
                    error!(account_id = id, error = %e, "Failed to create account");
                    Err(StoreError::AccountCreationFailed {
                        account_id: id,
                        reason: e.to_string(),
                    })
                }
            }
        })
        .await
    }

    async fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> Result<(), StoreError> {
        validate_transfer(source, destination, amount)?;
        self.run_transfer(source, destination, amount).await
    }

    async fn list_transfers(
        &self,
        account: Option<AccountId>,
    ) -> Result<Vec<TransferRecord>, StoreError> {
        self.bounded(async {
            let rows = match account {
                Some(id) => {
                    sqlx::query(
                        r#"
                        SELECT sequence, source_account_id, destination_account_id, amount, recorded_at
                        FROM transfers
                        WHERE source_account_id = $1 OR destination_account_id = $1
                        ORDER BY sequence
                        "#,
                    )
                    .bind(i64::from(id))
                    .fetch_all(&self.pool)
                    .await
                }
                None => {
                    sqlx::query(
                        r#"
                        SELECT sequence, source_account_id, destination_account_id, amount, recorded_at
                        FROM transfers
                        ORDER BY sequence
                        "#,
                    )
                    .fetch_all(&self.pool)
                    .await
                }
            }
            .map_err(|e| classify(e, TxStage::Read))?;

            rows.iter()
                .map(Self::row_to_transfer)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| classify(e, TxStage::Read))
        })
        .await
    }
}

fn decode_account_id(row: &PgRow, column: &str) -> Result<AccountId, sqlx::Error> {
    let raw: i64 = row.try_get(column)?;
    AccountId::try_from(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// A commit that did not answer in time may still have been applied.
fn commit_outcome_unknown(after: Duration) -> StoreError {
    StoreError::transaction(
        TxStage::Commit,
        format!("no answer to COMMIT within {after:?}, outcome unknown"),
    )
}

/// Map an engine error onto the store's error kinds.
fn classify(err: sqlx::Error, stage: TxStage) -> StoreError {
    match &err {
        sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
        sqlx::Error::Database(db)
            if matches!(
                db.code().as_deref(),
                Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
            ) =>
        {
            warn!(stage = %stage, error = %db.message(), "Serialization conflict");
            StoreError::SerializationConflict(db.message().to_string())
        }
        _ => {
            error!(stage = %stage, error = %err, "Store operation failed");
            StoreError::transaction(stage, err.to_string())
        }
    }
}
