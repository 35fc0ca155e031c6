//! TCC transaction manager.

use std::time::{Duration, Instant};

use chrono::Utc;
use common::{HolderToken, TransactionId};
use kv_store::KeyValueStore;
use lock::{DistributedLock, StoreLock};
use serde::Serialize;

use crate::action::{ActionError, Phase, TccAction};
use crate::config::TccConfig;
use crate::error::{Result, TccError};
use crate::status::TransactionStatus;
use crate::transaction::TccTransaction;

/// The two resolving phases, which share their bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Confirm,
    Cancel,
}

impl Resolution {
    fn phase(self) -> Phase {
        match self {
            Resolution::Confirm => Phase::Confirm,
            Resolution::Cancel => Phase::Cancel,
        }
    }

    fn accepts(self, status: TransactionStatus) -> bool {
        match self {
            Resolution::Confirm => status.can_confirm(),
            Resolution::Cancel => status.can_cancel(),
        }
    }

    fn in_progress(self) -> TransactionStatus {
        match self {
            Resolution::Confirm => TransactionStatus::Confirming,
            Resolution::Cancel => TransactionStatus::Cancelling,
        }
    }

    fn completed(self) -> TransactionStatus {
        match self {
            Resolution::Confirm => TransactionStatus::Confirmed,
            Resolution::Cancel => TransactionStatus::Cancelled,
        }
    }
}

/// Drives TCC transactions through try, confirm and cancel.
///
/// Records live in the shared store under `{prefix}:transaction:{id}`. Every
/// phase runs under the per-transaction lock `{prefix}:lock:{id}`, so two
/// processes can never execute phases of the same transaction concurrently.
/// Confirm and cancel short-circuit on their own terminal status; that and
/// the lock are the only idempotency the manager provides, the actions
/// themselves must tolerate repeated calls.
pub struct TccTransactionManager<S, L>
where
    S: KeyValueStore,
    L: DistributedLock,
{
    store: S,
    lock: L,
    config: TccConfig,
}

impl<S> TccTransactionManager<S, StoreLock<S>>
where
    S: KeyValueStore + Clone,
{
    /// Creates a manager whose lock lives in the same store as the records.
    pub fn with_store(store: S, config: TccConfig) -> Self {
        let lock = StoreLock::new(store.clone());
        Self::new(store, lock, config)
    }
}

impl<S, L> TccTransactionManager<S, L>
where
    S: KeyValueStore,
    L: DistributedLock,
{
    /// Creates a new transaction manager.
    pub fn new(store: S, lock: L, config: TccConfig) -> Self {
        Self {
            store,
            lock,
            config,
        }
    }

    pub fn config(&self) -> &TccConfig {
        &self.config
    }

    /// Starts a transaction in `Trying` and returns its id.
    ///
    /// Nothing is written if `params` cannot be serialized.
    #[tracing::instrument(skip(self, params), fields(transaction_id))]
    pub async fn begin<P: Serialize>(
        &self,
        transaction_type: &str,
        business_key: &str,
        params: &P,
        timeout: Duration,
    ) -> Result<TransactionId> {
        let params = serde_json::to_string(params).map_err(|e| {
            tracing::error!(error = %e, "failed to serialize transaction params");
            TccError::Serialization(e)
        })?;

        let transaction = TccTransaction::new(
            transaction_type,
            business_key,
            params,
            timeout,
            self.config.max_retry_count,
        );
        let transaction_id = transaction.transaction_id;
        tracing::Span::current().record("transaction_id", tracing::field::display(transaction_id));

        self.save(&transaction).await?;

        metrics::counter!("tcc_transactions_begun_total").increment(1);
        tracing::info!(%transaction_id, "transaction begun");
        Ok(transaction_id)
    }

    /// [`begin`](Self::begin) with the configured default timeout.
    pub async fn begin_with_default_timeout<P: Serialize>(
        &self,
        transaction_type: &str,
        business_key: &str,
        params: &P,
    ) -> Result<TransactionId> {
        self.begin(
            transaction_type,
            business_key,
            params,
            self.config.default_timeout,
        )
        .await
    }

    /// Runs the try phase of `action`.
    ///
    /// The persisted status is left untouched whatever the outcome; a failed
    /// try is the caller's cue to cancel.
    #[tracing::instrument(skip(self, action, params), fields(action = action.name()))]
    pub async fn try_action<A: TccAction>(
        &self,
        transaction_id: TransactionId,
        action: &A,
        params: &A::Params,
    ) -> Result<A::Output> {
        let transaction = self.load(transaction_id).await?;
        if !transaction.status.can_try() {
            return Err(self.reject(&transaction, Phase::Try));
        }

        let holder = self.acquire(transaction_id).await?;
        let outcome = self.try_locked(transaction_id, action, params).await;
        self.release(transaction_id, &holder).await;
        outcome
    }

    async fn try_locked<A: TccAction>(
        &self,
        transaction_id: TransactionId,
        action: &A,
        params: &A::Params,
    ) -> Result<A::Output> {
        let transaction = self.load(transaction_id).await?;
        if !transaction.status.can_try() {
            return Err(self.reject(&transaction, Phase::Try));
        }

        let started = Instant::now();
        let result = action.try_action(params).await;
        record_phase(Phase::Try, started, result.is_ok());

        result.map_err(|source| {
            tracing::warn!(%transaction_id, error = %source, "try phase failed");
            TccError::PhaseExecutionFailed {
                transaction_id,
                phase: Phase::Try,
                retry_count: transaction.retry_count,
                max_retry_count: transaction.max_retry_count,
                source,
            }
        })
    }

    /// Runs the confirm phase of `action`.
    ///
    /// Returns `Ok(())` without running anything if the transaction is
    /// already confirmed. Fails with [`TccError::InvalidState`] if it was
    /// cancelled or is being cancelled.
    #[tracing::instrument(skip(self, action, params), fields(action = action.name()))]
    pub async fn confirm_action<A: TccAction>(
        &self,
        transaction_id: TransactionId,
        action: &A,
        params: &A::Params,
    ) -> Result<()> {
        self.resolve(transaction_id, Resolution::Confirm, action, params)
            .await
    }

    /// Runs the cancel phase of `action`.
    ///
    /// Returns `Ok(())` without running anything if the transaction is
    /// already cancelled. Fails with [`TccError::InvalidState`] if it was
    /// confirmed or is being confirmed.
    #[tracing::instrument(skip(self, action, params), fields(action = action.name()))]
    pub async fn cancel_action<A: TccAction>(
        &self,
        transaction_id: TransactionId,
        action: &A,
        params: &A::Params,
    ) -> Result<()> {
        self.resolve(transaction_id, Resolution::Cancel, action, params)
            .await
    }

    async fn resolve<A: TccAction>(
        &self,
        transaction_id: TransactionId,
        resolution: Resolution,
        action: &A,
        params: &A::Params,
    ) -> Result<()> {
        let transaction = self.load(transaction_id).await?;
        if !self.should_run(&transaction, resolution)? {
            return Ok(());
        }

        let holder = self.acquire(transaction_id).await?;
        let outcome = self
            .resolve_locked(transaction_id, resolution, action, params)
            .await;
        self.release(transaction_id, &holder).await;
        outcome
    }

    async fn resolve_locked<A: TccAction>(
        &self,
        transaction_id: TransactionId,
        resolution: Resolution,
        action: &A,
        params: &A::Params,
    ) -> Result<()> {
        let phase = resolution.phase();

        // Another caller may have finished the phase while we waited.
        let mut transaction = self.load(transaction_id).await?;
        if !self.should_run(&transaction, resolution)? {
            return Ok(());
        }

        if transaction.retries_exhausted() {
            return Err(self.escalate(&transaction, phase, None));
        }

        transaction.transition(resolution.in_progress());
        self.save(&transaction).await?;

        let started = Instant::now();
        let result = match resolution {
            Resolution::Confirm => action.confirm(params).await,
            Resolution::Cancel => action.cancel(params).await,
        };
        record_phase(phase, started, result.is_ok());

        match result {
            Ok(()) => {
                transaction.transition(resolution.completed());
                self.save(&transaction).await?;
                tracing::info!(%transaction_id, %phase, "transaction {}", transaction.status);
                Ok(())
            }
            Err(source) => self.record_failure(transaction, phase, source).await,
        }
    }

    /// Decides whether a confirm/cancel should run against `transaction`.
    ///
    /// `Ok(false)` means the phase already completed.
    fn should_run(&self, transaction: &TccTransaction, resolution: Resolution) -> Result<bool> {
        if transaction.status == resolution.completed() {
            tracing::info!(
                transaction_id = %transaction.transaction_id,
                status = %transaction.status,
                "transaction already resolved, ignoring repeated {}",
                resolution.phase()
            );
            return Ok(false);
        }
        if !resolution.accepts(transaction.status) {
            return Err(self.reject(transaction, resolution.phase()));
        }
        Ok(true)
    }

    async fn record_failure(
        &self,
        mut transaction: TccTransaction,
        phase: Phase,
        source: ActionError,
    ) -> Result<()> {
        transaction.record_failure();
        tracing::error!(
            transaction_id = %transaction.transaction_id,
            %phase,
            retry_count = transaction.retry_count,
            max_retry_count = transaction.max_retry_count,
            error = %source,
            "phase failed"
        );
        self.save(&transaction).await?;

        if transaction.retries_exhausted() {
            return Err(self.escalate(&transaction, phase, Some(source)));
        }
        Err(TccError::PhaseExecutionFailed {
            transaction_id: transaction.transaction_id,
            phase,
            retry_count: transaction.retry_count,
            max_retry_count: transaction.max_retry_count,
            source,
        })
    }

    fn escalate(
        &self,
        transaction: &TccTransaction,
        phase: Phase,
        source: Option<ActionError>,
    ) -> TccError {
        metrics::counter!("tcc_escalations_total", "phase" => phase.as_str()).increment(1);
        tracing::error!(
            transaction_id = %transaction.transaction_id,
            transaction_type = %transaction.transaction_type,
            business_key = %transaction.business_key,
            %phase,
            retry_count = transaction.retry_count,
            max_retry_count = transaction.max_retry_count,
            error = source.as_ref().map(tracing::field::display),
            "retries exhausted, manual intervention required"
        );
        TccError::RetriesExhausted {
            transaction_id: transaction.transaction_id,
            phase,
            retry_count: transaction.retry_count,
            max_retry_count: transaction.max_retry_count,
            last_error: source.map(|e| e.to_string()),
        }
    }

    fn reject(&self, transaction: &TccTransaction, phase: Phase) -> TccError {
        tracing::warn!(
            transaction_id = %transaction.transaction_id,
            status = %transaction.status,
            %phase,
            "phase not allowed in current status"
        );
        TccError::InvalidState {
            transaction_id: transaction.transaction_id,
            phase,
            status: transaction.status,
        }
    }

    /// Loads a transaction record, `None` if unknown or expired.
    pub async fn get_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<TccTransaction>> {
        let key = self.config.transaction_key(transaction_id);
        match self.store.get(&key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Deletes a transaction record. Returns whether it existed.
    pub async fn delete_transaction(&self, transaction_id: TransactionId) -> Result<bool> {
        let key = self.config.transaction_key(transaction_id);
        Ok(self.store.delete(&key).await?)
    }

    async fn load(&self, transaction_id: TransactionId) -> Result<TccTransaction> {
        self.get_transaction(transaction_id).await?.ok_or_else(|| {
            tracing::warn!(%transaction_id, "transaction not found");
            TccError::TransactionNotFound(transaction_id)
        })
    }

    async fn save(&self, transaction: &TccTransaction) -> Result<()> {
        let key = self.config.transaction_key(transaction.transaction_id);
        let json = serde_json::to_string(transaction)?;
        let ttl = transaction.store_ttl(self.config.ttl_policy, Utc::now());
        self.store.set(&key, &json, ttl).await?;
        Ok(())
    }

    async fn acquire(&self, transaction_id: TransactionId) -> Result<HolderToken> {
        let holder = HolderToken::new();
        let key = self.config.lock_key(transaction_id);
        if self.lock.try_lock(&key, &holder, self.config.lock_ttl).await {
            Ok(holder)
        } else {
            tracing::warn!(%transaction_id, "transaction lock is held elsewhere");
            Err(TccError::LockAcquisitionFailed { transaction_id })
        }
    }

    async fn release(&self, transaction_id: TransactionId, holder: &HolderToken) {
        let key = self.config.lock_key(transaction_id);
        if !self.lock.release_lock(&key, holder).await {
            // Lock expired mid-phase or the store is unreachable; the TTL
            // still bounds how long it can linger.
            tracing::warn!(%transaction_id, "transaction lock was not released");
        }
    }
}

fn record_phase(phase: Phase, started: Instant, succeeded: bool) {
    let outcome = if succeeded { "success" } else { "failure" };
    metrics::counter!("tcc_phase_total", "phase" => phase.as_str(), "outcome" => outcome)
        .increment(1);
    metrics::histogram!("tcc_phase_duration_seconds", "phase" => phase.as_str())
        .record(started.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{InMemoryStockReservation, StockItem, StockReservationParams};
    use kv_store::{InMemoryKeyValueStore, KeyValueStoreExt};

    type Manager = TccTransactionManager<InMemoryKeyValueStore, StoreLock<InMemoryKeyValueStore>>;

    fn setup() -> (Manager, InMemoryKeyValueStore, InMemoryStockReservation) {
        let store = InMemoryKeyValueStore::new();
        let manager = TccTransactionManager::with_store(store.clone(), TccConfig::default());
        let stock = InMemoryStockReservation::with_stock([("SKU-001", 10)]);
        (manager, store, stock)
    }

    fn params() -> StockReservationParams {
        StockReservationParams {
            order_no: "order-123".to_string(),
            items: vec![StockItem::new("SKU-001", 2)],
        }
    }

    #[tokio::test]
    async fn test_begin_persists_trying_record() {
        let (manager, store, _) = setup();
        let id = manager
            .begin("ORDER_STOCK", "order-123", &params(), Duration::from_secs(30))
            .await
            .unwrap();

        let txn = manager.get_transaction(id).await.unwrap().unwrap();
        assert_eq!(txn.status, TransactionStatus::Trying);
        assert_eq!(txn.transaction_type, "ORDER_STOCK");
        assert_eq!(txn.business_key, "order-123");
        assert_eq!(txn.params::<StockReservationParams>().unwrap(), params());

        let ttl = store
            .ttl(&format!("tcc:transaction:{id}"))
            .await
            .unwrap()
            .unwrap();
        assert!(ttl <= Duration::from_secs(30));
        assert!(ttl > Duration::from_secs(29));
    }

    #[tokio::test]
    async fn test_try_confirm_cycle() {
        let (manager, _, stock) = setup();
        let id = manager
            .begin_with_default_timeout("ORDER_STOCK", "order-123", &params())
            .await
            .unwrap();

        let reservation = manager.try_action(id, &stock, &params()).await.unwrap();
        assert_eq!(reservation, "RSV-0001");
        assert_eq!(stock.available("SKU-001").await, 8);

        manager.confirm_action(id, &stock, &params()).await.unwrap();
        let txn = manager.get_transaction(id).await.unwrap().unwrap();
        assert_eq!(txn.status, TransactionStatus::Confirmed);
        assert_eq!(stock.confirmed_count().await, 1);
    }

    #[tokio::test]
    async fn test_try_releases_lock_on_failure() {
        let (manager, store, stock) = setup();
        let id = manager
            .begin_with_default_timeout("ORDER_STOCK", "order-123", &params())
            .await
            .unwrap();
        stock.set_fail_on_try(true);

        let err = manager.try_action(id, &stock, &params()).await.unwrap_err();
        assert!(matches!(
            err,
            TccError::PhaseExecutionFailed { phase: Phase::Try, retry_count: 0, .. }
        ));
        assert!(!store.exists(&format!("tcc:lock:{id}")).await.unwrap());

        let txn = manager.get_transaction(id).await.unwrap().unwrap();
        assert_eq!(txn.status, TransactionStatus::Trying);
    }

    #[tokio::test]
    async fn test_missing_transaction() {
        let (manager, _, stock) = setup();
        let id = TransactionId::new();

        assert!(matches!(
            manager.try_action(id, &stock, &params()).await,
            Err(TccError::TransactionNotFound(missing)) if missing == id
        ));
        assert!(matches!(
            manager.confirm_action(id, &stock, &params()).await,
            Err(TccError::TransactionNotFound(_))
        ));
        assert!(matches!(
            manager.cancel_action(id, &stock, &params()).await,
            Err(TccError::TransactionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_transaction() {
        let (manager, _, _) = setup();
        let id = manager
            .begin_with_default_timeout("ORDER_STOCK", "order-123", &params())
            .await
            .unwrap();

        assert!(manager.delete_transaction(id).await.unwrap());
        assert!(!manager.delete_transaction(id).await.unwrap());
        assert!(manager.get_transaction(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_custom_key_prefix() {
        let store = InMemoryKeyValueStore::new();
        let config = TccConfig {
            key_prefix: "shop".to_string(),
            ..TccConfig::default()
        };
        let manager = TccTransactionManager::with_store(store.clone(), config);

        let id = manager
            .begin_with_default_timeout("ORDER_STOCK", "order-123", &params())
            .await
            .unwrap();
        assert!(store.exists(&format!("shop:transaction:{id}")).await.unwrap());
    }
}
