//! Stock reservation action with an in-memory inventory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::FailureSwitches;
use crate::action::{ActionError, Phase, TccAction};

/// A quantity of one SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub sku: String,
    pub quantity: u32,
}

impl StockItem {
    pub fn new(sku: impl Into<String>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
        }
    }
}

/// Stock to hold for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReservationParams {
    pub order_no: String,
    pub items: Vec<StockItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoldState {
    Held,
    Committed,
    Released,
}

#[derive(Debug)]
struct Reservation {
    id: String,
    items: Vec<StockItem>,
    state: HoldState,
}

#[derive(Debug, Default)]
struct InventoryState {
    available: HashMap<String, u32>,
    reservations: HashMap<String, Reservation>,
    next_id: u32,
    confirm_calls: usize,
    cancel_calls: usize,
    confirmed: usize,
    released: usize,
}

/// Holds stock on try, deducts it for good on confirm, returns it on cancel.
///
/// Confirm and cancel are idempotent per order. A cancel that arrives before
/// any try leaves a released marker, so a late try for the same order is
/// refused instead of holding stock nobody will release.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockReservation {
    state: Arc<RwLock<InventoryState>>,
    failures: Arc<FailureSwitches>,
}

impl InMemoryStockReservation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an inventory with the given available quantities.
    pub fn with_stock<'a>(stock: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        let available = stock
            .into_iter()
            .map(|(sku, qty)| (sku.to_string(), qty))
            .collect();
        Self {
            state: Arc::new(RwLock::new(InventoryState {
                available,
                ..InventoryState::default()
            })),
            failures: Arc::default(),
        }
    }

    pub fn set_fail_on_try(&self, fail: bool) {
        self.failures.set(Phase::Try, fail);
    }

    pub fn set_fail_on_confirm(&self, fail: bool) {
        self.failures.set(Phase::Confirm, fail);
    }

    pub fn set_fail_on_cancel(&self, fail: bool) {
        self.failures.set(Phase::Cancel, fail);
    }

    /// Quantity of `sku` not held by any reservation.
    pub async fn available(&self, sku: &str) -> u32 {
        self.state
            .read()
            .await
            .available
            .get(sku)
            .copied()
            .unwrap_or(0)
    }

    /// Number of reservations currently held (neither committed nor released).
    pub async fn held_count(&self) -> usize {
        self.state
            .read()
            .await
            .reservations
            .values()
            .filter(|r| r.state == HoldState::Held)
            .count()
    }

    /// Number of confirm invocations, failed ones included.
    pub async fn confirm_calls(&self) -> usize {
        self.state.read().await.confirm_calls
    }

    /// Number of cancel invocations, failed ones included.
    pub async fn cancel_calls(&self) -> usize {
        self.state.read().await.cancel_calls
    }

    /// Number of reservations actually committed.
    pub async fn confirmed_count(&self) -> usize {
        self.state.read().await.confirmed
    }

    /// Number of reservations actually released.
    pub async fn released_count(&self) -> usize {
        self.state.read().await.released
    }
}

#[async_trait]
impl TccAction for InMemoryStockReservation {
    type Params = StockReservationParams;
    type Output = String;

    fn name(&self) -> &'static str {
        "stock_reservation"
    }

    async fn try_action(&self, params: &StockReservationParams) -> Result<String, ActionError> {
        self.failures.check(Phase::Try, "inventory")?;
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if let Some(existing) = state.reservations.get(&params.order_no) {
            return match existing.state {
                HoldState::Held | HoldState::Committed => Ok(existing.id.clone()),
                HoldState::Released => Err(ActionError::Rejected(format!(
                    "reservation for {} was already released",
                    params.order_no
                ))),
            };
        }

        for item in &params.items {
            let available = state.available.get(&item.sku).copied().unwrap_or(0);
            if available < item.quantity {
                return Err(ActionError::Rejected(format!(
                    "insufficient stock for {}: requested {}, available {}",
                    item.sku, item.quantity, available
                )));
            }
        }
        for item in &params.items {
            if let Some(available) = state.available.get_mut(&item.sku) {
                *available -= item.quantity;
            }
        }

        state.next_id += 1;
        let id = format!("RSV-{:04}", state.next_id);
        state.reservations.insert(
            params.order_no.clone(),
            Reservation {
                id: id.clone(),
                items: params.items.clone(),
                state: HoldState::Held,
            },
        );
        Ok(id)
    }

    async fn confirm(&self, params: &StockReservationParams) -> Result<(), ActionError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        state.confirm_calls += 1;
        self.failures.check(Phase::Confirm, "inventory")?;

        let Some(reservation) = state.reservations.get_mut(&params.order_no) else {
            return Err(ActionError::Rejected(format!(
                "no reservation for {}",
                params.order_no
            )));
        };
        match reservation.state {
            HoldState::Held => {
                reservation.state = HoldState::Committed;
                state.confirmed += 1;
                Ok(())
            }
            HoldState::Committed => Ok(()),
            HoldState::Released => Err(ActionError::Rejected(format!(
                "reservation for {} was released",
                params.order_no
            ))),
        }
    }

    async fn cancel(&self, params: &StockReservationParams) -> Result<(), ActionError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        state.cancel_calls += 1;
        self.failures.check(Phase::Cancel, "inventory")?;

        if !state.reservations.contains_key(&params.order_no) {
            state.reservations.insert(
                params.order_no.clone(),
                Reservation {
                    id: String::new(),
                    items: Vec::new(),
                    state: HoldState::Released,
                },
            );
            return Ok(());
        }

        let Some(reservation) = state.reservations.get_mut(&params.order_no) else {
            return Ok(());
        };
        match reservation.state {
            HoldState::Held => {
                for item in &reservation.items {
                    *state.available.entry(item.sku.clone()).or_insert(0) += item.quantity;
                }
                reservation.state = HoldState::Released;
                state.released += 1;
                Ok(())
            }
            HoldState::Released => Ok(()),
            HoldState::Committed => Err(ActionError::Rejected(format!(
                "reservation for {} was already committed",
                params.order_no
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(qty: u32) -> StockReservationParams {
        StockReservationParams {
            order_no: "order-1".to_string(),
            items: vec![StockItem::new("SKU-001", qty)],
        }
    }

    #[tokio::test]
    async fn test_try_holds_stock() {
        let stock = InMemoryStockReservation::with_stock([("SKU-001", 5)]);

        let id = stock.try_action(&params(2)).await.unwrap();
        assert_eq!(id, "RSV-0001");
        assert_eq!(stock.available("SKU-001").await, 3);
        assert_eq!(stock.held_count().await, 1);

        // Repeated try for the same order returns the same hold.
        assert_eq!(stock.try_action(&params(2)).await.unwrap(), "RSV-0001");
        assert_eq!(stock.available("SKU-001").await, 3);
    }

    #[tokio::test]
    async fn test_insufficient_stock_is_rejected() {
        let stock = InMemoryStockReservation::with_stock([("SKU-001", 1)]);
        let err = stock.try_action(&params(2)).await.unwrap_err();
        assert!(matches!(err, ActionError::Rejected(_)));
        assert_eq!(stock.available("SKU-001").await, 1);
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent() {
        let stock = InMemoryStockReservation::with_stock([("SKU-001", 5)]);
        stock.try_action(&params(2)).await.unwrap();

        stock.confirm(&params(2)).await.unwrap();
        stock.confirm(&params(2)).await.unwrap();

        assert_eq!(stock.confirm_calls().await, 2);
        assert_eq!(stock.confirmed_count().await, 1);
        assert_eq!(stock.available("SKU-001").await, 3);
    }

    #[tokio::test]
    async fn test_cancel_returns_stock_once() {
        let stock = InMemoryStockReservation::with_stock([("SKU-001", 5)]);
        stock.try_action(&params(2)).await.unwrap();

        stock.cancel(&params(2)).await.unwrap();
        stock.cancel(&params(2)).await.unwrap();

        assert_eq!(stock.available("SKU-001").await, 5);
        assert_eq!(stock.released_count().await, 1);
        assert!(stock.confirm(&params(2)).await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_before_try_blocks_late_try() {
        let stock = InMemoryStockReservation::with_stock([("SKU-001", 5)]);

        stock.cancel(&params(2)).await.unwrap();
        assert_eq!(stock.released_count().await, 0);

        assert!(stock.try_action(&params(2)).await.is_err());
        assert_eq!(stock.available("SKU-001").await, 5);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let stock = InMemoryStockReservation::with_stock([("SKU-001", 5)]);
        stock.try_action(&params(1)).await.unwrap();

        stock.set_fail_on_confirm(true);
        assert!(matches!(
            stock.confirm(&params(1)).await,
            Err(ActionError::Unavailable(_))
        ));
        assert_eq!(stock.confirm_calls().await, 1);
        assert_eq!(stock.confirmed_count().await, 0);

        stock.set_fail_on_confirm(false);
        stock.confirm(&params(1)).await.unwrap();
        assert_eq!(stock.confirmed_count().await, 1);
    }
}
