//! Contract boundary for the (external) HTTP layer: request validation,
//! response bodies, and the error envelope. Routing, header parsing and JSON
//! transport live outside this crate; these helpers are what that layer
//! delegates into.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    balance::{BalanceChange, BalanceErrorKind, BalanceStore},
    dispense::{
        DispenseError, DispenseErrorKind,
        error::{bad_params, internal_error, not_found},
    },
    inventory::{InventoryErrorKind, InventoryStore, Item, ItemPatch, Slot, SlotPatch, StoreSelector},
};

/// Wire-stable error envelope: `{ error, errorCode, message }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(rename = "errorCode")]
    pub error_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&DispenseError> for ErrorBody {
    fn from(err: &DispenseError) -> Self {
        Self {
            error: err.code().to_string(),
            error_code: http_status(err),
            message: Some(err.message.clone()),
        }
    }
}

pub fn http_status(err: &DispenseError) -> u16 {
    match err.kind {
        DispenseErrorKind::Unauthorized => 401,
        DispenseErrorKind::BadParams => 400,
        DispenseErrorKind::NotFound => 404,
        DispenseErrorKind::SlotEmpty => 400,
        DispenseErrorKind::InsufficientBalance => 402,
        DispenseErrorKind::MachineUnreachable => 503,
        DispenseErrorKind::MachineTimedOut => 504,
        DispenseErrorKind::MachineRejected => 502,
        DispenseErrorKind::AmbiguousOutcome => 504,
        DispenseErrorKind::InternalInconsistency => 500,
        DispenseErrorKind::Internal => 500,
    }
}

/// Binds the request to exactly one inventory store. The selection is plain
/// composition at the boundary; the coordinator never inspects which one it
/// was handed.
pub fn select_inventory(
    selector: StoreSelector,
    persistent: &Arc<dyn InventoryStore>,
    fixture: &Arc<dyn InventoryStore>,
) -> Arc<dyn InventoryStore> {
    match selector {
        StoreSelector::Persistent => Arc::clone(persistent),
        StoreSelector::Fixture => Arc::clone(fixture),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemCreateRequest {
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemUpdateRequest {
    pub id: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotUpdateRequest {
    pub machine: String,
    pub slot: i32,
    #[serde(default)]
    pub item_id: Option<i32>,
    #[serde(default)]
    pub active: Option<bool>,
    /// `Some(None)` clears the counter (unmetered), `None` leaves it alone.
    #[serde(default)]
    pub count: Option<Option<i32>>,
}

/// Admin surface: create an item. Validation happens here; the stores assume
/// validated input.
pub async fn create_item(
    store: &Arc<dyn InventoryStore>,
    request: &ItemCreateRequest,
) -> Result<Item, DispenseError> {
    if request.name.trim().is_empty() {
        return Err(bad_params("an item cannot have an empty name"));
    }
    if request.price < 0 {
        return Err(bad_params("you cannot create a worthless item"));
    }

    store
        .create_item(&request.name, request.price)
        .await
        .map_err(|e| internal_error(e.message))
}

/// Admin surface: partial item update; omitted fields are unchanged.
pub async fn update_item(
    store: &Arc<dyn InventoryStore>,
    request: &ItemUpdateRequest,
) -> Result<Item, DispenseError> {
    if request.name.is_none() && request.price.is_none() {
        return Err(bad_params(
            "the name, price, or both values of an item must be provided to update",
        ));
    }
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(bad_params("an item cannot have an empty name"));
        }
    }
    if let Some(price) = request.price {
        if price < 0 {
            return Err(bad_params("you cannot create a worthless item"));
        }
    }

    let patch = ItemPatch {
        name: request.name.clone(),
        price: request.price,
    };
    store.update_item(request.id, patch).await.map_err(|e| match e.kind {
        InventoryErrorKind::NotFound => not_found(e.message),
        _ => internal_error(e.message),
    })
}

pub async fn delete_item(
    store: &Arc<dyn InventoryStore>,
    id: i32,
) -> Result<(), DispenseError> {
    store.delete_item(id).await.map_err(|e| match e.kind {
        InventoryErrorKind::NotFound => not_found(e.message),
        _ => internal_error(e.message),
    })
}

pub async fn list_items(store: &Arc<dyn InventoryStore>) -> Result<Vec<Item>, DispenseError> {
    store.list_items().await.map_err(|e| internal_error(e.message))
}

/// Admin surface: update a slot's item binding, serviceability or counter.
pub async fn update_slot(
    store: &Arc<dyn InventoryStore>,
    request: &SlotUpdateRequest,
) -> Result<Slot, DispenseError> {
    if request.machine.trim().is_empty() {
        return Err(bad_params("a machine name must be provided"));
    }
    if request.slot < 1 {
        return Err(bad_params("the slot number must be a positive integer"));
    }
    if request.item_id.is_none() && request.active.is_none() && request.count.is_none() {
        return Err(bad_params(
            "either the state or item within a slot must be provided for an update",
        ));
    }
    if let Some(item_id) = request.item_id {
        if item_id < 1 {
            return Err(bad_params("the item id must be a positive integer"));
        }
        let exists = store
            .get_item(item_id)
            .await
            .map_err(|e| internal_error(e.message))?
            .is_some();
        if !exists {
            return Err(bad_params(format!(
                "no item with id {} is present in the system",
                item_id
            )));
        }
    }

    let patch = SlotPatch {
        item_id: request.item_id,
        active: request.active,
        count: request.count,
    };
    store
        .update_slot(&request.machine, request.slot, patch)
        .await
        .map_err(|e| match e.kind {
            InventoryErrorKind::NotFound => bad_params(e.message),
            _ => internal_error(e.message),
        })
}

pub async fn get_credits(
    store: &Arc<dyn BalanceStore>,
    uid: &str,
) -> Result<i64, DispenseError> {
    store.read_balance(uid).await.map_err(|e| match e.kind {
        BalanceErrorKind::UnknownUser => not_found(e.message),
        _ => internal_error(e.message),
    })
}

/// Admin surface: overwrite a user's credits, guarded by the previously read
/// value so concurrent drops cannot be silently overwritten.
pub async fn set_credits(
    store: &Arc<dyn BalanceStore>,
    uid: &str,
    new_balance: i64,
    expected_current: i64,
) -> Result<BalanceChange, DispenseError> {
    store
        .write_balance(uid, new_balance, expected_current)
        .await
        .map_err(|e| match e.kind {
            BalanceErrorKind::UnknownUser => not_found(e.message),
            BalanceErrorKind::Conflict => bad_params(e.message),
            _ => internal_error(e.message),
        })
}
