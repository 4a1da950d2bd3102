use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: i32,
    /// Internal name, unique, immutable once created. Also the key for
    /// deriving the machine's network address.
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i32,
    pub name: String,
    /// Non-negative, in credit units.
    pub price: i64,
}

/// A slot hydrated with its referenced item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub machine_id: i32,
    pub number: i32,
    pub item: Option<Item>,
    pub active: bool,
    /// Remaining-stock counter. `None` for unmetered machines that only
    /// report emptiness live. A slot with `Some(0)` is unavailable even when
    /// `active` is true.
    pub count: Option<i32>,
}

impl Slot {
    pub fn is_depleted(&self) -> bool {
        self.count == Some(0)
    }
}

/// Unhydrated slot row, used to seed the fixture store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub machine_id: i32,
    pub number: i32,
    pub item_id: Option<i32>,
    pub active: bool,
    pub count: Option<i32>,
}

/// Partial item update; omitted fields are unchanged. Validation lives in the
/// boundary layer, the stores assume validated input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub price: Option<i64>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none()
    }
}

/// Partial slot update. `count` distinguishes "leave unchanged" (`None`) from
/// "set to unmetered" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SlotPatch {
    pub item_id: Option<i32>,
    pub active: Option<bool>,
    pub count: Option<Option<i32>>,
}

impl SlotPatch {
    pub fn is_empty(&self) -> bool {
        self.item_id.is_none() && self.active.is_none() && self.count.is_none()
    }
}
