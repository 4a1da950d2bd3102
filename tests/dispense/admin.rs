use std::sync::Arc;

use serde_json::json;
use vendo::{
    api::{self, ErrorBody, ItemCreateRequest, ItemUpdateRequest, SlotUpdateRequest},
    balance::{BalanceStore, MemoryBalanceStore},
    dispense::{DispenseErrorKind, error::slot_empty},
    inventory::{InventoryStore, StoreSelector},
};

use crate::common::inventory_fixture;

fn store() -> Arc<dyn InventoryStore> {
    inventory_fixture(Some(4))
}

fn balances() -> Arc<dyn BalanceStore> {
    Arc::new(MemoryBalanceStore::with_balances([("mom", 150)]))
}

#[tokio::test]
async fn given_a_blank_name_or_negative_price_when_creating_then_bad_params_is_reported() {
    let store = store();

    let err = api::create_item(
        &store,
        &ItemCreateRequest {
            name: "   ".to_string(),
            price: 100,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, DispenseErrorKind::BadParams);

    let err = api::create_item(
        &store,
        &ItemCreateRequest {
            name: "Cola".to_string(),
            price: -1,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, DispenseErrorKind::BadParams);
}

#[tokio::test]
async fn given_valid_input_when_creating_then_the_item_is_listed() {
    let store = store();
    let item = api::create_item(
        &store,
        &ItemCreateRequest {
            name: "Root Beer".to_string(),
            price: 125,
        },
    )
    .await
    .unwrap();

    assert_eq!(item.price, 125);
    let items = api::list_items(&store).await.unwrap();
    assert!(items.iter().any(|i| i.id == item.id));
}

#[tokio::test]
async fn given_an_update_naming_no_fields_then_bad_params_is_reported() {
    let err = api::update_item(
        &store(),
        &ItemUpdateRequest {
            id: 7,
            name: None,
            price: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, DispenseErrorKind::BadParams);
}

#[tokio::test]
async fn given_an_unknown_item_when_updating_or_deleting_then_not_found_is_reported() {
    let store = store();

    let err = api::update_item(
        &store,
        &ItemUpdateRequest {
            id: 99,
            name: Some("Ghost".to_string()),
            price: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, DispenseErrorKind::NotFound);

    let err = api::delete_item(&store, 99).await.unwrap_err();
    assert_eq!(err.kind, DispenseErrorKind::NotFound);
}

#[tokio::test]
async fn given_a_slot_update_naming_an_unknown_item_then_bad_params_is_reported() {
    let err = api::update_slot(
        &store(),
        &SlotUpdateRequest {
            machine: "m1".to_string(),
            slot: 3,
            item_id: Some(99),
            active: None,
            count: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, DispenseErrorKind::BadParams);
}

#[tokio::test]
async fn given_a_slot_update_with_no_changes_then_bad_params_is_reported() {
    let err = api::update_slot(
        &store(),
        &SlotUpdateRequest {
            machine: "m1".to_string(),
            slot: 3,
            item_id: None,
            active: None,
            count: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, DispenseErrorKind::BadParams);
    assert!(err.message.contains("either the state or item"));
}

#[tokio::test]
async fn given_a_count_of_null_when_updating_a_slot_then_the_counter_is_cleared() {
    let store = store();
    let slot = api::update_slot(
        &store,
        &SlotUpdateRequest {
            machine: "m1".to_string(),
            slot: 3,
            item_id: None,
            active: None,
            count: Some(None),
        },
    )
    .await
    .unwrap();
    assert_eq!(slot.count, None);
}

#[tokio::test]
async fn given_a_known_user_when_reading_and_writing_credits_then_the_guarded_write_applies() {
    let balances = balances();

    assert_eq!(api::get_credits(&balances, "mom").await.unwrap(), 150);

    let change = api::set_credits(&balances, "mom", 500, 150).await.unwrap();
    assert_eq!(change.old, 150);
    assert_eq!(change.new, 500);

    // A stale guard means someone spent in between; the admin write loses.
    let err = api::set_credits(&balances, "mom", 9000, 150)
        .await
        .unwrap_err();
    assert_eq!(err.kind, DispenseErrorKind::BadParams);

    let err = api::get_credits(&balances, "ghost").await.unwrap_err();
    assert_eq!(err.kind, DispenseErrorKind::NotFound);
}

#[test]
fn store_selector_binds_exactly_one_store_and_parses_from_the_wire() {
    let persistent = store();
    let fixture = store();

    let bound = api::select_inventory(StoreSelector::Fixture, &persistent, &fixture);
    assert!(Arc::ptr_eq(&bound, &fixture));

    let bound = api::select_inventory(StoreSelector::Persistent, &persistent, &fixture);
    assert!(Arc::ptr_eq(&bound, &persistent));

    let parsed: StoreSelector = serde_json::from_str("\"fixture\"").unwrap();
    assert_eq!(parsed, StoreSelector::Fixture);
}

#[test]
fn error_envelope_serializes_with_the_wire_field_names() {
    let err = slot_empty("slot 3 of 'm1' is empty");
    let body = ErrorBody::from(&err);
    let value = serde_json::to_value(&body).unwrap();

    assert_eq!(
        value,
        json!({
            "error": "slot_empty",
            "errorCode": 400,
            "message": "slot 3 of 'm1' is empty",
        })
    );
}

#[test]
fn every_failure_kind_maps_onto_a_stable_http_status() {
    use vendo::dispense::error::{
        ambiguous_outcome, insufficient_balance, internal_inconsistency, machine_rejected,
        machine_timed_out, machine_unreachable, unauthorized,
    };

    assert_eq!(api::http_status(&unauthorized("")), 401);
    assert_eq!(api::http_status(&slot_empty("")), 400);
    assert_eq!(api::http_status(&insufficient_balance("")), 402);
    assert_eq!(api::http_status(&machine_unreachable("")), 503);
    assert_eq!(api::http_status(&machine_timed_out("")), 504);
    assert_eq!(api::http_status(&machine_rejected(503, "")), 502);
    assert_eq!(api::http_status(&ambiguous_outcome("")), 504);
    assert_eq!(api::http_status(&internal_inconsistency("")), 500);
}
