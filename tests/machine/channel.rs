use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use vendo::{
    inventory::Machine,
    machine::{ChannelErrorKind, HttpMachineChannel, MachineChannel},
};

fn machine() -> Machine {
    Machine {
        id: 1,
        name: "m1".to_string(),
        display_name: "Lobby".to_string(),
    }
}

fn channel(url_template: String, timeout: Duration) -> HttpMachineChannel {
    HttpMachineChannel::new(url_template, "sekrit", timeout)
}

#[tokio::test]
async fn given_health_report_when_polling_then_slot_statuses_are_parsed() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/health");
            then.status(200).json_body(json!({
                "slots": [
                    { "number": 1, "empty": false },
                    { "number": 2, "empty": true }
                ]
            }));
        })
        .await;

    let statuses = channel(server.base_url(), Duration::from_secs(2))
        .poll_status(&machine())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(statuses.len(), 2);
    assert!(!statuses[0].empty);
    assert!(statuses[1].empty);
}

#[tokio::test]
async fn given_dispense_command_when_machine_accepts_then_token_and_slot_are_sent() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/drop")
                .header("X-Auth-Token", "sekrit")
                .json_body(json!({ "slot": 3 }));
            then.status(200).json_body(json!({ "message": "ok" }));
        })
        .await;

    channel(server.base_url(), Duration::from_secs(2))
        .dispense(&machine(), 3)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn given_machine_refusal_when_dispensing_then_rejection_carries_status_and_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/drop");
            then.status(503).body("slot jammed");
        })
        .await;

    let err = channel(server.base_url(), Duration::from_secs(2))
        .dispense(&machine(), 3)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ChannelErrorKind::Rejected);
    assert_eq!(err.status, Some(503));
    assert!(err.message.contains("slot jammed"));
}

#[tokio::test]
async fn given_no_listener_when_calling_then_the_failure_is_unreachable_not_timeout() {
    let err = channel("http://127.0.0.1:1".to_string(), Duration::from_secs(2))
        .poll_status(&machine())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ChannelErrorKind::Unreachable);
}

#[tokio::test]
async fn given_slow_machine_when_dispensing_then_the_bounded_timeout_fires() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/drop");
            then.status(200).delay(Duration::from_millis(800));
        })
        .await;

    let err = channel(server.base_url(), Duration::from_millis(100))
        .dispense(&machine(), 3)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ChannelErrorKind::TimedOut);
}

#[tokio::test]
async fn given_name_template_when_deriving_address_then_the_machine_name_is_substituted() {
    // The address comes from the machine's internal name; a template pointing
    // at a closed port proves the substitution happened (connection refused,
    // not a DNS error against the literal template).
    let err = channel(
        "http://{name}.invalid:1".to_string(),
        Duration::from_secs(1),
    )
    .poll_status(&machine())
    .await
    .unwrap_err();
    assert_eq!(err.kind, ChannelErrorKind::Unreachable);
    assert!(err.message.contains("m1"));
}
