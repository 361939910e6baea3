mod common;

use anyhow::Result;
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use pms_console::core::checkout::CheckoutVerificationView;
use pms_console::core::requests::ServiceRequestsView;
use pms_console::core::services::{AssignedFilter, AssignedServicesView, ServiceCatalogView};
use pms_console::domain::model::{CheckoutItemCheck, InventoryReturn, RequestStatus, ServiceStatus};
use pms_console::domain::ports::View;
use pms_console::{ConsoleError, OutputFormat, ViewRunner};
use serde_json::json;

fn service(id: i64, visible: bool) -> serde_json::Value {
    json!({"id": id, "name": format!("Service {}", id), "charges": 250.0, "is_visible_to_guest": visible})
}

fn assignment(status: &str) -> serde_json::Value {
    json!({
        "id": 7,
        "service_id": 1,
        "employee_id": 3,
        "room_id": 101,
        "status": status,
        "inventory_items": [
            {"item_id": 11, "item_name": "Towel", "quantity_assigned": 4.0, "quantity_used": 1.0, "balance_quantity": 3.0},
            {"item_id": 12, "item_name": "Soap", "quantity_assigned": 2.0, "quantity_used": 2.0, "balance_quantity": 0.0}
        ]
    })
}

#[tokio::test]
async fn test_pagination_stops_after_short_page() -> Result<()> {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/services")
            .query_param("skip", "0")
            .query_param("limit", "2");
        then.status(200).json_body(json!([service(1, true), service(2, false)]));
    });
    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/services")
            .query_param("skip", "2")
            .query_param("limit", "2");
        then.status(200).json_body(json!([service(3, true)]));
    });

    let mut view = ServiceCatalogView::new(common::client_for(&server), 2);
    view.refresh().await?;
    assert!(view.has_more());

    assert!(view.load_more().await);
    assert!(!view.has_more());
    assert!(!view.load_more().await);

    first.assert();
    second.assert();
    assert_eq!(view.services().items().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_failed_page_keeps_rows_and_stops() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/services").query_param("skip", "0");
        then.status(200).json_body(json!([service(1, true), service(2, true)]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/services").query_param("skip", "2");
        then.status(503).body("upstream down");
    });

    let mut view = ServiceCatalogView::new(common::client_for(&server), 2);
    view.refresh().await?;
    view.load_more().await;

    assert_eq!(view.services().items().len(), 2);
    assert!(view.services().error().is_some());
    assert!(!view.has_more());
    Ok(())
}

#[tokio::test]
async fn test_visibility_toggle_reads_back_server_state() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/services");
        then.status(200).json_body(json!([service(5, false)]));
    });
    let patch = server.mock(|when, then| {
        when.method(PATCH)
            .path("/services/5")
            .json_body(json!({"is_visible_to_guest": true}));
        then.status(200).json_body(json!({"ok": true}));
    });
    let read_back = server.mock(|when, then| {
        when.method(GET).path("/services/5");
        then.status(200).json_body(service(5, true));
    });

    let mut view = ServiceCatalogView::new(common::client_for(&server), 20);
    view.refresh().await?;
    let updated = view.set_guest_visibility(5, true).await?;

    patch.assert();
    read_back.assert();
    assert!(updated.is_visible_to_guest);
    assert!(view.services().items()[0].is_visible_to_guest);
    Ok(())
}

#[tokio::test]
async fn test_toggle_flips_server_value_not_listed_row() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/services");
        then.status(200).json_body(json!([service(5, true)]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/services/5");
        then.status(200).json_body(service(5, false));
    });
    let patch = server.mock(|when, then| {
        when.method(PATCH)
            .path("/services/5")
            .json_body(json!({"is_visible_to_guest": true}));
        then.status(200).json_body(json!({"ok": true}));
    });

    let mut view = ServiceCatalogView::new(common::client_for(&server), 20);
    view.refresh().await?;
    let updated = view.toggle_guest_visibility(5).await?;

    patch.assert();
    // the row now shows what the server re-read, not what was sent
    assert!(!updated.is_visible_to_guest);
    assert!(!view.services().items()[0].is_visible_to_guest);
    Ok(())
}

#[tokio::test]
async fn test_return_above_balance_is_not_sent() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/services/assigned/7");
        then.status(200).json_body(assignment("in_progress"));
    });
    let patch = server.mock(|when, then| {
        when.method(PATCH).path("/services/assigned/7");
        then.status(200).json_body(assignment("completed"));
    });

    let mut view = AssignedServicesView::new(common::client_for(&server), 20, AssignedFilter::default());
    let result = view
        .complete(
            7,
            vec![InventoryReturn {
                item_id: 11,
                quantity_returned: 3.5,
            }],
        )
        .await;

    assert!(matches!(
        result,
        Err(ConsoleError::ReturnExceedsBalance { item_id: 11, .. })
    ));
    assert_eq!(patch.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn test_completion_sends_returns() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/services/assigned/7");
        then.status(200).json_body(assignment("in_progress"));
    });
    let patch = server.mock(|when, then| {
        when.method(PATCH).path("/services/assigned/7").json_body(json!({
            "status": "completed",
            "inventory_returns": [{"item_id": 11, "quantity_returned": 3.0}]
        }));
        then.status(200).json_body(assignment("completed"));
    });

    let mut view = AssignedServicesView::new(common::client_for(&server), 20, AssignedFilter::default());
    let completed = view
        .complete(
            7,
            vec![InventoryReturn {
                item_id: 11,
                quantity_returned: 3.0,
            }],
        )
        .await?;

    patch.assert();
    assert_eq!(completed.status, ServiceStatus::Completed);
    Ok(())
}

#[tokio::test]
async fn test_completed_assignment_cannot_restart() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/services/assigned/7");
        then.status(200).json_body(assignment("completed"));
    });
    let patch = server.mock(|when, then| {
        when.method(PATCH).path("/services/assigned/7");
        then.status(200).json_body(assignment("in_progress"));
    });

    let mut view = AssignedServicesView::new(common::client_for(&server), 20, AssignedFilter::default());
    assert!(view.update_status(7, ServiceStatus::InProgress).await.is_err());
    assert_eq!(patch.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn test_assigned_filter_query() -> Result<()> {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/services/assigned")
            .query_param("status", "pending")
            .query_param("employee_id", "3");
        then.status(200).json_body(json!([assignment("pending")]));
    });

    let filter = AssignedFilter {
        status: Some(ServiceStatus::Pending),
        employee_id: Some(3),
    };
    let mut runner = ViewRunner::new(
        AssignedServicesView::new(common::client_for(&server), 20, filter),
        OutputFormat::Table,
    );
    let output = runner.run().await?;

    list.assert();
    assert!(output.contains("pending"));
    Ok(())
}

#[tokio::test]
async fn test_service_request_status_update() -> Result<()> {
    let server = MockServer::start();
    let put = server.mock(|when, then| {
        when.method(PUT)
            .path("/service-requests/9")
            .json_body(json!({"status": "completed"}));
        then.status(200).json_body(json!({
            "id": 9, "room_id": 101, "request_type": "housekeeping", "status": "completed"
        }));
    });

    let mut view = ServiceRequestsView::new(common::client_for(&server), 10, None);
    let updated = view.set_status(9, RequestStatus::Completed).await?;

    put.assert();
    assert_eq!(updated.status, RequestStatus::Completed);
    Ok(())
}

#[tokio::test]
async fn test_checkout_verification_fills_untouched_items() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/bill/checkout-request/4/inventory-details");
        then.status(200).json_body(json!({
            "checkout_request_id": 4,
            "room_number": "101",
            "items": [
                {"item_id": 1, "item_name": "Minibar water", "quantity": 2.0},
                {"item_id": 2, "item_name": "Bathrobe", "quantity": 1.0}
            ]
        }));
    });
    let check = server.mock(|when, then| {
        when.method(POST)
            .path("/bill/checkout-request/4/check-inventory")
            .json_body(json!({
                "inventory_checked": true,
                "items": [
                    {"item_id": 1, "used_qty": 2.0, "missing_qty": 0.0},
                    {"item_id": 2, "used_qty": 0.0, "missing_qty": 0.0}
                ]
            }));
        then.status(200).json_body(json!({"message": "Inventory checked"}));
    });

    let mut view = CheckoutVerificationView::new(common::client_for(&server), 4);
    view.refresh().await?;
    view.submit_check(vec![CheckoutItemCheck {
        item_id: 1,
        used_qty: 2.0,
        missing_qty: 0.0,
        damage_notes: None,
    }])
    .await?;

    check.assert();
    Ok(())
}
