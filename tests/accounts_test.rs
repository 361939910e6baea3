mod common;

use anyhow::Result;
use chrono::NaiveDate;
use httpmock::prelude::*;
use pms_console::core::accounts::{ChartOfAccountsView, JournalView, TrialBalanceView};
use pms_console::domain::model::{DateRange, JournalEntryInput, JournalEntryLine};
use pms_console::domain::ports::View;
use pms_console::{ConsoleError, OutputFormat, ViewRunner};
use serde_json::json;

fn line(ledger_id: i64, debit: f64, credit: f64) -> JournalEntryLine {
    JournalEntryLine {
        ledger_id,
        debit_amount: debit,
        credit_amount: credit,
        description: None,
    }
}

fn entry(lines: Vec<JournalEntryLine>) -> JournalEntryInput {
    JournalEntryInput {
        entry_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        reference_type: Some("manual".to_string()),
        reference_id: None,
        description: "Room revenue".to_string(),
        notes: None,
        lines,
    }
}

#[tokio::test]
async fn test_unbalanced_entry_never_reaches_backend() -> Result<()> {
    let server = MockServer::start();
    let post_mock = server.mock(|when, then| {
        when.method(POST).path("/accounts/journal-entries");
        then.status(201).json_body(json!({"id": 1, "entry_date": "2024-04-01"}));
    });

    let mut view = JournalView::new(common::client_for(&server), 50, DateRange::default());
    let result = view
        .create_entry(&entry(vec![line(1, 100.0, 0.0), line(2, 0.0, 99.98)]))
        .await;

    match result {
        Err(ConsoleError::UnbalancedJournal { debits, credits }) => {
            assert_eq!(debits, 100.0);
            assert_eq!(credits, 99.98);
        }
        other => panic!("expected an unbalanced journal error, got {:?}", other.map(|e| e.id)),
    }
    assert_eq!(post_mock.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn test_balanced_entry_is_posted_and_list_reloaded() -> Result<()> {
    let server = MockServer::start();
    let post_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/accounts/journal-entries")
            .header("Authorization", "Bearer test-token")
            .json_body(json!({
                "entry_date": "2024-04-01",
                "reference_type": "manual",
                "description": "Room revenue",
                "lines": [
                    {"ledger_id": 1, "debit_amount": 100.0, "credit_amount": 0.0},
                    {"ledger_id": 2, "debit_amount": 0.0, "credit_amount": 100.004}
                ]
            }));
        then.status(201).json_body(json!({
            "id": 42,
            "entry_number": "JE-0042",
            "entry_date": "2024-04-01",
            "total_amount": 100.0
        }));
    });
    let list_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/accounts/journal-entries")
            .query_param("skip", "0")
            .query_param("limit", "50");
        then.status(200).json_body(json!([
            {"id": 42, "entry_number": "JE-0042", "entry_date": "2024-04-01", "total_amount": 100.0}
        ]));
    });

    let mut view = JournalView::new(common::client_for(&server), 50, DateRange::default());
    let posted = view
        .create_entry(&entry(vec![line(1, 100.0, 0.0), line(2, 0.0, 100.004)]))
        .await?;

    assert_eq!(posted.entry_number.as_deref(), Some("JE-0042"));
    post_mock.assert();
    list_mock.assert();
    assert_eq!(view.entries().items().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_journal_date_filter_is_sent() -> Result<()> {
    let server = MockServer::start();
    let list_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/accounts/journal-entries")
            .query_param("start_date", "2024-04-01")
            .query_param("end_date", "2024-04-30");
        then.status(200).json_body(json!([]));
    });

    let range = DateRange::new(NaiveDate::from_ymd_opt(2024, 4, 1), NaiveDate::from_ymd_opt(2024, 4, 30));
    let mut runner = ViewRunner::new(
        JournalView::new(common::client_for(&server), 50, range),
        OutputFormat::Table,
    );
    let output = runner.run().await?;

    list_mock.assert();
    assert!(output.contains("(no rows)"));
    Ok(())
}

#[tokio::test]
async fn test_inverted_date_range_is_rejected() {
    let server = MockServer::start();
    let range = DateRange::new(NaiveDate::from_ymd_opt(2024, 5, 1), NaiveDate::from_ymd_opt(2024, 4, 1));
    let mut view = JournalView::new(common::client_for(&server), 50, range);
    assert!(view.refresh().await.is_err());
}

#[tokio::test]
async fn test_missing_accounting_module_renders_not_provisioned() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/accounts/groups");
        then.status(404).json_body(json!({"detail": "Not Found"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/accounts/ledgers");
        then.status(404).json_body(json!({"detail": "Not Found"}));
    });

    let mut runner = ViewRunner::new(
        ChartOfAccountsView::new(common::client_for(&server), 50),
        OutputFormat::Table,
    );
    let output = runner.run().await?;

    assert!(output.contains("not provisioned"));
    assert!(runner.view().groups().error().is_none());
    assert!(runner.view().groups().is_not_provisioned());
    Ok(())
}

#[tokio::test]
async fn test_unauthorized_leaves_sections_empty_without_error() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/accounts/groups");
        then.status(401).json_body(json!({"detail": "Not authenticated"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/accounts/ledgers");
        then.status(401).json_body(json!({"detail": "Not authenticated"}));
    });

    let mut view = ChartOfAccountsView::new(common::client_for(&server), 50);
    view.refresh().await?;

    assert!(view.groups().is_empty());
    assert!(view.groups().error().is_none());
    assert!(view.ledgers().error().is_none());
    assert!(!view.has_more_ledgers());
    Ok(())
}

#[tokio::test]
async fn test_ledger_failure_keeps_groups() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/accounts/groups");
        then.status(200)
            .json_body(json!([{"id": 1, "name": "Current Assets", "account_type": "asset"}]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/accounts/ledgers");
        then.status(500).json_body(json!({"detail": "database unavailable"}));
    });

    let mut view = ChartOfAccountsView::new(common::client_for(&server), 50);
    view.refresh().await?;

    assert_eq!(view.groups().items().len(), 1);
    let error = view.ledgers().error().unwrap_or_default();
    assert!(error.starts_with("Failed to load ledgers"));
    Ok(())
}

#[tokio::test]
async fn test_automatic_trial_balance() -> Result<()> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/accounts/trial-balance")
            .query_param("automatic", "true");
        then.status(200).json_body(json!({
            "ledgers": [
                {"ledger_id": 1, "ledger_name": "Cash", "debit_balance": 500.0, "credit_balance": 0.0},
                {"ledger_id": 2, "ledger_name": "Room Revenue", "debit_balance": 0.0, "credit_balance": 500.0}
            ],
            "total_debits": 500.0,
            "total_credits": 500.0,
            "is_balanced": true
        }));
    });

    let mut runner = ViewRunner::new(TrialBalanceView::new(common::client_for(&server), true), OutputFormat::Csv);
    let output = runner.run().await?;

    mock.assert();
    assert!(output.contains("Room Revenue"));
    assert!(output.contains("TOTAL,,500.00,500.00"));
    Ok(())
}
