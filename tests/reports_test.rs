mod common;

use anyhow::Result;
use chrono::NaiveDate;
use httpmock::prelude::*;
use pms_console::core::accounts::{FinancialReportKind, FinancialReportView};
use pms_console::core::dashboard::DashboardView;
use pms_console::core::gst::{GstReportType, GstReportView, RECONCILIATION_PATH};
use pms_console::domain::model::{DateRange, Period};
use pms_console::{LocalStorage, OutputFormat, ViewRunner};
use serde_json::json;
use std::io::Write;
use tempfile::TempDir;

fn april() -> DateRange {
    DateRange::new(NaiveDate::from_ymd_opt(2024, 4, 1), NaiveDate::from_ymd_opt(2024, 4, 30))
}

#[tokio::test]
async fn test_dashboard_summary_and_charts() -> Result<()> {
    let server = MockServer::start();
    let summary = server.mock(|when, then| {
        when.method(GET)
            .path("/dashboard/summary")
            .query_param("period", "week");
        then.status(200).json_body(json!({
            "total_revenue": 125000.5,
            "occupancy_rate": 72.5,
            "total_bookings": 48,
            "pending_payments": 3
        }));
    });
    let charts = server.mock(|when, then| {
        when.method(GET).path("/dashboard/charts");
        then.status(200).json_body(json!({
            "revenue_trend": [{"label": "Mon", "value": 100.0}, {"label": "Tue", "value": 250.0}],
            "generated_at": "2024-04-07T10:00:00"
        }));
    });

    let mut runner = ViewRunner::new(
        DashboardView::new(common::client_for(&server), Period::Week),
        OutputFormat::Table,
    );
    let output = runner.run().await?;

    summary.assert();
    charts.assert();
    assert!(output.contains("125000.50"));
    assert!(output.contains("72.5%"));
    assert!(output.contains("pending_payments"));
    assert!(output.contains("revenue_trend"));
    assert_eq!(runner.view().charts().data().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_dashboard_chart_failure_keeps_summary() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/dashboard/summary");
        then.status(200).json_body(json!({"total_bookings": 12}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/dashboard/charts");
        then.status(500).json_body(json!({"detail": "chart cache cold"}));
    });

    let mut runner = ViewRunner::new(
        DashboardView::new(common::client_for(&server), Period::Month),
        OutputFormat::Table,
    );
    let output = runner.run().await?;

    assert!(output.contains("total_bookings"));
    assert!(output.contains("Failed to load dashboard charts"));
    Ok(())
}

#[tokio::test]
async fn test_every_gst_report_hits_its_endpoint() -> Result<()> {
    let server = MockServer::start();
    let client = common::client_for(&server);

    for report_type in GstReportType::ALL {
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path(report_type.path())
                .query_param("start_date", "2024-04-01")
                .query_param("end_date", "2024-04-30");
            then.status(200).json_body(json!({
                "data": [{"invoice_number": "INV-1", "taxable_value": 1000.0}],
                "total_tax": 180.0
            }));
        });

        let mut runner = ViewRunner::new(
            GstReportView::new(client.clone(), report_type, april()),
            OutputFormat::Table,
        );
        let output = runner.run().await?;

        mock.assert();
        assert!(output.contains("INV-1"), "{} output: {}", report_type.slug(), output);
        assert!(output.contains("total_tax"));
    }
    Ok(())
}

#[tokio::test]
async fn test_gst_not_provisioned() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gst-reports/itc-register");
        then.status(404).json_body(json!({"detail": "Not Found"}));
    });

    let mut runner = ViewRunner::new(
        GstReportView::new(common::client_for(&server), GstReportType::ItcRegister, DateRange::default()),
        OutputFormat::Table,
    );
    let output = runner.run().await?;

    assert!(output.contains("not provisioned"));
    Ok(())
}

#[tokio::test]
async fn test_gstr2b_upload() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut file = std::fs::File::create(temp_dir.path().join("gstr2b_april.json"))?;
    file.write_all(br#"{"b2b": [{"ctin": "29ABCDE1234F1Z5"}]}"#)?;

    let server = MockServer::start();
    let upload = server.mock(|when, then| {
        when.method(POST)
            .path(RECONCILIATION_PATH)
            .query_param("start_date", "2024-04-01")
            .body_contains("gstr2b_april.json")
            .body_contains("29ABCDE1234F1Z5");
        then.status(200).json_body(json!({
            "matched": [{"invoice_number": "INV-1"}],
            "missing_in_books": [],
            "matched_count": 1
        }));
    });

    let storage = LocalStorage::new(temp_dir.path().to_string_lossy().to_string());
    let result =
        GstReportView::reconcile_gstr2b(&common::client_for(&server), &storage, "gstr2b_april.json", april())
            .await?;

    upload.assert();
    assert_eq!(result["matched_count"], 1);
    let rendered = GstReportView::render_report(&result, OutputFormat::Table)?;
    assert!(rendered.contains("INV-1"));
    Ok(())
}

#[tokio::test]
async fn test_gstr2b_rejects_unknown_extension() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("gstr2b.pdf"), b"%PDF")?;

    let server = MockServer::start();
    let upload = server.mock(|when, then| {
        when.method(POST).path(RECONCILIATION_PATH);
        then.status(200).json_body(json!({}));
    });

    let storage = LocalStorage::new(temp_dir.path().to_string_lossy().to_string());
    let result =
        GstReportView::reconcile_gstr2b(&common::client_for(&server), &storage, "gstr2b.pdf", DateRange::default())
            .await;

    assert!(result.is_err());
    assert_eq!(upload.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn test_comprehensive_report_flattened() -> Result<()> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/accounts/comprehensive-report")
            .query_param("end_date", "2024-04-30");
        then.status(200).json_body(json!({
            "profit_and_loss": {"revenue": 5000.0, "expenses": 3200.0},
            "balance_sheet": {"assets": 12000.0}
        }));
    });

    let mut runner = ViewRunner::new(
        FinancialReportView::new(common::client_for(&server), FinancialReportKind::Comprehensive, april()),
        OutputFormat::Csv,
    );
    let output = runner.run().await?;

    mock.assert();
    assert!(output.contains("profit_and_loss.revenue"));
    assert!(output.contains("balance_sheet.assets"));
    Ok(())
}
