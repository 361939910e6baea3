//! GST compliance screens: the eight report registers laid out after the
//! GSTR-1/3B returns, and the GSTR-2B purchase reconciliation upload.

use crate::api::ApiClient;
use crate::core::section::Section;
use crate::domain::model::DateRange;
use crate::domain::ports::{Storage, View};
use crate::render::{self, OutputFormat, Table};
use crate::utils::error::Result;
use crate::utils::validation::{validate_date_range, validate_file_extension};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

pub const RECONCILIATION_PATH: &str = "/gst-reports/gstr2b-reconciliation";
pub const RECONCILIATION_EXTENSIONS: &[&str] = &["json", "csv", "xlsx", "xls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum GstReportType {
    MasterSummary,
    #[cfg_attr(feature = "cli", value(name = "b2b-sales"))]
    B2bSales,
    #[cfg_attr(feature = "cli", value(name = "b2c-sales"))]
    B2cSales,
    HsnSacSummary,
    ItcRegister,
    RcmRegister,
    AdvanceReceipt,
    RoomTariffSlab,
}

impl GstReportType {
    pub const ALL: [GstReportType; 8] = [
        GstReportType::MasterSummary,
        GstReportType::B2bSales,
        GstReportType::B2cSales,
        GstReportType::HsnSacSummary,
        GstReportType::ItcRegister,
        GstReportType::RcmRegister,
        GstReportType::AdvanceReceipt,
        GstReportType::RoomTariffSlab,
    ];

    /// Path segment under `/gst-reports/`.
    pub fn slug(&self) -> &'static str {
        match self {
            GstReportType::MasterSummary => "master-summary",
            GstReportType::B2bSales => "b2b-sales",
            GstReportType::B2cSales => "b2c-sales",
            GstReportType::HsnSacSummary => "hsn-sac-summary",
            GstReportType::ItcRegister => "itc-register",
            GstReportType::RcmRegister => "rcm-register",
            GstReportType::AdvanceReceipt => "advance-receipt",
            GstReportType::RoomTariffSlab => "room-tariff-slab",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GstReportType::MasterSummary => "GST master summary",
            GstReportType::B2bSales => "B2B sales register",
            GstReportType::B2cSales => "B2C sales register",
            GstReportType::HsnSacSummary => "HSN/SAC summary",
            GstReportType::ItcRegister => "Input tax credit register",
            GstReportType::RcmRegister => "Reverse charge register",
            GstReportType::AdvanceReceipt => "Advance receipts",
            GstReportType::RoomTariffSlab => "Room tariff slab summary",
        }
    }

    pub fn path(&self) -> String {
        format!("/gst-reports/{}", self.slug())
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.slug() == slug)
    }
}

/// Splits a report payload into its row arrays and the remaining scalars.
///
/// Registers come back as `{"data": [...], "summary": {...}}` or under a
/// report-specific key (`invoices`, `rows`, ...); a bare array is one block.
pub fn report_blocks(report: &Value) -> (Vec<(String, Vec<Value>)>, Vec<(String, String)>) {
    match report {
        Value::Array(rows) => (vec![("rows".to_string(), rows.clone())], Vec::new()),
        Value::Object(map) => {
            let mut blocks = Vec::new();
            let mut scalars = Vec::new();
            for (key, value) in map {
                match value {
                    Value::Array(rows) if rows.iter().all(Value::is_object) && !rows.is_empty() => {
                        blocks.push((key.clone(), rows.clone()));
                    }
                    other => scalars.extend(render::flatten_under(key, other)),
                }
            }
            (blocks, scalars)
        }
        other => (Vec::new(), vec![("value".to_string(), render::cell(other))]),
    }
}

pub struct GstReportView {
    client: ApiClient,
    report_type: GstReportType,
    range: DateRange,
    report: Section<Value>,
}

impl GstReportView {
    pub fn new(client: ApiClient, report_type: GstReportType, range: DateRange) -> Self {
        Self {
            client,
            report_type,
            range,
            report: Section::new(report_type.title()).provisioning_sensitive(),
        }
    }

    pub fn report(&self) -> &Section<Value> {
        &self.report
    }

    pub async fn load(&mut self) -> Result<()> {
        validate_date_range(self.range.start_date, self.range.end_date)?;
        if !self.report.begin_load() {
            return Ok(());
        }
        let result = self
            .client
            .get(&self.report_type.path(), &self.range.query())
            .await;
        self.report.finish(result);
        Ok(())
    }

    /// Uploads a GSTR-2B download for matching against the ITC register.
    pub async fn reconcile_gstr2b<S: Storage>(
        client: &ApiClient,
        storage: &S,
        file_path: &str,
        range: DateRange,
    ) -> Result<Value> {
        validate_file_extension("file", file_path, RECONCILIATION_EXTENSIONS)?;
        validate_date_range(range.start_date, range.end_date)?;

        let data = storage.read_file(file_path).await?;
        let file_name = Path::new(file_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("gstr2b.json")
            .to_string();

        tracing::info!("Uploading {} ({} bytes) for GSTR-2B reconciliation", file_name, data.len());
        client
            .upload(RECONCILIATION_PATH, &range.query(), &file_name, data)
            .await
    }

    pub fn render_report(report: &Value, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return render::to_json(report);
        }

        let (blocks, scalars) = report_blocks(report);
        let mut out = Vec::new();
        if !scalars.is_empty() {
            out.push(Table::key_values(scalars).render(format)?);
        }
        for (name, rows) in blocks {
            let table = render::json_rows_table(&rows).render(format)?;
            if format == OutputFormat::Table {
                out.push(format!("{} ({} rows)\n{}", name, rows.len(), table));
            } else {
                out.push(table);
            }
        }
        if out.is_empty() {
            out.push("(no data)".to_string());
        }
        Ok(out.join("\n\n"))
    }
}

#[async_trait]
impl View for GstReportView {
    fn title(&self) -> &str {
        self.report_type.title()
    }

    async fn refresh(&mut self) -> Result<()> {
        self.load().await
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        if self.report.is_not_provisioned() {
            return Ok(format!("{} is not provisioned on this server.", self.title()));
        }
        if let Some(error) = self.report.error() {
            return Ok(error.to_string());
        }
        Self::render_report(self.report.data(), format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slugs_round_trip() {
        for report_type in GstReportType::ALL {
            assert_eq!(GstReportType::from_slug(report_type.slug()), Some(report_type));
            assert!(report_type.path().starts_with("/gst-reports/"));
        }
        assert_eq!(GstReportType::from_slug("gstr-9"), None);
    }

    #[test]
    fn test_report_blocks_split() {
        let report = json!({
            "summary": {"total_taxable_value": 10000.0, "total_igst": 1200.0},
            "data": [
                {"invoice_no": "INV-1", "gstin": "29ABCDE1234F1Z5", "taxable_value": 10000.0}
            ]
        });
        let (blocks, scalars) = report_blocks(&report);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].0, "data");
        assert!(scalars.contains(&("summary.total_igst".to_string(), "1200.00".to_string())));
    }

    #[test]
    fn test_bare_array_report() {
        let report = json!([{"hsn_sac": "996311", "quantity": 12}]);
        let (blocks, scalars) = report_blocks(&report);
        assert_eq!(blocks[0].1.len(), 1);
        assert!(scalars.is_empty());
    }

    #[test]
    fn test_render_empty_report() {
        let rendered = GstReportView::render_report(&json!({}), OutputFormat::Table).unwrap();
        assert_eq!(rendered, "(no data)");
    }
}
