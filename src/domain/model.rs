//! Back-office payloads.
//!
//! Field names are the backend's, verbatim. Every entity keeps the fields this
//! client does not read in `extra`, so writing an entity back sends them as-is.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub type Extra = Map<String, Value>;

// ---------------------------------------------------------------------------
// Dashboard

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum), value(rename_all = "lower"))]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Week,
    Month,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_revenue: Option<f64>,
    #[serde(default)]
    pub occupancy_rate: Option<f64>,
    #[serde(default)]
    pub total_bookings: Option<i64>,
    #[serde(default)]
    pub available_rooms: Option<i64>,
    #[serde(default)]
    pub checkins_today: Option<i64>,
    #[serde(default)]
    pub checkouts_today: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `start_date`/`end_date` filter shared by the report screens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(start) = self.start_date {
            query.push(("start_date", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            query.push(("end_date", end.format("%Y-%m-%d").to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Accounting

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum), value(rename_all = "lower"))]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Revenue,
    Expense,
    Tax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum), value(rename_all = "lower"))]
#[serde(rename_all = "lowercase")]
pub enum BalanceType {
    Debit,
    Credit,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
            AccountType::Tax => "tax",
        }
    }
}

impl BalanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceType::Debit => "debit",
            BalanceType::Credit => "credit",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountGroup {
    pub id: i64,
    pub name: String,
    pub account_type: AccountType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountGroupInput {
    pub name: String,
    pub account_type: AccountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    pub group_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub opening_balance: f64,
    pub balance_type: BalanceType,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub group_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub opening_balance: f64,
    pub balance_type: BalanceType,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntryLine {
    pub ledger_id: i64,
    #[serde(default)]
    pub debit_amount: f64,
    #[serde(default)]
    pub credit_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: i64,
    #[serde(default)]
    pub entry_number: Option<String>,
    pub entry_date: NaiveDate,
    #[serde(default)]
    pub reference_type: Option<String>,
    #[serde(default)]
    pub reference_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub lines: Vec<JournalEntryLine>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntryInput {
    pub entry_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<i64>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub lines: Vec<JournalEntryLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub ledger_id: i64,
    pub ledger_name: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub debit_balance: f64,
    #[serde(default)]
    pub credit_balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalance {
    #[serde(default)]
    pub as_on_date: Option<NaiveDate>,
    #[serde(default)]
    pub ledgers: Vec<TrialBalanceRow>,
    #[serde(default)]
    pub total_debits: f64,
    #[serde(default)]
    pub total_credits: f64,
    #[serde(default)]
    pub is_balanced: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

// ---------------------------------------------------------------------------
// Services

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub charges: f64,
    #[serde(default)]
    pub is_visible_to_guest: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub charges: f64,
    pub is_visible_to_guest: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum), value(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Pending,
    InProgress,
    Completed,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "pending",
            ServiceStatus::InProgress => "in_progress",
            ServiceStatus::Completed => "completed",
        }
    }

    /// pending → in_progress → completed; no moving backwards.
    pub fn can_transition_to(&self, next: ServiceStatus) -> bool {
        matches!(
            (self, next),
            (ServiceStatus::Pending, ServiceStatus::InProgress)
                | (ServiceStatus::Pending, ServiceStatus::Completed)
                | (ServiceStatus::InProgress, ServiceStatus::Completed)
        )
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryAllocation {
    pub item_id: i64,
    pub quantity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignServiceInput {
    pub service_id: i64,
    pub employee_id: i64,
    pub room_id: i64,
    #[serde(default)]
    pub inventory_items: Vec<InventoryAllocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedInventoryItem {
    pub item_id: i64,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub quantity_assigned: f64,
    #[serde(default)]
    pub quantity_used: f64,
    #[serde(default)]
    pub balance_quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomRef {
    pub id: i64,
    #[serde(default)]
    pub number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedService {
    pub id: i64,
    pub service_id: i64,
    pub employee_id: i64,
    pub room_id: i64,
    pub status: ServiceStatus,
    #[serde(default)]
    pub assigned_at: Option<String>,
    #[serde(default)]
    pub service: Option<NamedRef>,
    #[serde(default)]
    pub employee: Option<NamedRef>,
    #[serde(default)]
    pub room: Option<RoomRef>,
    #[serde(default)]
    pub inventory_items: Vec<AssignedInventoryItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryReturn {
    pub item_id: i64,
    pub quantity_returned: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedServiceUpdate {
    pub status: ServiceStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inventory_returns: Vec<InventoryReturn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub number: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ---------------------------------------------------------------------------
// Service requests

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum), value(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: i64,
    pub room_id: i64,
    #[serde(default)]
    pub room_number: Option<String>,
    pub request_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: RequestStatus,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequestInput {
    pub room_id: i64,
    pub request_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceRequestUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Checkout verification

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutInventoryItem {
    pub item_id: i64,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub is_complimentary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutInventoryDetails {
    pub checkout_request_id: i64,
    #[serde(default)]
    pub room_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Vec<CheckoutInventoryItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutItemCheck {
    pub item_id: i64,
    #[serde(default)]
    pub used_qty: f64,
    #[serde(default)]
    pub missing_qty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutInventoryCheck {
    pub inventory_checked: bool,
    pub items: Vec<CheckoutItemCheck>,
}

fn default_true() -> bool {
    true
}
