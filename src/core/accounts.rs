//! Chart of accounts, journal entries, trial balance and the date-ranged
//! financial reports.
//!
//! Every listing here is provisioning sensitive: servers that have not run
//! the accounting migrations answer 404, which the screens show as
//! "not provisioned" instead of an error.

use crate::api::ApiClient;
use crate::core::pagination::Paginator;
use crate::core::section::Section;
use crate::domain::model::{
    AccountGroup, AccountGroupInput, DateRange, JournalEntry, JournalEntryInput, JournalEntryLine,
    Ledger, LedgerInput, TrialBalance,
};
use crate::domain::ports::View;
use crate::render::{self, OutputFormat, Table};
use crate::utils::error::{ConsoleError, Result};
use crate::utils::validation::{validate_date_range, validate_non_empty_string, validate_non_negative};
use async_trait::async_trait;
use serde_json::Value;

/// Largest debit/credit difference still accepted as balanced.
pub const BALANCE_TOLERANCE: f64 = 0.01;

const NOT_PROVISIONED: &str = "Accounting is not provisioned on this server.";

pub fn journal_totals(lines: &[JournalEntryLine]) -> (f64, f64) {
    lines.iter().fold((0.0, 0.0), |(debits, credits), line| {
        (debits + line.debit_amount, credits + line.credit_amount)
    })
}

/// Difference rounded to whole paise.
fn within_tolerance(debits: f64, credits: f64) -> bool {
    ((debits - credits) / BALANCE_TOLERANCE).round().abs() < 1.0
}

pub fn is_balanced(lines: &[JournalEntryLine]) -> bool {
    let (debits, credits) = journal_totals(lines);
    within_tolerance(debits, credits)
}

/// Client-side checks run before a journal entry is submitted.
pub fn validate_journal_entry(entry: &JournalEntryInput) -> Result<()> {
    validate_non_empty_string("description", &entry.description)?;

    if entry.lines.len() < 2 {
        return Err(ConsoleError::validation(
            "A journal entry needs at least one debit and one credit line",
        ));
    }

    for (index, line) in entry.lines.iter().enumerate() {
        let position = index + 1;
        validate_non_negative(&format!("line {} debit_amount", position), line.debit_amount)?;
        validate_non_negative(&format!("line {} credit_amount", position), line.credit_amount)?;

        if line.debit_amount > 0.0 && line.credit_amount > 0.0 {
            return Err(ConsoleError::validation(format!(
                "Line {} has both a debit and a credit amount",
                position
            )));
        }
        if line.debit_amount == 0.0 && line.credit_amount == 0.0 {
            return Err(ConsoleError::validation(format!(
                "Line {} has no amount",
                position
            )));
        }
    }

    let (debits, credits) = journal_totals(&entry.lines);
    if !within_tolerance(debits, credits) {
        return Err(ConsoleError::UnbalancedJournal { debits, credits });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Chart of accounts

pub struct ChartOfAccountsView {
    client: ApiClient,
    group_filter: Option<i64>,
    groups: Section<Vec<AccountGroup>>,
    ledgers: Section<Vec<Ledger>>,
    ledger_pager: Paginator,
}

impl ChartOfAccountsView {
    pub fn new(client: ApiClient, page_size: usize) -> Self {
        Self {
            client,
            group_filter: None,
            groups: Section::new("account groups").provisioning_sensitive(),
            ledgers: Section::new("ledgers").provisioning_sensitive(),
            ledger_pager: Paginator::new(page_size),
        }
    }

    pub fn with_group_filter(mut self, group_id: Option<i64>) -> Self {
        self.group_filter = group_id;
        self
    }

    pub fn groups(&self) -> &Section<Vec<AccountGroup>> {
        &self.groups
    }

    pub fn ledgers(&self) -> &Section<Vec<Ledger>> {
        &self.ledgers
    }

    pub fn has_more_ledgers(&self) -> bool {
        self.ledger_pager.has_more()
    }

    pub async fn load_groups(&mut self) {
        if !self.groups.begin_load() {
            return;
        }
        let result = self.client.get("/accounts/groups", &[]).await;
        self.groups.finish(result);
    }

    pub async fn load_more_ledgers(&mut self) -> bool {
        let Some(mut query) = self.ledgers.begin_page(&self.ledger_pager) else {
            return false;
        };
        if let Some(group_id) = self.group_filter {
            query.push(("group_id", group_id.to_string()));
        }
        let result = self.client.get("/accounts/ledgers", &query).await;
        self.ledgers.finish_page(&mut self.ledger_pager, result);
        true
    }

    pub async fn reload_ledgers(&mut self) {
        self.ledger_pager.reset();
        self.ledgers.clear();
        self.load_more_ledgers().await;
    }

    pub async fn create_group(&mut self, input: &AccountGroupInput) -> Result<AccountGroup> {
        validate_non_empty_string("name", &input.name)?;
        let group: AccountGroup = self.client.post("/accounts/groups", input).await?;
        tracing::info!("Created account group {} ({})", group.name, group.id);
        self.load_groups().await;
        Ok(group)
    }

    pub async fn update_group(&mut self, id: i64, input: &AccountGroupInput) -> Result<AccountGroup> {
        validate_non_empty_string("name", &input.name)?;
        let group: AccountGroup = self
            .client
            .put(&format!("/accounts/groups/{}", id), input)
            .await?;
        self.load_groups().await;
        Ok(group)
    }

    pub async fn delete_group(&mut self, id: i64) -> Result<()> {
        self.client.delete(&format!("/accounts/groups/{}", id)).await?;
        tracing::info!("Deleted account group {}", id);
        self.load_groups().await;
        Ok(())
    }

    pub async fn create_ledger(&mut self, input: &LedgerInput) -> Result<Ledger> {
        validate_non_empty_string("name", &input.name)?;
        let ledger: Ledger = self.client.post("/accounts/ledgers", input).await?;
        tracing::info!("Created ledger {} ({})", ledger.name, ledger.id);
        self.reload_ledgers().await;
        Ok(ledger)
    }

    pub async fn update_ledger(&mut self, id: i64, input: &LedgerInput) -> Result<Ledger> {
        validate_non_empty_string("name", &input.name)?;
        let ledger: Ledger = self
            .client
            .put(&format!("/accounts/ledgers/{}", id), input)
            .await?;
        self.reload_ledgers().await;
        Ok(ledger)
    }

    pub async fn delete_ledger(&mut self, id: i64) -> Result<()> {
        self.client.delete(&format!("/accounts/ledgers/{}", id)).await?;
        tracing::info!("Deleted ledger {}", id);
        self.reload_ledgers().await;
        Ok(())
    }

    fn group_name(&self, group_id: i64) -> String {
        self.groups
            .items()
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.name.clone())
            .unwrap_or_else(|| group_id.to_string())
    }

    pub fn groups_table(&self) -> Table {
        let mut table = Table::new(["id", "name", "account_type", "description"]);
        for group in self.groups.items() {
            table.push(vec![
                group.id.to_string(),
                group.name.clone(),
                group.account_type.as_str().to_string(),
                render::optional(&group.description),
            ]);
        }
        table
    }

    pub fn ledgers_table(&self) -> Table {
        let mut table = Table::new([
            "id",
            "code",
            "name",
            "group",
            "balance_type",
            "opening_balance",
            "active",
        ]);
        for ledger in self.ledgers.items() {
            table.push(vec![
                ledger.id.to_string(),
                render::optional(&ledger.code),
                ledger.name.clone(),
                self.group_name(ledger.group_id),
                ledger.balance_type.as_str().to_string(),
                render::money(ledger.opening_balance),
                if ledger.is_active { "yes" } else { "no" }.to_string(),
            ]);
        }
        table
    }
}

#[async_trait]
impl View for ChartOfAccountsView {
    fn title(&self) -> &str {
        "Chart of accounts"
    }

    async fn refresh(&mut self) -> Result<()> {
        self.load_groups().await;
        self.reload_ledgers().await;
        Ok(())
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        if self.groups.is_not_provisioned() || self.ledgers.is_not_provisioned() {
            return Ok(NOT_PROVISIONED.to_string());
        }
        if format == OutputFormat::Json {
            return render::to_json(&serde_json::json!({
                "groups": self.groups.items(),
                "ledgers": self.ledgers.items(),
            }));
        }

        let mut out = Vec::new();
        out.push(
            self.groups
                .error()
                .map(str::to_string)
                .map_or_else(|| self.groups_table().render(format), Ok)?,
        );
        out.push(
            self.ledgers
                .error()
                .map(str::to_string)
                .map_or_else(|| self.ledgers_table().render(format), Ok)?,
        );
        Ok(out.join("\n\n"))
    }
}

// ---------------------------------------------------------------------------
// Journal entries

pub struct JournalView {
    client: ApiClient,
    range: DateRange,
    entries: Section<Vec<JournalEntry>>,
    pager: Paginator,
}

impl JournalView {
    pub fn new(client: ApiClient, page_size: usize, range: DateRange) -> Self {
        Self {
            client,
            range,
            entries: Section::new("journal entries").provisioning_sensitive(),
            pager: Paginator::new(page_size),
        }
    }

    pub fn entries(&self) -> &Section<Vec<JournalEntry>> {
        &self.entries
    }

    pub fn has_more(&self) -> bool {
        self.pager.has_more()
    }

    pub async fn load_more(&mut self) -> bool {
        let Some(mut query) = self.entries.begin_page(&self.pager) else {
            return false;
        };
        query.extend(self.range.query());
        let result = self.client.get("/accounts/journal-entries", &query).await;
        self.entries.finish_page(&mut self.pager, result);
        true
    }

    pub async fn reload(&mut self) -> Result<()> {
        validate_date_range(self.range.start_date, self.range.end_date)?;
        self.pager.reset();
        self.entries.clear();
        self.load_more().await;
        Ok(())
    }

    pub async fn get_entry(&self, id: i64) -> Result<JournalEntry> {
        self.client
            .get(&format!("/accounts/journal-entries/{}", id), &[])
            .await
    }

    /// Rejected locally, without a request, unless debits and credits balance.
    pub async fn create_entry(&mut self, input: &JournalEntryInput) -> Result<JournalEntry> {
        validate_journal_entry(input)?;
        let entry: JournalEntry = self.client.post("/accounts/journal-entries", input).await?;
        tracing::info!(
            "Posted journal entry {} for {}",
            render::optional(&entry.entry_number),
            render::money(entry.total_amount)
        );
        self.reload().await?;
        Ok(entry)
    }

    pub async fn delete_entry(&mut self, id: i64) -> Result<()> {
        self.client
            .delete(&format!("/accounts/journal-entries/{}", id))
            .await?;
        tracing::info!("Deleted journal entry {}", id);
        self.reload().await
    }

    pub fn entries_table(&self) -> Table {
        let mut table = Table::new([
            "id",
            "entry_number",
            "entry_date",
            "description",
            "debits",
            "credits",
            "reference",
        ]);
        for entry in self.entries.items() {
            let (debits, credits) = journal_totals(&entry.lines);
            let reference = match (&entry.reference_type, entry.reference_id) {
                (Some(kind), Some(id)) => format!("{}#{}", kind, id),
                (Some(kind), None) => kind.clone(),
                _ => "-".to_string(),
            };
            table.push(vec![
                entry.id.to_string(),
                render::optional(&entry.entry_number),
                entry.entry_date.to_string(),
                render::optional(&entry.description),
                render::money(debits),
                render::money(credits),
                reference,
            ]);
        }
        table
    }

    pub fn lines_table(entry: &JournalEntry) -> Table {
        let mut table = Table::new(["ledger_id", "debit_amount", "credit_amount", "description"]);
        for line in &entry.lines {
            table.push(vec![
                line.ledger_id.to_string(),
                render::money(line.debit_amount),
                render::money(line.credit_amount),
                render::optional(&line.description),
            ]);
        }
        table
    }
}

#[async_trait]
impl View for JournalView {
    fn title(&self) -> &str {
        "Journal entries"
    }

    async fn refresh(&mut self) -> Result<()> {
        self.reload().await
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        if self.entries.is_not_provisioned() {
            return Ok(NOT_PROVISIONED.to_string());
        }
        if let Some(error) = self.entries.error() {
            if self.entries.is_empty() {
                return Ok(error.to_string());
            }
        }
        match format {
            OutputFormat::Json => render::to_json(self.entries.items()),
            _ => self.entries_table().render(format),
        }
    }
}

// ---------------------------------------------------------------------------
// Trial balance

pub struct TrialBalanceView {
    client: ApiClient,
    automatic: bool,
    balance: Section<Option<TrialBalance>>,
}

impl TrialBalanceView {
    /// `automatic` asks the server to derive balances from posted entries
    /// instead of the manually maintained ledger balances.
    pub fn new(client: ApiClient, automatic: bool) -> Self {
        Self {
            client,
            automatic,
            balance: Section::new("trial balance").provisioning_sensitive(),
        }
    }

    pub fn balance(&self) -> Option<&TrialBalance> {
        self.balance.data().as_ref()
    }

    pub async fn load(&mut self) {
        if !self.balance.begin_load() {
            return;
        }
        let result = self
            .client
            .get::<TrialBalance>(
                "/accounts/trial-balance",
                &[("automatic", self.automatic.to_string())],
            )
            .await
            .map(Some);
        self.balance.finish(result);
    }

    fn table(balance: &TrialBalance) -> Table {
        let mut table = Table::new(["ledger_id", "ledger", "group", "debit", "credit"]);
        for row in &balance.ledgers {
            table.push(vec![
                row.ledger_id.to_string(),
                row.ledger_name.clone(),
                render::optional(&row.group_name),
                render::money(row.debit_balance),
                render::money(row.credit_balance),
            ]);
        }
        table.push(vec![
            String::new(),
            "TOTAL".to_string(),
            String::new(),
            render::money(balance.total_debits),
            render::money(balance.total_credits),
        ]);
        table
    }
}

#[async_trait]
impl View for TrialBalanceView {
    fn title(&self) -> &str {
        "Trial balance"
    }

    async fn refresh(&mut self) -> Result<()> {
        self.load().await;
        Ok(())
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        if self.balance.is_not_provisioned() {
            return Ok(NOT_PROVISIONED.to_string());
        }
        if let Some(error) = self.balance.error() {
            return Ok(error.to_string());
        }
        let Some(balance) = self.balance() else {
            return Ok("(no data)".to_string());
        };

        match format {
            OutputFormat::Json => render::to_json(balance),
            OutputFormat::Csv => Self::table(balance).render(format),
            OutputFormat::Table => {
                let status = if balance.is_balanced {
                    "Books are balanced".to_string()
                } else {
                    format!(
                        "Books are NOT balanced (difference {})",
                        render::money((balance.total_debits - balance.total_credits).abs())
                    )
                };
                let mode = if self.automatic { "automatic" } else { "manual" };
                let as_on = balance
                    .as_on_date
                    .map(|d| format!(" as on {}", d))
                    .unwrap_or_default();
                Ok(format!(
                    "Trial balance ({}){}\n{}\n{}",
                    mode,
                    as_on,
                    Self::table(balance).to_text(),
                    status
                ))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Financial reports

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinancialReportKind {
    Auto,
    Comprehensive,
}

impl FinancialReportKind {
    pub fn path(&self) -> &'static str {
        match self {
            FinancialReportKind::Auto => "/accounts/auto-report",
            FinancialReportKind::Comprehensive => "/accounts/comprehensive-report",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FinancialReportKind::Auto => "Automatic accounting report",
            FinancialReportKind::Comprehensive => "Comprehensive financial report",
        }
    }
}

pub struct FinancialReportView {
    client: ApiClient,
    kind: FinancialReportKind,
    range: DateRange,
    report: Section<Value>,
}

impl FinancialReportView {
    pub fn new(client: ApiClient, kind: FinancialReportKind, range: DateRange) -> Self {
        Self {
            client,
            kind,
            range,
            report: Section::new(kind.title()).provisioning_sensitive(),
        }
    }

    pub fn report(&self) -> &Value {
        self.report.data()
    }

    pub async fn load(&mut self) -> Result<()> {
        validate_date_range(self.range.start_date, self.range.end_date)?;
        if !self.report.begin_load() {
            return Ok(());
        }
        let result = self.client.get(self.kind.path(), &self.range.query()).await;
        self.report.finish(result);
        Ok(())
    }
}

#[async_trait]
impl View for FinancialReportView {
    fn title(&self) -> &str {
        self.kind.title()
    }

    async fn refresh(&mut self) -> Result<()> {
        self.load().await
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        if self.report.is_not_provisioned() {
            return Ok(NOT_PROVISIONED.to_string());
        }
        if let Some(error) = self.report.error() {
            return Ok(error.to_string());
        }
        match format {
            OutputFormat::Json => render::to_json(self.report.data()),
            _ => Table::key_values(render::flatten_json(self.report.data())).render(format),
        }
    }
}
