use crate::config::Overrides;
use crate::core::gst::GstReportType;
use crate::domain::model::{
    AccountType, BalanceType, CheckoutItemCheck, DateRange, InventoryAllocation, InventoryReturn,
    JournalEntryLine, Period, RequestStatus, ServiceStatus,
};
use crate::render::OutputFormat;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "pms-console", version, about = "Property back-office console")]
pub struct CliConfig {
    /// Profile file (defaults to ./pms-console.toml when present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, global = true, env = "PMS_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, global = true, env = "PMS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long, global = true)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write the rendering to this file instead of stdout
    #[arg(long, short, global = true)]
    pub output: Option<String>,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            timeout_seconds: self.timeout_seconds,
            format: self.format,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Headline figures and charts
    Dashboard {
        #[arg(long, value_enum, default_value = "month")]
        period: Period,
    },
    #[command(subcommand)]
    Accounts(AccountsCommand),
    #[command(subcommand)]
    Gst(GstCommand),
    #[command(subcommand)]
    Services(ServicesCommand),
    #[command(subcommand)]
    Requests(RequestsCommand),
    #[command(subcommand)]
    Checkout(CheckoutCommand),
    /// Employees and rooms
    Lookups,
}

/// `--from` / `--to` date filter
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    #[arg(long)]
    pub from: Option<NaiveDate>,
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl RangeArgs {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.from, self.to)
    }
}

#[derive(Args, Debug, Clone)]
pub struct GroupArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, value_enum)]
    pub account_type: AccountType,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LedgerArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub group_id: i64,
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, default_value_t = 0.0)]
    pub opening_balance: f64,
    #[arg(long, value_enum, default_value = "debit")]
    pub balance_type: BalanceType,
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AccountsCommand {
    Groups,
    CreateGroup(GroupArgs),
    UpdateGroup {
        id: i64,
        #[command(flatten)]
        group: GroupArgs,
    },
    DeleteGroup {
        id: i64,
    },
    Ledgers {
        #[arg(long)]
        group_id: Option<i64>,
        /// Keep fetching pages until the backend runs out
        #[arg(long)]
        all: bool,
    },
    CreateLedger(LedgerArgs),
    UpdateLedger {
        id: i64,
        #[command(flatten)]
        ledger: LedgerArgs,
    },
    DeleteLedger {
        id: i64,
    },
    /// Journal entries in a date range
    Journal {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        all: bool,
    },
    ShowEntry {
        id: i64,
    },
    /// Post a journal entry; debits and credits must balance
    PostEntry {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        description: String,
        #[arg(long)]
        reference_type: Option<String>,
        #[arg(long)]
        reference_id: Option<i64>,
        #[arg(long)]
        notes: Option<String>,
        /// ledger_id:debit:credit[:description], repeatable
        #[arg(long = "line", value_parser = parse_journal_line, required = true)]
        lines: Vec<JournalEntryLine>,
    },
    DeleteEntry {
        id: i64,
    },
    TrialBalance {
        /// Build from posted entries instead of ledger balances
        #[arg(long)]
        automatic: bool,
    },
    AutoReport {
        #[command(flatten)]
        range: RangeArgs,
    },
    ComprehensiveReport {
        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum GstCommand {
    Report {
        #[arg(value_enum)]
        report_type: GstReportType,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Upload a GSTR-2B file (json, csv, xlsx, xls) for reconciliation
    Reconcile {
        #[arg(long)]
        file: String,
        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub charges: f64,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub visible_to_guest: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ServicesCommand {
    List {
        #[arg(long)]
        all: bool,
    },
    Create(ServiceArgs),
    Update {
        id: i64,
        #[command(flatten)]
        service: ServiceArgs,
    },
    Delete {
        id: i64,
    },
    ToggleVisibility {
        id: i64,
    },
    Assign {
        #[arg(long)]
        service_id: i64,
        #[arg(long)]
        employee_id: i64,
        #[arg(long)]
        room_id: i64,
        /// item_id:quantity, repeatable
        #[arg(long = "item", value_parser = parse_allocation)]
        items: Vec<InventoryAllocation>,
    },
    Assigned {
        #[arg(long, value_enum)]
        status: Option<ServiceStatus>,
        #[arg(long)]
        employee_id: Option<i64>,
        #[arg(long)]
        all: bool,
    },
    ShowAssigned {
        id: i64,
    },
    Start {
        id: i64,
    },
    /// Mark completed, returning unused stock
    Complete {
        id: i64,
        /// item_id:quantity_returned, repeatable
        #[arg(long = "return", value_parser = parse_return)]
        returns: Vec<InventoryReturn>,
    },
    DeleteAssigned {
        id: i64,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum RequestsCommand {
    List {
        #[arg(long, value_enum)]
        status: Option<RequestStatus>,
        #[arg(long)]
        all: bool,
    },
    Create {
        #[arg(long)]
        room_id: i64,
        #[arg(long)]
        request_type: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        employee_id: Option<i64>,
    },
    Update {
        id: i64,
        #[arg(long, value_enum)]
        status: Option<RequestStatus>,
        #[arg(long)]
        employee_id: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum CheckoutCommand {
    Show {
        request_id: i64,
    },
    /// Record used/missing counts; unlisted items are submitted as untouched
    Verify {
        request_id: i64,
        /// item_id:used:missing[:damage notes], repeatable
        #[arg(long = "item", value_parser = parse_item_check)]
        items: Vec<CheckoutItemCheck>,
    },
}

fn parse_i64(field: &str, raw: &str) -> Result<i64, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("{} must be an integer, got '{}'", field, raw))
}

fn parse_f64(field: &str, raw: &str) -> Result<f64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse()
        .map_err(|_| format!("{} must be a number, got '{}'", field, raw))
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `ledger_id:debit:credit[:description]`
pub fn parse_journal_line(raw: &str) -> Result<JournalEntryLine, String> {
    let mut parts = raw.splitn(4, ':');
    let (Some(ledger), Some(debit), Some(credit)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected ledger_id:debit:credit[:description], got '{}'", raw));
    };
    Ok(JournalEntryLine {
        ledger_id: parse_i64("ledger_id", ledger)?,
        debit_amount: parse_f64("debit", debit)?,
        credit_amount: parse_f64("credit", credit)?,
        description: non_empty(parts.next()),
    })
}

/// `item_id:quantity`
pub fn parse_allocation(raw: &str) -> Result<InventoryAllocation, String> {
    let Some((item, quantity)) = raw.split_once(':') else {
        return Err(format!("expected item_id:quantity, got '{}'", raw));
    };
    Ok(InventoryAllocation {
        item_id: parse_i64("item_id", item)?,
        quantity: parse_f64("quantity", quantity)?,
    })
}

/// `item_id:quantity_returned`
pub fn parse_return(raw: &str) -> Result<InventoryReturn, String> {
    let Some((item, quantity)) = raw.split_once(':') else {
        return Err(format!("expected item_id:quantity_returned, got '{}'", raw));
    };
    Ok(InventoryReturn {
        item_id: parse_i64("item_id", item)?,
        quantity_returned: parse_f64("quantity_returned", quantity)?,
    })
}

/// `item_id:used:missing[:damage notes]`
pub fn parse_item_check(raw: &str) -> Result<CheckoutItemCheck, String> {
    let mut parts = raw.splitn(4, ':');
    let (Some(item), Some(used), Some(missing)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected item_id:used:missing[:notes], got '{}'", raw));
    };
    Ok(CheckoutItemCheck {
        item_id: parse_i64("item_id", item)?,
        used_qty: parse_f64("used", used)?,
        missing_qty: parse_f64("missing", missing)?,
        damage_notes: non_empty(parts.next()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_journal_line() {
        let line = parse_journal_line("12:1500.50:0:Room revenue: suite").unwrap();
        assert_eq!(line.ledger_id, 12);
        assert_eq!(line.debit_amount, 1500.50);
        assert_eq!(line.credit_amount, 0.0);
        assert_eq!(line.description.as_deref(), Some("Room revenue: suite"));

        let blank_debit = parse_journal_line("7::250").unwrap();
        assert_eq!(blank_debit.debit_amount, 0.0);
        assert_eq!(blank_debit.credit_amount, 250.0);
        assert!(blank_debit.description.is_none());

        assert!(parse_journal_line("7:100").is_err());
        assert!(parse_journal_line("cash:100:0").is_err());
    }

    #[test]
    fn test_parse_allocation_and_return() {
        let allocation = parse_allocation("4:2.5").unwrap();
        assert_eq!(allocation.item_id, 4);
        assert_eq!(allocation.quantity, 2.5);
        assert!(parse_allocation("4").is_err());

        let ret = parse_return("9:1").unwrap();
        assert_eq!(ret.item_id, 9);
        assert_eq!(ret.quantity_returned, 1.0);
        assert!(parse_return("x:1").is_err());
    }

    #[test]
    fn test_parse_item_check() {
        let check = parse_item_check("3:1:0:cracked glass").unwrap();
        assert_eq!(check.item_id, 3);
        assert_eq!(check.used_qty, 1.0);
        assert_eq!(check.missing_qty, 0.0);
        assert_eq!(check.damage_notes.as_deref(), Some("cracked glass"));
        assert!(parse_item_check("3:1").is_err());
    }

    #[test]
    fn test_cli_parses_post_entry() {
        let cli = CliConfig::try_parse_from([
            "pms-console",
            "--format",
            "json",
            "accounts",
            "post-entry",
            "--date",
            "2024-04-01",
            "--description",
            "Cash sale",
            "--line",
            "1:100:0",
            "--line",
            "2:0:100",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Command::Accounts(AccountsCommand::PostEntry { lines, date, .. }) => {
                assert_eq!(lines.len(), 2);
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_overrides_and_value_enums() {
        let cli = CliConfig::try_parse_from([
            "pms-console",
            "gst",
            "report",
            "b2b-sales",
            "--from",
            "2024-04-01",
            "--base-url",
            "http://127.0.0.1:9000/api",
            "--timeout-seconds",
            "5",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.base_url.as_deref(), Some("http://127.0.0.1:9000/api"));
        assert_eq!(overrides.timeout_seconds, Some(5));
        match cli.command {
            Command::Gst(GstCommand::Report { report_type, range }) => {
                assert_eq!(report_type, GstReportType::B2bSales);
                assert!(range.to.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_post_entry_requires_lines() {
        let result = CliConfig::try_parse_from([
            "pms-console",
            "accounts",
            "post-entry",
            "--date",
            "2024-04-01",
            "--description",
            "Cash sale",
        ]);
        assert!(result.is_err());
    }
}
