use clap::Parser;
use pms_console::config::cli::{
    AccountsCommand, CheckoutCommand, Command, GroupArgs, GstCommand, LedgerArgs, RequestsCommand,
    ServiceArgs, ServicesCommand,
};
use pms_console::core::accounts::{
    ChartOfAccountsView, FinancialReportKind, FinancialReportView, JournalView, TrialBalanceView,
};
use pms_console::core::checkout::CheckoutVerificationView;
use pms_console::core::dashboard::DashboardView;
use pms_console::core::gst::GstReportView;
use pms_console::core::requests::ServiceRequestsView;
use pms_console::core::services::{AssignedFilter, AssignedServicesView, LookupsView, ServiceCatalogView};
use pms_console::domain::model::{
    AccountGroupInput, AssignServiceInput, DateRange, JournalEntryInput, LedgerInput, ServiceInput,
    ServiceRequestInput, ServiceRequestUpdate, ServiceStatus,
};
use pms_console::domain::ports::{ConfigProvider, Screen, Storage};
use pms_console::render::{self, OutputFormat};
use pms_console::utils::{logger, validation::Validate};
use pms_console::{ApiClient, CliConfig, LocalStorage, Result, Settings, ViewRunner};
use serde::Serialize;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI arguments: {:?}", cli.command);

    if let Err(e) = execute(cli).await {
        // 401 不提示，交給登入流程
        if e.is_silent() {
            tracing::debug!("Suppressed: {}", e);
            return;
        }

        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn execute(cli: CliConfig) -> Result<()> {
    // 載入並驗證配置
    let settings = Settings::load(cli.config.as_deref(), cli.overrides())?;
    settings.validate()?;
    tracing::debug!("Using backend at {}", settings.base_url);

    let client = ApiClient::new(&settings)?;
    let output = dispatch(cli.command, &settings, client).await?;

    match cli.output {
        Some(path) => {
            let storage = LocalStorage::new(".".to_string());
            storage.write_file(&path, output.as_bytes()).await?;
            tracing::info!("📁 Output saved to: {}", path);
        }
        None => println!("{}", output),
    }
    Ok(())
}

/// Mutations answer with the stored entity: JSON when asked for, else a one-line note.
fn confirm<T: Serialize>(format: OutputFormat, message: String, entity: &T) -> Result<String> {
    match format {
        OutputFormat::Json => render::to_json(entity),
        _ => Ok(format!("✅ {}", message)),
    }
}

async fn dispatch(command: Command, settings: &Settings, client: ApiClient) -> Result<String> {
    let format = settings.format;
    match command {
        Command::Dashboard { period } => {
            ViewRunner::new(DashboardView::new(client, period), format).run().await
        }
        Command::Accounts(command) => accounts(command, settings, client).await,
        Command::Gst(command) => gst(command, format, client).await,
        Command::Services(command) => services(command, settings, client).await,
        Command::Requests(command) => requests(command, settings, client).await,
        Command::Checkout(command) => checkout(command, format, client).await,
        Command::Lookups => ViewRunner::new(LookupsView::new(client), format).run().await,
    }
}

fn group_input(args: GroupArgs) -> AccountGroupInput {
    AccountGroupInput {
        name: args.name,
        account_type: args.account_type,
        description: args.description,
    }
}

fn ledger_input(args: LedgerArgs) -> LedgerInput {
    LedgerInput {
        name: args.name,
        code: args.code,
        group_id: args.group_id,
        description: args.description,
        opening_balance: args.opening_balance,
        balance_type: args.balance_type,
        is_active: !args.inactive,
    }
}

async fn accounts(command: AccountsCommand, settings: &Settings, client: ApiClient) -> Result<String> {
    let format = settings.format;
    let chart = || ChartOfAccountsView::new(client.clone(), settings.page_size(Screen::Ledgers));

    match command {
        AccountsCommand::Groups => {
            let mut view = chart();
            view.load_groups().await;
            if let Some(error) = view.groups().error() {
                return Ok(error.to_string());
            }
            if view.groups().is_not_provisioned() {
                return Ok("Accounting is not provisioned on this server.".to_string());
            }
            match format {
                OutputFormat::Json => render::to_json(view.groups().items()),
                _ => view.groups_table().render(format),
            }
        }
        AccountsCommand::CreateGroup(args) => {
            let group = chart().create_group(&group_input(args)).await?;
            confirm(format, format!("Created account group {} ({})", group.name, group.id), &group)
        }
        AccountsCommand::UpdateGroup { id, group } => {
            let group = chart().update_group(id, &group_input(group)).await?;
            confirm(format, format!("Updated account group {}", group.id), &group)
        }
        AccountsCommand::DeleteGroup { id } => {
            chart().delete_group(id).await?;
            Ok(format!("✅ Deleted account group {}", id))
        }
        AccountsCommand::Ledgers { group_id, all } => {
            let mut runner = ViewRunner::new(chart().with_group_filter(group_id), format);
            let output = runner.run().await?;
            if !all {
                return Ok(output);
            }
            while runner.view().has_more_ledgers() && runner.view_mut().load_more_ledgers().await {}
            runner.render()
        }
        AccountsCommand::CreateLedger(args) => {
            let ledger = chart().create_ledger(&ledger_input(args)).await?;
            confirm(format, format!("Created ledger {} ({})", ledger.name, ledger.id), &ledger)
        }
        AccountsCommand::UpdateLedger { id, ledger } => {
            let ledger = chart().update_ledger(id, &ledger_input(ledger)).await?;
            confirm(format, format!("Updated ledger {}", ledger.id), &ledger)
        }
        AccountsCommand::DeleteLedger { id } => {
            chart().delete_ledger(id).await?;
            Ok(format!("✅ Deleted ledger {}", id))
        }
        AccountsCommand::Journal { range, all } => {
            let view = JournalView::new(client, settings.page_size(Screen::JournalEntries), range.range());
            let mut runner = ViewRunner::new(view, format);
            let output = runner.run().await?;
            if !all {
                return Ok(output);
            }
            while runner.view().has_more() && runner.view_mut().load_more().await {}
            runner.render()
        }
        AccountsCommand::ShowEntry { id } => {
            let view = JournalView::new(client, 1, DateRange::default());
            let entry = view.get_entry(id).await?;
            match format {
                OutputFormat::Json => render::to_json(&entry),
                _ => JournalView::lines_table(&entry).render(format),
            }
        }
        AccountsCommand::PostEntry {
            date,
            description,
            reference_type,
            reference_id,
            notes,
            lines,
        } => {
            let input = JournalEntryInput {
                entry_date: date,
                reference_type,
                reference_id,
                description,
                notes,
                lines,
            };
            let mut view = JournalView::new(client, settings.page_size(Screen::JournalEntries), DateRange::default());
            let entry = view.create_entry(&input).await?;
            let number = entry.entry_number.clone().unwrap_or_else(|| entry.id.to_string());
            confirm(format, format!("Posted journal entry {}", number), &entry)
        }
        AccountsCommand::DeleteEntry { id } => {
            let mut view = JournalView::new(client, 1, DateRange::default());
            view.delete_entry(id).await?;
            Ok(format!("✅ Deleted journal entry {}", id))
        }
        AccountsCommand::TrialBalance { automatic } => {
            ViewRunner::new(TrialBalanceView::new(client, automatic), format).run().await
        }
        AccountsCommand::AutoReport { range } => {
            let view = FinancialReportView::new(client, FinancialReportKind::Auto, range.range());
            ViewRunner::new(view, format).run().await
        }
        AccountsCommand::ComprehensiveReport { range } => {
            let view = FinancialReportView::new(client, FinancialReportKind::Comprehensive, range.range());
            ViewRunner::new(view, format).run().await
        }
    }
}

async fn gst(command: GstCommand, format: OutputFormat, client: ApiClient) -> Result<String> {
    match command {
        GstCommand::Report { report_type, range } => {
            let view = GstReportView::new(client, report_type, range.range());
            ViewRunner::new(view, format).run().await
        }
        GstCommand::Reconcile { file, range } => {
            let storage = LocalStorage::new(".".to_string());
            let result = GstReportView::reconcile_gstr2b(&client, &storage, &file, range.range()).await?;
            GstReportView::render_report(&result, format)
        }
    }
}

fn service_input(args: ServiceArgs) -> ServiceInput {
    ServiceInput {
        name: args.name,
        description: args.description,
        charges: args.charges,
        is_visible_to_guest: args.visible_to_guest,
    }
}

async fn services(command: ServicesCommand, settings: &Settings, client: ApiClient) -> Result<String> {
    let format = settings.format;
    let catalog = || ServiceCatalogView::new(client.clone(), settings.page_size(Screen::Services));
    let assigned = |filter: AssignedFilter| {
        AssignedServicesView::new(client.clone(), settings.page_size(Screen::AssignedServices), filter)
    };

    match command {
        ServicesCommand::List { all } => {
            let mut runner = ViewRunner::new(catalog(), format);
            let output = runner.run().await?;
            if !all {
                return Ok(output);
            }
            while runner.view().has_more() && runner.view_mut().load_more().await {}
            runner.render()
        }
        ServicesCommand::Create(args) => {
            let service = catalog().create(&service_input(args)).await?;
            confirm(format, format!("Created service {} ({})", service.name, service.id), &service)
        }
        ServicesCommand::Update { id, service } => {
            let service = catalog().update(id, &service_input(service)).await?;
            confirm(format, format!("Updated service {}", service.id), &service)
        }
        ServicesCommand::Delete { id } => {
            catalog().delete(id).await?;
            Ok(format!("✅ Deleted service {}", id))
        }
        ServicesCommand::ToggleVisibility { id } => {
            let service = catalog().toggle_guest_visibility(id).await?;
            let state = if service.is_visible_to_guest { "visible" } else { "hidden" };
            confirm(format, format!("Service {} is now {} to guests", service.id, state), &service)
        }
        ServicesCommand::Assign {
            service_id,
            employee_id,
            room_id,
            items,
        } => {
            let input = AssignServiceInput {
                service_id,
                employee_id,
                room_id,
                inventory_items: items,
            };
            let assignment = assigned(AssignedFilter::default()).assign(&input).await?;
            confirm(format, format!("Created assignment {}", assignment.id), &assignment)
        }
        ServicesCommand::Assigned {
            status,
            employee_id,
            all,
        } => {
            let filter = AssignedFilter { status, employee_id };
            let mut runner = ViewRunner::new(assigned(filter), format);
            let output = runner.run().await?;
            if !all {
                return Ok(output);
            }
            while runner.view().has_more() && runner.view_mut().load_more().await {}
            runner.render()
        }
        ServicesCommand::ShowAssigned { id } => {
            let assignment = assigned(AssignedFilter::default()).get(id).await?;
            match format {
                OutputFormat::Json => render::to_json(&assignment),
                _ => AssignedServicesView::inventory_table(&assignment).render(format),
            }
        }
        ServicesCommand::Start { id } => {
            let assignment = assigned(AssignedFilter::default())
                .update_status(id, ServiceStatus::InProgress)
                .await?;
            confirm(format, format!("Assignment {} is {}", assignment.id, assignment.status), &assignment)
        }
        ServicesCommand::Complete { id, returns } => {
            let assignment = assigned(AssignedFilter::default()).complete(id, returns).await?;
            confirm(format, format!("Assignment {} is {}", assignment.id, assignment.status), &assignment)
        }
        ServicesCommand::DeleteAssigned { id } => {
            assigned(AssignedFilter::default()).delete(id).await?;
            Ok(format!("✅ Deleted assignment {}", id))
        }
    }
}

async fn requests(command: RequestsCommand, settings: &Settings, client: ApiClient) -> Result<String> {
    let format = settings.format;
    let page_size = settings.page_size(Screen::ServiceRequests);

    match command {
        RequestsCommand::List { status, all } => {
            let mut runner = ViewRunner::new(ServiceRequestsView::new(client, page_size, status), format);
            let output = runner.run().await?;
            if !all {
                return Ok(output);
            }
            while runner.view().has_more() && runner.view_mut().load_more().await {}
            runner.render()
        }
        RequestsCommand::Create {
            room_id,
            request_type,
            description,
            employee_id,
        } => {
            let input = ServiceRequestInput {
                room_id,
                request_type,
                description,
                employee_id,
            };
            let request = ServiceRequestsView::new(client, page_size, None).create(&input).await?;
            confirm(format, format!("Created service request {}", request.id), &request)
        }
        RequestsCommand::Update {
            id,
            status,
            employee_id,
            description,
        } => {
            let update = ServiceRequestUpdate {
                status,
                employee_id,
                description,
            };
            let request = ServiceRequestsView::new(client, page_size, None)
                .update(id, &update)
                .await?;
            confirm(format, format!("Updated service request {}", request.id), &request)
        }
        RequestsCommand::Delete { id } => {
            ServiceRequestsView::new(client, page_size, None).delete(id).await?;
            Ok(format!("✅ Deleted service request {}", id))
        }
    }
}

async fn checkout(command: CheckoutCommand, format: OutputFormat, client: ApiClient) -> Result<String> {
    match command {
        CheckoutCommand::Show { request_id } => {
            ViewRunner::new(CheckoutVerificationView::new(client, request_id), format)
                .run()
                .await
        }
        CheckoutCommand::Verify { request_id, items } => {
            let mut view = CheckoutVerificationView::new(client, request_id);
            let response = view.submit_check(items).await?;
            confirm(
                format,
                format!("Inventory verified for checkout request {}", request_id),
                &response,
            )
        }
    }
}
