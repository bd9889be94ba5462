//! Command-line interface for stockwatch.
//!
//! One-shot commands query the inventory service directly; `watch` runs
//! the live dashboard against stdin. Configuration comes from the
//! `STOCKWATCH_*` environment variables.

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use stockwatch::alert::{
    Identity, InventoryEvent, PollingOrchestrator, SessionAlertStore, now_millis,
};
use stockwatch::api_client::{self, InventoryService};
use stockwatch::config::{Config, MAX_PAGE_LIMIT};
use stockwatch::dashboard::{Dashboard, DashboardCommand, DashboardHandle, ViewModel};
use stockwatch::query::{Filters, OverviewParams, Paging, ProductSearchParams, SortBy, SortDir};

#[tokio::main]
async fn main() -> Result<()> {
    stockwatch::tracing::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        usage();
        std::process::exit(1);
    }

    let config = Config::from_env()?;
    let command = &args[1];
    let argument = args[2..].join(" ");

    match command.as_str() {
        "overview" => cmd_overview(&config, &argument).await?,
        "products" => cmd_products(&config, &argument).await?,
        "alert" => cmd_alert(&config).await?,
        "dismiss" => cmd_dismiss(&config).await?,
        "watch" => cmd_watch(&config).await?,
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("Run without arguments to see usage.");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn usage() {
    eprintln!("Usage: stockwatch-cli <command> [search]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  overview [search]   Show stock balances");
    eprintln!("  products [search]   Search the product catalog");
    eprintln!("  alert               Run one low-stock alert cycle");
    eprintln!("  dismiss             Acknowledge the low-stock alert");
    eprintln!("  watch               Live dashboard driven from stdin");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STOCKWATCH_API_URL        Service base URL (default: http://localhost:8000)");
    eprintln!("  STOCKWATCH_ACCESS_TOKEN   Sent as the access_token cookie");
    eprintln!("  STOCKWATCH_IDENTITY       User id alert memory is scoped to (default: guest)");
    eprintln!("  STOCKWATCH_SESSION_FILE   Keep alert memory between invocations");
    eprintln!("  STOCKWATCH_DEBOUNCE_MS    Search quiet period (default: 350)");
    eprintln!("  STOCKWATCH_PAGE_LIMIT     Overview page size (default: 50)");
    eprintln!("  STOCKWATCH_TIMEOUT_SECS   Request timeout (default: 30)");
}

fn make_service(config: &Config) -> Result<Arc<dyn InventoryService>> {
    let client = api_client::Client::from_config(config)?;
    Ok(Arc::new(client))
}

fn open_store(config: &Config) -> Result<SessionAlertStore> {
    match &config.session_file {
        Some(path) => SessionAlertStore::open(path)
            .with_context(|| format!("opening session file {}", path.display())),
        None => Ok(SessionAlertStore::in_memory()),
    }
}

/// Print one page of the stock overview.
async fn cmd_overview(config: &Config, search: &str) -> Result<()> {
    let service = make_service(config)?;
    let filters = Filters {
        pin_low_stock_first: true,
        ..Filters::default()
    };
    let params = OverviewParams::new(search, filters, Paging::new(0, config.page_limit));
    let page = service.stock_overview(&params).await?;

    println!("{:<6} {:<30} {:>10} {:>10}", "ID", "NAME", "BALANCE", "MIN");
    for item in &page.items {
        let flag = if item.low_stock { "  LOW" } else { "" };
        println!(
            "{:<6} {:<30} {:>10} {:>10}{}",
            item.id,
            format!("{} ({})", item.name, item.unit),
            item.balance,
            item.min_stock,
            flag
        );
    }
    println!("{} of {} products", page.items.len(), page.total);
    Ok(())
}

async fn cmd_products(config: &Config, search: &str) -> Result<()> {
    let service = make_service(config)?;
    let params = ProductSearchParams::new(search, Paging::new(0, MAX_PAGE_LIMIT));
    let page = service.search_products(&params).await?;

    for product in &page.items {
        let state = if product.is_active { "" } else { " (inactive)" };
        let id = product.id;
        println!("{id:<6} {} [{}]{state}", product.name, product.unit);
    }
    println!("{} of {} products", page.items.len(), page.total);
    Ok(())
}

/// Build an orchestrator for the configured identity and run one cycle.
async fn alert_cycle(config: &Config) -> Result<PollingOrchestrator<SessionAlertStore>> {
    let service = make_service(config)?;
    let store = Arc::new(Mutex::new(open_store(config)?));
    let identity = Identity::from_user(config.identity.as_deref());
    // Cycles run inline, nothing is ever sent on this channel.
    let (completion_tx, _) = mpsc::channel(1);
    let mut orchestrator = PollingOrchestrator::new(service, store, identity, completion_tx);

    orchestrator
        .refresh(InventoryEvent::ManualRefresh, now_millis())
        .await;
    if let Some(error) = &orchestrator.view().error {
        bail!("alert refresh failed: {error}");
    }
    Ok(orchestrator)
}

/// Run a single alert cycle and report the verdict.
async fn cmd_alert(config: &Config) -> Result<()> {
    let orchestrator = alert_cycle(config).await?;

    let view = orchestrator.view();
    if let Some(count) = view.low_stock_count {
        println!("Low-stock products: {count}");
    }
    if view.popup_visible {
        println!("ALERT: products are at or below their minimum stock");
        println!("Run `stockwatch-cli dismiss` to acknowledge.");
    }
    Ok(())
}

/// Acknowledge the alert, if the current inputs would raise it.
async fn cmd_dismiss(config: &Config) -> Result<()> {
    if config.session_file.is_none() {
        bail!("set STOCKWATCH_SESSION_FILE to remember a dismissal");
    }
    let mut orchestrator = alert_cycle(config).await?;
    let identity = orchestrator.identity().key().to_string();

    if orchestrator.dismiss(now_millis()) {
        println!("Alert acknowledged for {identity}");
    } else {
        println!("No low-stock alert to dismiss for {identity}");
    }
    Ok(())
}

/// Live dashboard. Plain lines are search input; `:`-prefixed lines are
/// commands (`:help` lists them).
async fn cmd_watch(config: &Config) -> Result<()> {
    let service = make_service(config)?;
    let store = Arc::new(Mutex::new(open_store(config)?));
    let (dashboard, handle) = Dashboard::new(config, service, store);

    let cancellation = CancellationToken::new();
    let dashboard = tokio::spawn(dashboard.run(cancellation.clone()));
    let printer = tokio::spawn(print_views(handle.clone(), cancellation.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_line(&line, &handle.view()) {
                    Ok(Some(command)) => handle.send(command).await?,
                    Ok(None) => break,
                    Err(e) => eprintln!("{e}"),
                }
            }
        }
    }

    cancellation.cancel();
    dashboard.await?;
    printer.await?;
    Ok(())
}

/// Translate one stdin line. `Ok(None)` means quit.
fn parse_line(line: &str, view: &ViewModel) -> Result<Option<DashboardCommand>> {
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Some(DashboardCommand::SetSearch(line.to_string())));
    };
    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    let rest = rest.trim();
    let filters = view.query.filters;

    let command = match name {
        "q" | "quit" => return Ok(None),
        "products" => DashboardCommand::SetProductSearch(rest.to_string()),
        "low" => DashboardCommand::SetFilters(Filters {
            low_stock_only: !filters.low_stock_only,
            ..filters
        }),
        "sort" => DashboardCommand::SetFilters(Filters {
            sort_by: SortBy::from_str(rest).context("sort by `name` or `balance`")?,
            ..filters
        }),
        "dir" => DashboardCommand::SetFilters(Filters {
            sort_dir: SortDir::from_str(rest).context("direction is `asc` or `desc`")?,
            ..filters
        }),
        "page" => {
            let page: u32 = rest.parse().context("page number expected")?;
            let limit = view.paging.limit();
            DashboardCommand::SetPage {
                skip: page.saturating_sub(1).saturating_mul(limit),
            }
        }
        "refresh" => DashboardCommand::Refresh,
        "dismiss" => DashboardCommand::DismissAlert,
        "user" => DashboardCommand::SetIdentity(Some(rest.to_string())),
        "guest" => DashboardCommand::SetIdentity(None),
        event => match InventoryEvent::from_str(event) {
            Ok(event) => DashboardCommand::Inventory(event),
            Err(_) => bail!(
                "commands: :products <search>, :low, :sort <name|balance>, :dir <asc|desc>, \
                 :page <n>, :refresh, :movement-recorded, :product-changed, :dismiss, \
                 :user <id>, :guest, :quit"
            ),
        },
    };
    Ok(Some(command))
}

async fn print_views(handle: DashboardHandle, cancellation: CancellationToken) {
    let mut views = handle.subscribe();
    loop {
        tokio::select! {
            _ = cancellation.cancelled() => break,
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                print_view(&view);
            }
        }
    }
}

fn print_view(view: &ViewModel) {
    let overview = &view.overview;
    let status = match (&overview.error, overview.loading) {
        (Some(error), _) => format!("error: {error}"),
        (None, true) => "loading".to_string(),
        (None, false) => format!("{} of {}", overview.items.len(), overview.total),
    };
    println!("search {:?}: {status}", view.query.committed_value());
    for item in &overview.items {
        let flag = if item.low_stock { " LOW" } else { "" };
        println!("  {:<30} {:>8}{flag}", item.name, item.balance);
    }
    if !view.products.items.is_empty() {
        println!("products: {}", view.products.items.len());
    }
    if view.alert.popup_visible {
        let count = view.alert.low_stock_count.unwrap_or_default();
        println!("ALERT: {count} products low on stock (:dismiss)");
    }
    if let Some(error) = &view.alert.error {
        println!("alert refresh failed: {error}");
    }
}
