//! Page command handlers: load a page model, then render it once.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use shopdash_core::api::{DateRange, Segment};
use shopdash_core::pages::{CustomersPage, DashboardPage, ProductsPage};
use shopdash_core::shell::Route;

use crate::context::AppContext;
use crate::render::Renderer;

/// Builds the orders window. A missing end means today; a missing start
/// means the default window length before the end.
pub fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<DateRange> {
    let default = DateRange::default_window();
    let range = match (start, end) {
        (None, None) => default,
        (None, Some(end)) => DateRange::last_days(DateRange::DEFAULT_DAYS, end),
        (Some(start), end) => DateRange {
            start,
            end: end.unwrap_or(default.end),
        },
    };
    if range.start > range.end {
        anyhow::bail!("--start {} is after --end {}", range.start, range.end);
    }
    Ok(range)
}

fn print_dashboard(ctx: &AppContext, page: &DashboardPage) -> Result<()> {
    if let Some(err) = page.status().error() {
        anyhow::bail!("Failed to load dashboard: {err}");
    }
    if let Some(data) = page.data() {
        print!(
            "{}",
            Renderer::new(ctx.config.theme).dashboard(data, page.range())
        );
    }
    Ok(())
}

pub async fn dashboard(ctx: &mut AppContext, range: DateRange) -> Result<()> {
    ctx.open(Route::Dashboard)?;

    let mut page = DashboardPage::new(ctx.gateway(), ctx.config.top_customers_limit);
    page.set_range(range);
    page.load().await;

    ctx.check_session()?;
    print_dashboard(ctx, &page)
}

pub async fn sync(ctx: &mut AppContext) -> Result<()> {
    ctx.open(Route::Dashboard)?;

    let mut page = DashboardPage::new(ctx.gateway(), ctx.config.top_customers_limit);
    let result = page.sync().await;

    ctx.check_session()?;
    result.context("Sync failed")?;
    println!("Sync started.");
    print_dashboard(ctx, &page)
}

pub async fn customers(
    ctx: &mut AppContext,
    segment: Segment,
    search: Option<String>,
    page_index: u32,
) -> Result<()> {
    ctx.open(Route::Customers)?;

    let mut page = CustomersPage::new(ctx.gateway());
    page.set_segment(segment);
    page.set_search(search.unwrap_or_default());
    page.set_page(page_index);
    page.load().await;

    ctx.check_session()?;
    if let Some(err) = page.status().error() {
        anyhow::bail!("Failed to load customers: {err}");
    }
    if page.segments().is_none() {
        eprintln!("Warning: segment stats unavailable");
    }
    print!(
        "{}",
        Renderer::new(ctx.config.theme).customers(page.query(), page.segments(), page.list())
    );
    Ok(())
}

pub async fn products(ctx: &mut AppContext) -> Result<()> {
    ctx.open(Route::Products)?;

    let mut page = ProductsPage::new(ctx.gateway(), ctx.config.top_products_limit);
    page.load().await;

    ctx.check_session()?;
    if let Some(err) = page.status().error() {
        anyhow::bail!("Failed to load products: {err}");
    }
    if let Some(data) = page.data() {
        print!("{}", Renderer::new(ctx.config.theme).products(data));
    }
    Ok(())
}
