//! Typed wrappers over the analytics endpoints.
//!
//! The services are thin borrowed views of a [`GatewayClient`]; all
//! filtering, pagination and bucketing happens server-side.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};

use crate::gateway::{ApiResult, GatewayClient};

mod types;

pub use types::{
    Customer, CustomerPage, DailyOrders, DashboardStats, InventoryBreakdown, ProductStats,
    SegmentStats, SpendTier, StockLevel, TopProduct,
};

/// Date format expected by the orders-by-date endpoint.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date window for the orders-by-date series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Default dashboard window length in days.
    pub const DEFAULT_DAYS: u64 = 30;

    /// The `days` days ending at `end`.
    pub fn last_days(days: u64, end: NaiveDate) -> Self {
        let start = end.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// The default window ending today (local time).
    pub fn default_window() -> Self {
        Self::last_days(Self::DEFAULT_DAYS, chrono::Local::now().date_naive())
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("startDate", self.start.format(DATE_FORMAT).to_string()),
            ("endDate", self.end.format(DATE_FORMAT).to_string()),
        ]
    }
}

/// Customer segment filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Segment {
    #[default]
    All,
    High,
    Medium,
    Low,
}

impl Segment {
    /// Query value, or None for "all" (parameter omitted).
    pub fn as_query(self) -> Option<&'static str> {
        match self {
            Segment::All => None,
            Segment::High => Some("high"),
            Segment::Medium => Some("medium"),
            Segment::Low => Some("low"),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query().unwrap_or("all"))
    }
}

impl FromStr for Segment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Segment::All),
            "high" => Ok(Segment::High),
            "medium" => Ok(Segment::Medium),
            "low" => Ok(Segment::Low),
            other => Err(format!(
                "Unknown segment: {other} (expected all, high, medium or low)"
            )),
        }
    }
}

/// Filters for one customer-table request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerQuery {
    /// Zero-based page index
    pub page: u32,
    pub segment: Segment,
    pub search: String,
}

impl CustomerQuery {
    pub const PAGE_SIZE: u32 = 20;
    pub const SORT_BY: &'static str = "totalSpent";
    pub const SORT_DIR: &'static str = "desc";

    /// Query parameters in request order. `segment` is omitted for "all"
    /// and `search` when it is blank after trimming.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("size", Self::PAGE_SIZE.to_string()),
            ("sortBy", Self::SORT_BY.to_string()),
            ("sortDir", Self::SORT_DIR.to_string()),
        ];
        if let Some(segment) = self.segment.as_query() {
            params.push(("segment", segment.to_string()));
        }
        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search", search.to_string()));
        }
        params
    }
}

/// `/dashboard/*` endpoints.
pub struct DashboardApi<'a> {
    gateway: &'a GatewayClient,
}

impl DashboardApi<'_> {
    pub async fn stats(&self) -> ApiResult<DashboardStats> {
        self.gateway.get_json("/dashboard/stats", &[]).await
    }

    pub async fn top_customers(&self, limit: u32) -> ApiResult<Vec<Customer>> {
        self.gateway
            .get_json("/dashboard/top-customers", &[("limit", limit.to_string())])
            .await
    }

    pub async fn orders_by_date(&self, range: &DateRange) -> ApiResult<Vec<DailyOrders>> {
        self.gateway
            .get_json("/dashboard/orders-by-date", &range.query())
            .await
    }
}

/// `/shopify/*` endpoints.
pub struct ShopifyApi<'a> {
    gateway: &'a GatewayClient,
}

impl ShopifyApi<'_> {
    /// Asks the backend to pull fresh data from Shopify. Only the status
    /// is reported back.
    pub async fn sync(&self) -> ApiResult<()> {
        self.gateway.post_empty("/shopify/sync").await
    }
}

/// `/customers*` endpoints.
pub struct CustomersApi<'a> {
    gateway: &'a GatewayClient,
}

impl CustomersApi<'_> {
    pub async fn list(&self, query: &CustomerQuery) -> ApiResult<CustomerPage> {
        self.gateway.get_json("/customers", &query.to_query()).await
    }

    pub async fn segments(&self) -> ApiResult<SegmentStats> {
        self.gateway.get_json("/customers/segments", &[]).await
    }
}

/// `/products/*` endpoints.
pub struct ProductsApi<'a> {
    gateway: &'a GatewayClient,
}

impl ProductsApi<'_> {
    pub async fn stats(&self) -> ApiResult<ProductStats> {
        self.gateway.get_json("/products/stats", &[]).await
    }

    pub async fn top(&self, limit: u32) -> ApiResult<Vec<TopProduct>> {
        self.gateway
            .get_json("/products/top", &[("limit", limit.to_string())])
            .await
    }

    pub async fn inventory(&self) -> ApiResult<InventoryBreakdown> {
        self.gateway.get_json("/products/inventory", &[]).await
    }
}

impl GatewayClient {
    pub fn dashboard(&self) -> DashboardApi<'_> {
        DashboardApi { gateway: self }
    }

    pub fn shopify(&self) -> ShopifyApi<'_> {
        ShopifyApi { gateway: self }
    }

    pub fn customers(&self) -> CustomersApi<'_> {
        CustomersApi { gateway: self }
    }

    pub fn products(&self) -> ProductsApi<'_> {
        ProductsApi { gateway: self }
    }
}
