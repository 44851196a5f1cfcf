//! Dashboard: headline stats, top customers and the orders series.

use std::sync::Arc;

use super::{Fetched, Generation, Generations, LoadStatus};
use crate::api::{Customer, DailyOrders, DashboardStats, DateRange};
use crate::gateway::{ApiResult, GatewayClient};

/// Everything the dashboard shows, applied as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub top_customers: Vec<Customer>,
    pub orders: Vec<DailyOrders>,
}

/// Filters captured when a dashboard load starts.
#[derive(Debug, Clone)]
pub struct DashboardRequest {
    generation: Generation,
    range: DateRange,
    top_customers_limit: u32,
}

impl DashboardRequest {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Issues the three requests together; any failure fails the group.
    pub async fn fetch(self, gateway: &GatewayClient) -> Fetched<ApiResult<DashboardData>> {
        let api = gateway.dashboard();
        let result = tokio::try_join!(
            api.stats(),
            api.top_customers(self.top_customers_limit),
            api.orders_by_date(&self.range),
        )
        .map(|(stats, top_customers, orders)| DashboardData {
            stats,
            top_customers,
            orders,
        });

        Fetched {
            generation: self.generation,
            result,
        }
    }
}

pub struct DashboardPage {
    gateway: Arc<GatewayClient>,
    range: DateRange,
    top_customers_limit: u32,
    generations: Generations,
    status: LoadStatus,
    data: Option<DashboardData>,
    syncing: bool,
}

impl DashboardPage {
    pub fn new(gateway: Arc<GatewayClient>, top_customers_limit: u32) -> Self {
        Self {
            gateway,
            range: DateRange::default_window(),
            top_customers_limit,
            generations: Generations::default(),
            status: LoadStatus::Idle,
            data: None,
            syncing: false,
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Updates the date window. Returns true when it changed and the page
    /// needs a reload.
    pub fn set_range(&mut self, range: DateRange) -> bool {
        let changed = self.range != range;
        self.range = range;
        changed
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn data(&self) -> Option<&DashboardData> {
        self.data.as_ref()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing
    }

    pub fn begin_load(&mut self) -> DashboardRequest {
        self.status = LoadStatus::Loading;
        DashboardRequest {
            generation: self.generations.advance(),
            range: self.range,
            top_customers_limit: self.top_customers_limit,
        }
    }

    /// Applies a completed fetch. Returns false if it was superseded.
    pub fn apply(&mut self, fetched: Fetched<ApiResult<DashboardData>>) -> bool {
        if !self.generations.is_current(fetched.generation) {
            tracing::debug!("discarding stale dashboard response");
            return false;
        }

        match fetched.result {
            Ok(data) => {
                self.data = Some(data);
                self.status = LoadStatus::Ready;
            }
            Err(err) => {
                tracing::warn!("error fetching dashboard data: {err}");
                self.status = LoadStatus::Failed(err.message);
            }
        }
        true
    }

    pub async fn load(&mut self) {
        let request = self.begin_load();
        let fetched = request.fetch(&self.gateway).await;
        self.apply(fetched);
    }

    /// Triggers a Shopify sync and reloads on success.
    pub async fn sync(&mut self) -> ApiResult<()> {
        self.syncing = true;
        let result = self.gateway.shopify().sync().await;
        self.syncing = false;

        match result {
            Ok(()) => {
                tracing::info!("shopify sync requested");
                self.load().await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("failed to sync data: {err}");
                Err(err)
            }
        }
    }
}
