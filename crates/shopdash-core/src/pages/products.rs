//! Product analytics: headline stats, best sellers and stock levels.

use std::sync::Arc;

use super::{Fetched, Generation, Generations, LoadStatus};
use crate::api::{InventoryBreakdown, ProductStats, TopProduct};
use crate::gateway::{ApiResult, GatewayClient};

#[derive(Debug, Clone, PartialEq)]
pub struct ProductsData {
    pub stats: ProductStats,
    pub top: Vec<TopProduct>,
    pub inventory: InventoryBreakdown,
}

#[derive(Debug, Clone)]
pub struct ProductsRequest {
    generation: Generation,
    top_limit: u32,
}

impl ProductsRequest {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub async fn fetch(self, gateway: &GatewayClient) -> Fetched<ApiResult<ProductsData>> {
        let api = gateway.products();
        let result = tokio::try_join!(api.stats(), api.top(self.top_limit), api.inventory())
            .map(|(stats, top, inventory)| ProductsData {
                stats,
                top,
                inventory,
            });
        Fetched {
            generation: self.generation,
            result,
        }
    }
}

pub struct ProductsPage {
    gateway: Arc<GatewayClient>,
    top_limit: u32,
    generations: Generations,
    status: LoadStatus,
    data: Option<ProductsData>,
}

impl ProductsPage {
    pub fn new(gateway: Arc<GatewayClient>, top_limit: u32) -> Self {
        Self {
            gateway,
            top_limit,
            generations: Generations::default(),
            status: LoadStatus::Idle,
            data: None,
        }
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn data(&self) -> Option<&ProductsData> {
        self.data.as_ref()
    }

    pub fn begin_load(&mut self) -> ProductsRequest {
        self.status = LoadStatus::Loading;
        ProductsRequest {
            generation: self.generations.advance(),
            top_limit: self.top_limit,
        }
    }

    pub fn apply(&mut self, fetched: Fetched<ApiResult<ProductsData>>) -> bool {
        if !self.generations.is_current(fetched.generation) {
            tracing::debug!("discarding stale products response");
            return false;
        }

        match fetched.result {
            Ok(data) => {
                self.data = Some(data);
                self.status = LoadStatus::Ready;
            }
            Err(err) => {
                tracing::warn!("error fetching product data: {err}");
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
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::StockLevel;
    use crate::pages::testing::signed_in_gateway;

    async fn mount_products(server: &MockServer, inventory_status: u16) {
        Mock::given(method("GET"))
            .and(path("/api/products/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalProducts": 12,
                "activeProducts": 11,
                "lowStockItems": 2,
                "totalInventoryValue": "15420.50"
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/products/top"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "title": "Mug", "vendor": "Acme", "productType": "Kitchen",
                 "price": 12.5, "inventoryQuantity": 0, "orderCount": 40}
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/products/inventory"))
            .respond_with(ResponseTemplate::new(inventory_status).set_body_json(json!({
                "inStock": 9, "lowStock": 2, "outOfStock": 1, "total": 12
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_load_applies_group() {
        let server = MockServer::start().await;
        mount_products(&server, 200).await;
        let (_, gateway) = signed_in_gateway(&server);
        let mut page = ProductsPage::new(gateway, 10);

        page.load().await;

        let data = page.data().unwrap();
        assert_eq!(data.stats.active_products, 11);
        assert_eq!(data.top[0].stock_level(), StockLevel::OutOfStock);
        assert_eq!(data.inventory.total, 12);
        assert_eq!(page.status(), &LoadStatus::Ready);
    }

    #[tokio::test]
    async fn test_partial_failure_applies_nothing() {
        let server = MockServer::start().await;
        mount_products(&server, 500).await;
        let (_, gateway) = signed_in_gateway(&server);
        let mut page = ProductsPage::new(gateway, 10);

        page.load().await;

        assert!(page.data().is_none());
        assert!(page.status().error().is_some());
    }

    #[tokio::test]
    async fn test_superseded_load_is_ignored() {
        let server = MockServer::start().await;
        mount_products(&server, 200).await;
        let (_, gateway) = signed_in_gateway(&server);
        let mut page = ProductsPage::new(Arc::clone(&gateway), 10);

        let first = page.begin_load();
        let second = page.begin_load();
        assert!(second.generation() > first.generation());

        assert!(!page.apply(first.fetch(&gateway).await));
        assert!(page.data().is_none());
        assert!(page.apply(second.fetch(&gateway).await));
        assert!(page.data().is_some());
    }
}
