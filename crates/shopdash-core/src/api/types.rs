//! Response shapes of the analytics API.
//!
//! Every struct keeps unknown fields in `extra` so nothing the server adds
//! is lost, and numeric fields tolerate being sent as strings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Accepts a number, a numeric string, or null (as 0).
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("number out of range: {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("not a number: {s:?}"))),
        Value::Null => Ok(0.0),
        other => Err(D::Error::custom(format!("expected a number, got {other}"))),
    }
}

/// Dashboard headline counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_customers: u64,
    pub total_orders: u64,
    pub total_products: u64,
    #[serde(deserialize_with = "lenient_f64")]
    pub total_revenue: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub revenue_today: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A customer row, used by both the top-customers list and the customer table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Customer {
    pub id: Value,
    pub name: Option<String>,
    pub email: Option<String>,
    pub orders_count: u64,
    #[serde(deserialize_with = "lenient_f64")]
    pub total_spent: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One point of the orders-by-date series. The series fields besides
/// `date` vary by backend version and are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyOrders {
    pub date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of the customer table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerPage {
    pub customers: Vec<Customer>,
    pub total_pages: u32,
    pub total_items: u64,
}

/// Customer counts per spend segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmentStats {
    pub high_value: u64,
    pub medium_value: u64,
    pub low_value: u64,
    pub total: u64,
}

/// Product headline counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductStats {
    pub total_products: u64,
    pub active_products: u64,
    pub low_stock_items: u64,
    #[serde(deserialize_with = "lenient_f64")]
    pub total_inventory_value: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A best-selling product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopProduct {
    pub id: Value,
    pub title: String,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: f64,
    pub inventory_quantity: Option<i64>,
    pub order_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Product counts per stock level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryBreakdown {
    pub in_stock: u64,
    pub low_stock: u64,
    pub out_of_stock: u64,
    pub total: u64,
}

/// Display tier of a customer by lifetime spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendTier {
    HighValue,
    MediumValue,
    Growing,
}

impl SpendTier {
    pub const HIGH_VALUE_MIN: f64 = 5000.0;
    pub const MEDIUM_VALUE_MIN: f64 = 1000.0;

    pub fn for_total(total_spent: f64) -> Self {
        if total_spent >= Self::HIGH_VALUE_MIN {
            SpendTier::HighValue
        } else if total_spent >= Self::MEDIUM_VALUE_MIN {
            SpendTier::MediumValue
        } else {
            SpendTier::Growing
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpendTier::HighValue => "High Value",
            SpendTier::MediumValue => "Medium Value",
            SpendTier::Growing => "Growing",
        }
    }
}

impl Customer {
    pub fn tier(&self) -> SpendTier {
        SpendTier::for_total(self.total_spent)
    }
}

/// Display level of a product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    Unknown,
    OutOfStock,
    Low,
    InStock,
}

impl StockLevel {
    pub const LOW_STOCK_BELOW: i64 = 10;

    pub fn for_quantity(quantity: Option<i64>) -> Self {
        match quantity {
            None => StockLevel::Unknown,
            Some(q) if q <= 0 => StockLevel::OutOfStock,
            Some(q) if q < Self::LOW_STOCK_BELOW => StockLevel::Low,
            Some(_) => StockLevel::InStock,
        }
    }
}

impl TopProduct {
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::for_quantity(self.inventory_quantity)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_stats_accepts_string_value() {
        let stats: ProductStats = serde_json::from_value(json!({
            "totalProducts": 12,
            "activeProducts": 10,
            "lowStockItems": 2,
            "totalInventoryValue": "15420.50"
        }))
        .unwrap();

        assert_eq!(stats.total_products, 12);
        assert!((stats.total_inventory_value - 15420.5).abs() < f64::EPSILON);
        assert!(stats.extra.is_empty());
    }

    #[test]
    fn test_dashboard_stats_defaults_and_extra() {
        let stats: DashboardStats = serde_json::from_value(json!({
            "totalOrders": 7,
            "totalRevenue": null,
            "averageOrderValue": 31.5
        }))
        .unwrap();

        assert_eq!(stats.total_orders, 7);
        assert_eq!(stats.total_customers, 0);
        assert!(stats.total_revenue.abs() < f64::EPSILON);
        assert_eq!(stats.extra.get("averageOrderValue"), Some(&json!(31.5)));
    }

    #[test]
    fn test_lenient_number_rejects_garbage() {
        let result: Result<TopProduct, _> =
            serde_json::from_value(json!({"title": "Mug", "price": "abc"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_customer_page_shape() {
        let page: CustomerPage = serde_json::from_value(json!({
            "customers": [
                {"id": 1, "name": "Ada", "email": "ada@x.test", "ordersCount": 4, "totalSpent": 5200.0},
                {"id": 2, "name": null, "totalSpent": 12}
            ],
            "totalPages": 3,
            "totalItems": 41
        }))
        .unwrap();

        assert_eq!(page.total_pages, 3);
        assert_eq!(page.customers[0].tier(), SpendTier::HighValue);
        assert_eq!(page.customers[1].name, None);
        assert_eq!(page.customers[1].tier(), SpendTier::Growing);
    }

    #[test]
    fn test_spend_tier_boundaries() {
        assert_eq!(SpendTier::for_total(5000.0), SpendTier::HighValue);
        assert_eq!(SpendTier::for_total(4999.99), SpendTier::MediumValue);
        assert_eq!(SpendTier::for_total(1000.0), SpendTier::MediumValue);
        assert_eq!(SpendTier::for_total(999.0), SpendTier::Growing);
    }

    #[test]
    fn test_stock_level() {
        assert_eq!(StockLevel::for_quantity(None), StockLevel::Unknown);
        assert_eq!(StockLevel::for_quantity(Some(0)), StockLevel::OutOfStock);
        assert_eq!(StockLevel::for_quantity(Some(9)), StockLevel::Low);
        assert_eq!(StockLevel::for_quantity(Some(10)), StockLevel::InStock);
    }
}
