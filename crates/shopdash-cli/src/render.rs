//! Terminal rendering of the page models.
//!
//! One renderer for every page; the theme only picks the border preset.

use std::collections::BTreeSet;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{ASCII_FULL, UTF8_FULL};
use comfy_table::{CellAlignment, ContentArrangement, Table};
use serde_json::Value;
use shopdash_core::api::{
    CustomerPage, CustomerQuery, DateRange, SegmentStats, StockLevel, TopProduct,
};
use shopdash_core::config::Theme;
use shopdash_core::pages::dashboard::DashboardData;
use shopdash_core::pages::products::ProductsData;

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// `1234.5` -> `$1,234.50`
pub fn money(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{sign}${}.{:02}",
        group_digits(&(cents / 100).to_string()),
        cents % 100
    )
}

pub fn count(value: u64) -> String {
    group_digits(&value.to_string())
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn stock_label(product: &TopProduct) -> String {
    match (product.stock_level(), product.inventory_quantity) {
        (StockLevel::OutOfStock, _) => "Out of stock".to_string(),
        (StockLevel::Low, Some(q)) => format!("Low ({q})"),
        (_, Some(q)) => q.to_string(),
        (_, None) => "-".to_string(),
    }
}

pub struct Renderer {
    theme: Theme,
}

impl Renderer {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        match self.theme {
            Theme::Plain => {
                table.load_preset(ASCII_FULL);
            }
            Theme::Dark => {
                table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
            }
        }
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table
    }

    fn right_align(table: &mut Table, columns: &[usize]) {
        for &index in columns {
            if let Some(column) = table.column_mut(index) {
                column.set_cell_alignment(CellAlignment::Right);
            }
        }
    }

    fn key_values(&self, rows: &[(&str, String)]) -> Table {
        let mut table = self.table();
        table.set_header(vec!["Metric", "Value"]);
        for (label, value) in rows {
            table.add_row(vec![(*label).to_string(), value.clone()]);
        }
        Self::right_align(&mut table, &[1]);
        table
    }

    pub fn dashboard(&self, data: &DashboardData, range: DateRange) -> String {
        let stats = &data.stats;
        let mut out = String::new();

        out.push_str("Overview\n");
        let overview = self.key_values(&[
            ("Total revenue", money(stats.total_revenue)),
            ("Revenue today", money(stats.revenue_today)),
            ("Orders", count(stats.total_orders)),
            ("Customers", count(stats.total_customers)),
            ("Products", count(stats.total_products)),
        ]);
        out.push_str(&format!("{overview}\n\n"));

        out.push_str("Top customers\n");
        if data.top_customers.is_empty() {
            out.push_str("No customers yet.\n\n");
        } else {
            let mut table = self.table();
            table.set_header(vec!["#", "Name", "Email", "Orders", "Spent", "Tier"]);
            for (rank, customer) in data.top_customers.iter().enumerate() {
                table.add_row(vec![
                    (rank + 1).to_string(),
                    customer.name.clone().unwrap_or_else(|| "-".to_string()),
                    customer.email.clone().unwrap_or_else(|| "-".to_string()),
                    count(customer.orders_count),
                    money(customer.total_spent),
                    customer.tier().label().to_string(),
                ]);
            }
            Self::right_align(&mut table, &[0, 3, 4]);
            out.push_str(&format!("{table}\n\n"));
        }

        out.push_str(&format!("Orders by date ({} to {})\n", range.start, range.end));
        if data.orders.is_empty() {
            out.push_str("No orders in this period.\n");
        } else {
            let columns: BTreeSet<&str> = data
                .orders
                .iter()
                .flat_map(|day| day.extra.keys().map(String::as_str))
                .collect();
            let mut table = self.table();
            let mut header = vec!["Date"];
            header.extend(columns.iter().copied());
            table.set_header(header);
            for day in &data.orders {
                let mut row = vec![day.date.clone()];
                row.extend(
                    columns
                        .iter()
                        .map(|key| day.extra.get(*key).map_or_else(|| "-".to_string(), plain_value)),
                );
                table.add_row(row);
            }
            out.push_str(&format!("{table}\n"));
        }
        out
    }

    pub fn customers(
        &self,
        query: &CustomerQuery,
        segments: Option<&SegmentStats>,
        list: Option<&CustomerPage>,
    ) -> String {
        let mut out = String::new();

        if let Some(segments) = segments {
            out.push_str("Segments\n");
            let mut table = self.table();
            table.set_header(vec!["High value", "Medium value", "Low value", "Total"]);
            table.add_row(vec![
                count(segments.high_value),
                count(segments.medium_value),
                count(segments.low_value),
                count(segments.total),
            ]);
            out.push_str(&format!("{table}\n\n"));
        }

        let Some(list) = list else {
            return out;
        };
        if list.customers.is_empty() {
            out.push_str("No customers found.\n");
            return out;
        }

        let mut table = self.table();
        table.set_header(vec!["Name", "Email", "Orders", "Total spent", "Tier"]);
        for customer in &list.customers {
            table.add_row(vec![
                customer.name.clone().unwrap_or_else(|| "-".to_string()),
                customer.email.clone().unwrap_or_else(|| "-".to_string()),
                count(customer.orders_count),
                money(customer.total_spent),
                customer.tier().label().to_string(),
            ]);
        }
        Self::right_align(&mut table, &[2, 3]);
        out.push_str(&format!("{table}\n"));
        out.push_str(&format!(
            "Page {} of {} ({} customers, segment: {})\n",
            query.page + 1,
            list.total_pages.max(1),
            count(list.total_items),
            query.segment
        ));
        out
    }

    pub fn products(&self, data: &ProductsData) -> String {
        let stats = &data.stats;
        let inventory = &data.inventory;
        let mut out = String::new();

        out.push_str("Overview\n");
        let overview = self.key_values(&[
            ("Products", count(stats.total_products)),
            ("Active", count(stats.active_products)),
            ("Low stock items", count(stats.low_stock_items)),
            ("Inventory value", money(stats.total_inventory_value)),
        ]);
        out.push_str(&format!("{overview}\n\n"));

        out.push_str("Inventory\n");
        let mut table = self.table();
        table.set_header(vec!["In stock", "Low stock", "Out of stock", "Total"]);
        table.add_row(vec![
            count(inventory.in_stock),
            count(inventory.low_stock),
            count(inventory.out_of_stock),
            count(inventory.total),
        ]);
        out.push_str(&format!("{table}\n\n"));

        out.push_str("Top products\n");
        if data.top.is_empty() {
            out.push_str("No products yet.\n");
            return out;
        }
        let mut table = self.table();
        table.set_header(vec!["#", "Product", "Vendor", "Type", "Price", "Stock", "Orders"]);
        for (rank, product) in data.top.iter().enumerate() {
            table.add_row(vec![
                (rank + 1).to_string(),
                product.title.clone(),
                product.vendor.clone().unwrap_or_else(|| "-".to_string()),
                product.product_type.clone().unwrap_or_else(|| "-".to_string()),
                money(product.price),
                stock_label(product),
                count(product.order_count),
            ]);
        }
        Self::right_align(&mut table, &[0, 4, 5, 6]);
        out.push_str(&format!("{table}\n"));
        out
    }
}
