//! Page view-models.
//!
//! A page owns its filters and the last data it loaded, nothing more. Loads
//! are split into `begin_load` (stamp a generation, snapshot filters),
//! `fetch` (network, no page borrow) and `apply` (drop the result if a newer
//! load has started since).

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod products;

pub use auth::{LoginForm, SignupForm};
pub use customers::CustomersPage;
pub use dashboard::DashboardPage;
pub use products::ProductsPage;

/// Identifies one load of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

/// Per-page generation counter. Starting a load supersedes every earlier one.
#[derive(Debug, Default)]
pub struct Generations {
    current: u64,
}

impl Generations {
    pub fn advance(&mut self) -> Generation {
        self.current += 1;
        Generation(self.current)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.current
    }
}

/// A completed fetch, tagged with the load it belongs to.
#[derive(Debug)]
pub struct Fetched<T> {
    pub generation: Generation,
    pub result: T,
}

/// Load status of a page. Data from the last successful load is kept
/// separately, so a failure does not blank the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}
