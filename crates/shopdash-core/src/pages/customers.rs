//! Customer segmentation table.

use std::sync::Arc;

use super::{Fetched, Generation, Generations, LoadStatus};
use crate::api::{CustomerPage, CustomerQuery, Segment, SegmentStats};
use crate::gateway::{ApiResult, GatewayClient};

/// Results of one customers load. The two halves fail independently.
#[derive(Debug)]
pub struct CustomersFetch {
    pub segments: ApiResult<SegmentStats>,
    pub list: ApiResult<CustomerPage>,
}

#[derive(Debug, Clone)]
pub struct CustomersRequest {
    generation: Generation,
    query: CustomerQuery,
}

impl CustomersRequest {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn query(&self) -> &CustomerQuery {
        &self.query
    }

    pub async fn fetch(self, gateway: &GatewayClient) -> Fetched<CustomersFetch> {
        let api = gateway.customers();
        let (segments, list) = tokio::join!(api.segments(), api.list(&self.query));
        Fetched {
            generation: self.generation,
            result: CustomersFetch { segments, list },
        }
    }
}

pub struct CustomersPage {
    gateway: Arc<GatewayClient>,
    query: CustomerQuery,
    generations: Generations,
    status: LoadStatus,
    segments: Option<SegmentStats>,
    list: Option<CustomerPage>,
}

impl CustomersPage {
    pub fn new(gateway: Arc<GatewayClient>) -> Self {
        Self {
            gateway,
            query: CustomerQuery::default(),
            generations: Generations::default(),
            status: LoadStatus::Idle,
            segments: None,
            list: None,
        }
    }

    pub fn query(&self) -> &CustomerQuery {
        &self.query
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn segments(&self) -> Option<&SegmentStats> {
        self.segments.as_ref()
    }

    pub fn list(&self) -> Option<&CustomerPage> {
        self.list.as_ref()
    }

    /// Changes the segment filter and goes back to the first page.
    pub fn set_segment(&mut self, segment: Segment) {
        if self.query.segment != segment {
            self.query.segment = segment;
            self.query.page = 0;
        }
    }

    /// Changes the search term and goes back to the first page.
    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if self.query.search != search {
            self.query.search = search;
            self.query.page = 0;
        }
    }

    pub fn set_page(&mut self, page: u32) {
        self.query.page = page;
    }

    /// Total pages from the last list, if one has loaded.
    pub fn total_pages(&self) -> Option<u32> {
        self.list.as_ref().map(|list| list.total_pages)
    }

    pub fn has_next(&self) -> bool {
        self.total_pages()
            .is_some_and(|total| self.query.page + 1 < total)
    }

    pub fn has_prev(&self) -> bool {
        self.query.page > 0
    }

    /// Moves to the next page. Returns false at the last page.
    pub fn next_page(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.query.page += 1;
        true
    }

    /// Moves to the previous page. Returns false at the first page.
    pub fn prev_page(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.query.page -= 1;
        true
    }

    pub fn begin_load(&mut self) -> CustomersRequest {
        self.status = LoadStatus::Loading;
        CustomersRequest {
            generation: self.generations.advance(),
            query: self.query.clone(),
        }
    }

    pub fn apply(&mut self, fetched: Fetched<CustomersFetch>) -> bool {
        if !self.generations.is_current(fetched.generation) {
            tracing::debug!("discarding stale customers response");
            return false;
        }

        let CustomersFetch { segments, list } = fetched.result;
        match segments {
            Ok(stats) => self.segments = Some(stats),
            Err(err) => tracing::warn!("error fetching segment stats: {err}"),
        }
        match list {
            Ok(page) => {
                self.list = Some(page);
                self.status = LoadStatus::Ready;
            }
            Err(err) => {
                tracing::warn!("error fetching customers: {err}");
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
