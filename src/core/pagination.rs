use crate::api::Query;

/// `skip`/`limit` paging for "load more" lists.
///
/// A page shorter than `limit` means the server has nothing further, so the
/// paginator stops handing out queries until it is reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    skip: usize,
    limit: usize,
    has_more: bool,
}

impl Paginator {
    pub fn new(limit: usize) -> Self {
        Self {
            skip: 0,
            limit: limit.max(1),
            has_more: true,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn query(&self) -> Query {
        vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
        ]
    }

    pub fn record_page(&mut self, rows: usize) {
        self.skip += rows;
        self.has_more = rows >= self.limit;
    }

    /// No further pages after a failed load; the list keeps what it has.
    pub fn stop(&mut self) {
        self.has_more = false;
    }

    pub fn reset(&mut self) {
        self.skip = 0;
        self.has_more = true;
    }
}
