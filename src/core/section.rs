//! Per-section view state.
//!
//! Each block of a screen (a table, a KPI strip, a report) owns one
//! [`Section`]: the last data loaded, a `loading` flag that turns overlapping
//! loads into no-ops, and what to show instead of data when a load failed.

use crate::api::Query;
use crate::core::pagination::Paginator;
use crate::utils::error::{ConsoleError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// 401: already handled by the sign-in flow, nothing is shown.
    Suppressed,
    /// 404 on a section whose backing tables may not exist yet.
    NotProvisioned,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Section<T> {
    name: &'static str,
    data: T,
    loading: bool,
    error: Option<String>,
    not_provisioned: bool,
    provisioning_sensitive: bool,
}

impl<T: Default> Section<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            data: T::default(),
            loading: false,
            error: None,
            not_provisioned: false,
            provisioning_sensitive: false,
        }
    }

    /// Treat a 404 as "feature not provisioned" rather than a failure.
    pub fn provisioning_sensitive(mut self) -> Self {
        self.provisioning_sensitive = true;
        self
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_not_provisioned(&self) -> bool {
        self.not_provisioned
    }

    /// Marks the section as loading. Returns `false`, and changes nothing,
    /// when a load is already in flight.
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            tracing::debug!("{}: load already in progress, ignoring", self.name);
            return false;
        }
        self.loading = true;
        self.error = None;
        true
    }

    pub fn finish(&mut self, result: Result<T>) -> LoadOutcome {
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = data;
                self.not_provisioned = false;
                LoadOutcome::Loaded
            }
            Err(err) => {
                self.data = T::default();
                self.degrade(err)
            }
        }
    }

    fn degrade(&mut self, err: ConsoleError) -> LoadOutcome {
        match err {
            ConsoleError::Unauthorized => {
                tracing::debug!("{}: unauthorized, suppressing", self.name);
                LoadOutcome::Suppressed
            }
            ConsoleError::NotFound { .. } if self.provisioning_sensitive => {
                tracing::info!("{}: not provisioned on this server", self.name);
                self.not_provisioned = true;
                LoadOutcome::NotProvisioned
            }
            err => {
                tracing::warn!("{}: load failed: {}", self.name, err);
                self.error = Some(format!(
                    "Failed to load {}: {}",
                    self.name,
                    err.user_friendly_message()
                ));
                LoadOutcome::Failed
            }
        }
    }
}

impl<T> Section<Vec<T>> {
    pub fn items(&self) -> &[T] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.error = None;
    }

    /// Query for the next page, or `None` when the pager is exhausted or a
    /// load is already running.
    pub fn begin_page(&mut self, pager: &Paginator) -> Option<Query> {
        if !pager.has_more() {
            return None;
        }
        if !self.begin_load() {
            return None;
        }
        Some(pager.query())
    }

    /// Appends a page. A failed page keeps the rows already shown.
    pub fn finish_page(&mut self, pager: &mut Paginator, result: Result<Vec<T>>) -> LoadOutcome {
        self.loading = false;
        match result {
            Ok(rows) => {
                pager.record_page(rows.len());
                self.data.extend(rows);
                self.not_provisioned = false;
                LoadOutcome::Loaded
            }
            Err(err) => {
                pager.stop();
                self.degrade(err)
            }
        }
    }
}
