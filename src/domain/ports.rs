use crate::render::OutputFormat;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Page sizes per screen, sent as `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Services,
    AssignedServices,
    ServiceRequests,
    Ledgers,
    JournalEntries,
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn token(&self) -> Option<&str>;
    fn timeout_seconds(&self) -> u64;
    fn page_size(&self, screen: Screen) -> usize;
}

/// A back-office screen: fetch into local state, then render that state.
#[async_trait]
pub trait View: Send + Sync {
    fn title(&self) -> &str;
    async fn refresh(&mut self) -> Result<()>;
    fn render(&self, format: OutputFormat) -> Result<String>;
}
