use crate::domain::ports::{Storage, View};
use crate::render::OutputFormat;
use crate::utils::error::Result;
use std::time::Instant;

/// Refreshes a view and renders it, optionally saving the rendering.
pub struct ViewRunner<V: View> {
    view: V,
    format: OutputFormat,
}

impl<V: View> ViewRunner<V> {
    pub fn new(view: V, format: OutputFormat) -> Self {
        Self { view, format }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub async fn run(&mut self) -> Result<String> {
        let started = Instant::now();
        tracing::debug!("🔄 Loading {}", self.view.title());

        self.view.refresh().await?;
        tracing::debug!("✅ {} loaded in {:?}", self.view.title(), started.elapsed());

        self.view.render(self.format)
    }

    /// Renders again without fetching, after the caller drove extra loads.
    pub fn render(&self) -> Result<String> {
        self.view.render(self.format)
    }

    pub async fn save<S: Storage>(&self, storage: &S, path: &str) -> Result<()> {
        let output = self.render()?;
        storage.write_file(path, output.as_bytes()).await?;
        tracing::info!("📁 {} saved to {}", self.view.title(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ConsoleError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ConsoleError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct CountingView {
        refreshes: usize,
    }

    #[async_trait]
    impl View for CountingView {
        fn title(&self) -> &str {
            "Counter"
        }

        async fn refresh(&mut self) -> Result<()> {
            self.refreshes += 1;
            Ok(())
        }

        fn render(&self, format: OutputFormat) -> Result<String> {
            Ok(format!("{:?}:{}", format, self.refreshes))
        }
    }

    #[tokio::test]
    async fn test_run_refreshes_then_renders() {
        let mut runner = ViewRunner::new(CountingView { refreshes: 0 }, OutputFormat::Table);
        assert_eq!(runner.run().await.unwrap(), "Table:1");
        assert_eq!(runner.run().await.unwrap(), "Table:2");
        assert_eq!(runner.view().refreshes, 2);
    }

    #[tokio::test]
    async fn test_save_writes_rendering() {
        let storage = MockStorage::default();
        let mut runner = ViewRunner::new(CountingView { refreshes: 0 }, OutputFormat::Csv);
        runner.run().await.unwrap();
        runner.save(&storage, "counter.csv").await.unwrap();

        let saved = storage.read_file("counter.csv").await.unwrap();
        assert_eq!(saved, b"Csv:1".to_vec());
    }
}
