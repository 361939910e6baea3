use crate::api::ApiClient;
use crate::core::pagination::Paginator;
use crate::core::section::Section;
use crate::domain::model::{
    RequestStatus, ServiceRequest, ServiceRequestInput, ServiceRequestUpdate,
};
use crate::domain::ports::View;
use crate::render::{self, OutputFormat, Table};
use crate::utils::error::Result;
use crate::utils::validation::validate_non_empty_string;
use async_trait::async_trait;

/// Guest service requests raised from rooms (housekeeping, maintenance, ...).
pub struct ServiceRequestsView {
    client: ApiClient,
    status: Option<RequestStatus>,
    requests: Section<Vec<ServiceRequest>>,
    pager: Paginator,
}

impl ServiceRequestsView {
    pub fn new(client: ApiClient, page_size: usize, status: Option<RequestStatus>) -> Self {
        Self {
            client,
            status,
            requests: Section::new("service requests"),
            pager: Paginator::new(page_size),
        }
    }

    pub fn requests(&self) -> &Section<Vec<ServiceRequest>> {
        &self.requests
    }

    pub fn has_more(&self) -> bool {
        self.pager.has_more()
    }

    pub async fn load_more(&mut self) -> bool {
        let Some(mut query) = self.requests.begin_page(&self.pager) else {
            return false;
        };
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        let result = self.client.get("/service-requests", &query).await;
        self.requests.finish_page(&mut self.pager, result);
        true
    }

    pub async fn reload(&mut self) {
        self.pager.reset();
        self.requests.clear();
        self.load_more().await;
    }

    pub async fn create(&mut self, input: &ServiceRequestInput) -> Result<ServiceRequest> {
        validate_non_empty_string("request_type", &input.request_type)?;
        let request: ServiceRequest = self.client.post("/service-requests", input).await?;
        tracing::info!("Created service request {} for room {}", request.id, request.room_id);
        self.reload().await;
        Ok(request)
    }

    pub async fn update(&mut self, id: i64, update: &ServiceRequestUpdate) -> Result<ServiceRequest> {
        let updated: ServiceRequest = self
            .client
            .put(&format!("/service-requests/{}", id), update)
            .await?;
        if let Some(existing) = self.requests.data_mut().iter_mut().find(|r| r.id == id) {
            *existing = updated.clone();
        }
        Ok(updated)
    }

    pub async fn set_status(&mut self, id: i64, status: RequestStatus) -> Result<ServiceRequest> {
        self.update(
            id,
            &ServiceRequestUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.client
            .delete(&format!("/service-requests/{}", id))
            .await?;
        tracing::info!("Deleted service request {}", id);
        self.requests.data_mut().retain(|r| r.id != id);
        Ok(())
    }

    pub fn table(&self) -> Table {
        let mut table = Table::new([
            "id",
            "room",
            "request_type",
            "status",
            "employee_id",
            "created_at",
            "description",
        ]);
        for r in self.requests.items() {
            table.push(vec![
                r.id.to_string(),
                r.room_number.clone().unwrap_or_else(|| r.room_id.to_string()),
                r.request_type.clone(),
                r.status.as_str().to_string(),
                render::optional(&r.employee_id),
                render::optional(&r.created_at),
                render::optional(&r.description),
            ]);
        }
        table
    }
}

#[async_trait]
impl View for ServiceRequestsView {
    fn title(&self) -> &str {
        "Service requests"
    }

    async fn refresh(&mut self) -> Result<()> {
        self.reload().await;
        Ok(())
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        if let Some(error) = self.requests.error() {
            if self.requests.is_empty() {
                return Ok(error.to_string());
            }
        }
        match format {
            OutputFormat::Json => render::to_json(self.requests.items()),
            _ => self.table().render(format),
        }
    }
}
