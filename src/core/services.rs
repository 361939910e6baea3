//! Service catalog, assignment of services to staff and rooms, and the
//! assigned-service lifecycle (pending → in_progress → completed).

use crate::api::ApiClient;
use crate::core::pagination::Paginator;
use crate::core::section::Section;
use crate::domain::model::{
    AssignServiceInput, AssignedService, AssignedServiceUpdate, Employee, InventoryReturn, Room,
    Service, ServiceInput, ServiceStatus,
};
use crate::domain::ports::View;
use crate::render::{self, OutputFormat, Table};
use crate::utils::error::{ConsoleError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_non_negative};
use async_trait::async_trait;
use serde_json::json;

/// Every return must name an item on the assignment and stay within the
/// balance quantity the server reported for it.
pub fn validate_inventory_returns(
    assignment: &AssignedService,
    returns: &[InventoryReturn],
) -> Result<()> {
    for ret in returns {
        validate_non_negative(&format!("quantity_returned for item {}", ret.item_id), ret.quantity_returned)?;

        let Some(item) = assignment
            .inventory_items
            .iter()
            .find(|item| item.item_id == ret.item_id)
        else {
            return Err(ConsoleError::validation(format!(
                "Item {} is not part of assignment {}",
                ret.item_id, assignment.id
            )));
        };

        if ret.quantity_returned > item.balance_quantity {
            return Err(ConsoleError::ReturnExceedsBalance {
                item_id: ret.item_id,
                requested: ret.quantity_returned,
                balance: item.balance_quantity,
            });
        }
    }

    let mut seen = std::collections::HashSet::new();
    for ret in returns {
        if !seen.insert(ret.item_id) {
            return Err(ConsoleError::validation(format!(
                "Item {} is returned more than once",
                ret.item_id
            )));
        }
    }
    Ok(())
}

fn validate_service_input(input: &ServiceInput) -> Result<()> {
    validate_non_empty_string("name", &input.name)?;
    validate_non_negative("charges", input.charges)
}

// ---------------------------------------------------------------------------
// Catalog

pub struct ServiceCatalogView {
    client: ApiClient,
    services: Section<Vec<Service>>,
    pager: Paginator,
}

impl ServiceCatalogView {
    pub fn new(client: ApiClient, page_size: usize) -> Self {
        Self {
            client,
            services: Section::new("services"),
            pager: Paginator::new(page_size),
        }
    }

    pub fn services(&self) -> &Section<Vec<Service>> {
        &self.services
    }

    pub fn has_more(&self) -> bool {
        self.pager.has_more()
    }

    pub async fn load_more(&mut self) -> bool {
        let Some(query) = self.services.begin_page(&self.pager) else {
            return false;
        };
        let result = self.client.get("/services", &query).await;
        self.services.finish_page(&mut self.pager, result);
        true
    }

    pub async fn reload(&mut self) {
        self.pager.reset();
        self.services.clear();
        self.load_more().await;
    }

    pub async fn get(&self, id: i64) -> Result<Service> {
        self.client.get(&format!("/services/{}", id), &[]).await
    }

    pub async fn create(&mut self, input: &ServiceInput) -> Result<Service> {
        validate_service_input(input)?;
        let service: Service = self.client.post("/services", input).await?;
        tracing::info!("Created service {} ({})", service.name, service.id);
        self.reload().await;
        Ok(service)
    }

    pub async fn update(&mut self, id: i64, input: &ServiceInput) -> Result<Service> {
        validate_service_input(input)?;
        let service: Service = self.client.put(&format!("/services/{}", id), input).await?;
        self.replace_local(service.clone());
        Ok(service)
    }

    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.client.delete(&format!("/services/{}", id)).await?;
        tracing::info!("Deleted service {}", id);
        self.services.data_mut().retain(|s| s.id != id);
        Ok(())
    }

    /// PATCHes the flag, then re-reads the service so the row shows what
    /// the server stored rather than what was sent.
    pub async fn set_guest_visibility(&mut self, id: i64, visible: bool) -> Result<Service> {
        let _: Option<serde_json::Value> = self
            .client
            .patch(
                &format!("/services/{}", id),
                &json!({ "is_visible_to_guest": visible }),
            )
            .await?;

        let service = self.get(id).await?;
        if service.is_visible_to_guest != visible {
            tracing::warn!(
                "Service {} visibility is {} after requesting {}",
                id,
                service.is_visible_to_guest,
                visible
            );
        }
        self.replace_local(service.clone());
        Ok(service)
    }

    /// Flips the flag relative to the server's current value; a listed row
    /// may be stale.
    pub async fn toggle_guest_visibility(&mut self, id: i64) -> Result<Service> {
        let current = self.get(id).await?.is_visible_to_guest;
        self.set_guest_visibility(id, !current).await
    }

    fn replace_local(&mut self, service: Service) {
        if let Some(existing) = self.services.data_mut().iter_mut().find(|s| s.id == service.id) {
            *existing = service;
        }
    }

    pub fn table(&self) -> Table {
        let mut table = Table::new(["id", "name", "charges", "visible_to_guest", "description"]);
        for service in self.services.items() {
            table.push(vec![
                service.id.to_string(),
                service.name.clone(),
                render::money(service.charges),
                if service.is_visible_to_guest { "yes" } else { "no" }.to_string(),
                render::optional(&service.description),
            ]);
        }
        table
    }
}

#[async_trait]
impl View for ServiceCatalogView {
    fn title(&self) -> &str {
        "Services"
    }

    async fn refresh(&mut self) -> Result<()> {
        self.reload().await;
        Ok(())
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        if let Some(error) = self.services.error() {
            if self.services.is_empty() {
                return Ok(error.to_string());
            }
        }
        match format {
            OutputFormat::Json => render::to_json(self.services.items()),
            _ => self.table().render(format),
        }
    }
}

// ---------------------------------------------------------------------------
// Assigned services

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignedFilter {
    pub status: Option<ServiceStatus>,
    pub employee_id: Option<i64>,
}

pub struct AssignedServicesView {
    client: ApiClient,
    filter: AssignedFilter,
    assigned: Section<Vec<AssignedService>>,
    pager: Paginator,
}

impl AssignedServicesView {
    pub fn new(client: ApiClient, page_size: usize, filter: AssignedFilter) -> Self {
        Self {
            client,
            filter,
            assigned: Section::new("assigned services"),
            pager: Paginator::new(page_size),
        }
    }

    pub fn assigned(&self) -> &Section<Vec<AssignedService>> {
        &self.assigned
    }

    pub fn has_more(&self) -> bool {
        self.pager.has_more()
    }

    pub async fn load_more(&mut self) -> bool {
        let Some(mut query) = self.assigned.begin_page(&self.pager) else {
            return false;
        };
        if let Some(status) = self.filter.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(employee_id) = self.filter.employee_id {
            query.push(("employee_id", employee_id.to_string()));
        }
        let result = self.client.get("/services/assigned", &query).await;
        self.assigned.finish_page(&mut self.pager, result);
        true
    }

    pub async fn reload(&mut self) {
        self.pager.reset();
        self.assigned.clear();
        self.load_more().await;
    }

    pub async fn get(&self, id: i64) -> Result<AssignedService> {
        self.client
            .get(&format!("/services/assigned/{}", id), &[])
            .await
    }

    pub async fn assign(&mut self, input: &AssignServiceInput) -> Result<AssignedService> {
        for allocation in &input.inventory_items {
            validate_non_negative(&format!("quantity for item {}", allocation.item_id), allocation.quantity)?;
        }
        let assigned: AssignedService = self.client.post("/services/assign", input).await?;
        tracing::info!(
            "Assigned service {} to employee {} for room {}",
            input.service_id,
            input.employee_id,
            input.room_id
        );
        self.reload().await;
        Ok(assigned)
    }

    pub async fn update_status(&mut self, id: i64, status: ServiceStatus) -> Result<AssignedService> {
        let current = self.get(id).await?;
        if current.status != status && !current.status.can_transition_to(status) {
            return Err(ConsoleError::validation(format!(
                "Assignment {} cannot move from {} to {}",
                id, current.status, status
            )));
        }
        self.send_update(
            id,
            &AssignedServiceUpdate {
                status,
                inventory_returns: Vec::new(),
            },
        )
        .await
    }

    /// Completes the assignment, returning unused inventory. The current
    /// balances are fetched first; nothing is sent if any return exceeds them.
    pub async fn complete(&mut self, id: i64, returns: Vec<InventoryReturn>) -> Result<AssignedService> {
        let current = self.get(id).await?;
        if current.status == ServiceStatus::Completed {
            return Err(ConsoleError::validation(format!(
                "Assignment {} is already completed",
                id
            )));
        }
        validate_inventory_returns(&current, &returns)?;

        let returned: usize = returns.len();
        let updated = self
            .send_update(
                id,
                &AssignedServiceUpdate {
                    status: ServiceStatus::Completed,
                    inventory_returns: returns,
                },
            )
            .await?;
        tracing::info!("Completed assignment {} with {} inventory returns", id, returned);
        Ok(updated)
    }

    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.client
            .delete(&format!("/services/assigned/{}", id))
            .await?;
        self.assigned.data_mut().retain(|a| a.id != id);
        Ok(())
    }

    async fn send_update(&mut self, id: i64, update: &AssignedServiceUpdate) -> Result<AssignedService> {
        let updated: AssignedService = self
            .client
            .patch(&format!("/services/assigned/{}", id), update)
            .await?;
        if let Some(existing) = self.assigned.data_mut().iter_mut().find(|a| a.id == id) {
            *existing = updated.clone();
        }
        Ok(updated)
    }

    pub fn table(&self) -> Table {
        let mut table = Table::new(["id", "service", "employee", "room", "status", "assigned_at"]);
        for a in self.assigned.items() {
            table.push(vec![
                a.id.to_string(),
                a.service
                    .as_ref()
                    .and_then(|s| s.name.clone())
                    .unwrap_or_else(|| a.service_id.to_string()),
                a.employee
                    .as_ref()
                    .and_then(|e| e.name.clone())
                    .unwrap_or_else(|| a.employee_id.to_string()),
                a.room
                    .as_ref()
                    .and_then(|r| r.number.clone())
                    .unwrap_or_else(|| a.room_id.to_string()),
                a.status.to_string(),
                render::optional(&a.assigned_at),
            ]);
        }
        table
    }

    pub fn inventory_table(assignment: &AssignedService) -> Table {
        let mut table = Table::new(["item_id", "item", "assigned", "used", "balance", "unit"]);
        for item in &assignment.inventory_items {
            table.push(vec![
                item.item_id.to_string(),
                render::optional(&item.item_name),
                render::quantity(item.quantity_assigned),
                render::quantity(item.quantity_used),
                render::quantity(item.balance_quantity),
                render::optional(&item.unit),
            ]);
        }
        table
    }
}

#[async_trait]
impl View for AssignedServicesView {
    fn title(&self) -> &str {
        "Assigned services"
    }

    async fn refresh(&mut self) -> Result<()> {
        self.reload().await;
        Ok(())
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        if let Some(error) = self.assigned.error() {
            if self.assigned.is_empty() {
                return Ok(error.to_string());
            }
        }
        match format {
            OutputFormat::Json => render::to_json(self.assigned.items()),
            _ => self.table().render(format),
        }
    }
}

// ---------------------------------------------------------------------------
// Lookups for the assignment form

pub struct LookupsView {
    client: ApiClient,
    employees: Section<Vec<Employee>>,
    rooms: Section<Vec<Room>>,
}

impl LookupsView {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            employees: Section::new("employees"),
            rooms: Section::new("rooms"),
        }
    }

    pub fn employees(&self) -> &[Employee] {
        self.employees.items()
    }

    pub fn rooms(&self) -> &[Room] {
        self.rooms.items()
    }
}

#[async_trait]
impl View for LookupsView {
    fn title(&self) -> &str {
        "Employees and rooms"
    }

    async fn refresh(&mut self) -> Result<()> {
        if self.employees.begin_load() {
            let result = self.client.get("/employees", &[]).await;
            self.employees.finish(result);
        }
        if self.rooms.begin_load() {
            let result = self.client.get("/rooms", &[]).await;
            self.rooms.finish(result);
        }
        Ok(())
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return render::to_json(&json!({
                "employees": self.employees.items(),
                "rooms": self.rooms.items(),
            }));
        }

        let mut employees = Table::new(["id", "name", "role"]);
        for e in self.employees.items() {
            employees.push(vec![e.id.to_string(), e.name.clone(), render::optional(&e.role)]);
        }
        let mut rooms = Table::new(["id", "number", "status"]);
        for r in self.rooms.items() {
            rooms.push(vec![r.id.to_string(), r.number.clone(), render::optional(&r.status)]);
        }

        let mut out = Vec::new();
        for (section_error, table) in [(self.employees.error(), employees), (self.rooms.error(), rooms)] {
            match section_error {
                Some(error) => out.push(error.to_string()),
                None => out.push(table.render(format)?),
            }
        }
        Ok(out.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AssignedInventoryItem;

    fn assignment() -> AssignedService {
        AssignedService {
            id: 11,
            service_id: 1,
            employee_id: 2,
            room_id: 3,
            status: ServiceStatus::InProgress,
            assigned_at: None,
            service: None,
            employee: None,
            room: None,
            inventory_items: vec![
                AssignedInventoryItem {
                    item_id: 100,
                    item_name: Some("Towel".to_string()),
                    quantity_assigned: 5.0,
                    quantity_used: 2.0,
                    balance_quantity: 3.0,
                    unit: Some("pcs".to_string()),
                },
                AssignedInventoryItem {
                    item_id: 101,
                    item_name: Some("Shampoo".to_string()),
                    quantity_assigned: 2.0,
                    quantity_used: 2.0,
                    balance_quantity: 0.0,
                    unit: None,
                },
            ],
            extra: Default::default(),
        }
    }

    fn ret(item_id: i64, quantity_returned: f64) -> InventoryReturn {
        InventoryReturn {
            item_id,
            quantity_returned,
        }
    }

    #[test]
    fn test_return_up_to_balance_is_accepted() {
        assert!(validate_inventory_returns(&assignment(), &[ret(100, 3.0)]).is_ok());
        assert!(validate_inventory_returns(&assignment(), &[ret(100, 1.5)]).is_ok());
        assert!(validate_inventory_returns(&assignment(), &[]).is_ok());
    }

    #[test]
    fn test_return_above_balance_is_rejected() {
        match validate_inventory_returns(&assignment(), &[ret(100, 4.0)]) {
            Err(ConsoleError::ReturnExceedsBalance {
                item_id,
                requested,
                balance,
            }) => {
                assert_eq!(item_id, 100);
                assert_eq!(requested, 4.0);
                assert_eq!(balance, 3.0);
            }
            other => panic!("expected ReturnExceedsBalance, got {:?}", other),
        }
        assert!(validate_inventory_returns(&assignment(), &[ret(101, 1.0)]).is_err());
    }

    #[test]
    fn test_unknown_and_negative_returns_rejected() {
        assert!(validate_inventory_returns(&assignment(), &[ret(999, 1.0)]).is_err());
        assert!(validate_inventory_returns(&assignment(), &[ret(100, -1.0)]).is_err());
    }

    #[test]
    fn test_duplicate_item_returns_rejected() {
        let returns = [ret(100, 2.0), ret(100, 2.0)];
        assert!(validate_inventory_returns(&assignment(), &returns).is_err());
    }

    #[test]
    fn test_inventory_table() {
        let table = AssignedServicesView::inventory_table(&assignment());
        assert_eq!(table.rows()[0], vec!["100", "Towel", "5", "2", "3", "pcs"]);
    }
}
