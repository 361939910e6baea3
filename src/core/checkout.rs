use crate::api::ApiClient;
use crate::core::section::Section;
use crate::domain::model::{CheckoutInventoryCheck, CheckoutInventoryDetails, CheckoutItemCheck};
use crate::domain::ports::View;
use crate::render::{self, OutputFormat, Table};
use crate::utils::error::{ConsoleError, Result};
use crate::utils::validation::validate_non_negative;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;

/// Per-item counts may not add up to more than the room was stocked with.
/// Each item is counted once.
pub fn validate_inventory_check(
    details: &CheckoutInventoryDetails,
    checks: &[CheckoutItemCheck],
) -> Result<()> {
    let mut seen = HashSet::new();
    for check in checks {
        if !seen.insert(check.item_id) {
            return Err(ConsoleError::validation(format!(
                "Item {} is counted more than once",
                check.item_id
            )));
        }
        validate_non_negative(&format!("used_qty for item {}", check.item_id), check.used_qty)?;
        validate_non_negative(&format!("missing_qty for item {}", check.item_id), check.missing_qty)?;

        let Some(item) = details.items.iter().find(|i| i.item_id == check.item_id) else {
            return Err(ConsoleError::validation(format!(
                "Item {} is not listed for checkout request {}",
                check.item_id, details.checkout_request_id
            )));
        };
        if check.used_qty + check.missing_qty > item.quantity {
            return Err(ConsoleError::validation(format!(
                "Item {}: used {} + missing {} exceeds stocked quantity {}",
                check.item_id,
                render::quantity(check.used_qty),
                render::quantity(check.missing_qty),
                render::quantity(item.quantity)
            )));
        }
    }
    Ok(())
}

/// Room inventory verification before a guest checkout is billed.
pub struct CheckoutVerificationView {
    client: ApiClient,
    request_id: i64,
    details: Section<Option<CheckoutInventoryDetails>>,
}

impl CheckoutVerificationView {
    pub fn new(client: ApiClient, request_id: i64) -> Self {
        Self {
            client,
            request_id,
            details: Section::new("checkout inventory"),
        }
    }

    fn path(&self, action: &str) -> String {
        format!("/bill/checkout-request/{}/{}", self.request_id, action)
    }

    pub fn details(&self) -> Option<&CheckoutInventoryDetails> {
        self.details.data().as_ref()
    }

    pub async fn load(&mut self) {
        if !self.details.begin_load() {
            return;
        }
        let result = self
            .client
            .get::<CheckoutInventoryDetails>(&self.path("inventory-details"), &[])
            .await
            .map(Some);
        self.details.finish(result);
    }

    /// Submits the checked counts; items left out are reported as untouched.
    pub async fn submit_check(&mut self, checks: Vec<CheckoutItemCheck>) -> Result<Value> {
        if self.details().is_none() {
            self.load().await;
        }
        let Some(details) = self.details() else {
            return Err(ConsoleError::validation(format!(
                "Inventory details for checkout request {} are unavailable",
                self.request_id
            )));
        };
        validate_inventory_check(details, &checks)?;

        let mut items = checks;
        for item in &details.items {
            if !items.iter().any(|c| c.item_id == item.item_id) {
                items.push(CheckoutItemCheck {
                    item_id: item.item_id,
                    used_qty: 0.0,
                    missing_qty: 0.0,
                    damage_notes: None,
                });
            }
        }

        let payload = CheckoutInventoryCheck {
            inventory_checked: true,
            items,
        };
        let response: Value = self
            .client
            .post(&self.path("check-inventory"), &payload)
            .await?;
        tracing::info!("Inventory verified for checkout request {}", self.request_id);
        Ok(response)
    }
}

#[async_trait]
impl View for CheckoutVerificationView {
    fn title(&self) -> &str {
        "Checkout verification"
    }

    async fn refresh(&mut self) -> Result<()> {
        self.load().await;
        Ok(())
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        if let Some(error) = self.details.error() {
            return Ok(error.to_string());
        }
        let Some(details) = self.details() else {
            return Ok("(no data)".to_string());
        };
        if format == OutputFormat::Json {
            return render::to_json(details);
        }

        let mut table = Table::new(["item_id", "item", "quantity", "complimentary"]);
        for item in &details.items {
            table.push(vec![
                item.item_id.to_string(),
                render::optional(&item.item_name),
                render::quantity(item.quantity),
                if item.is_complimentary { "yes" } else { "no" }.to_string(),
            ]);
        }
        if format == OutputFormat::Csv {
            return table.render(format);
        }
        Ok(format!(
            "Checkout request {} | room {} | status {}\n{}",
            details.checkout_request_id,
            render::optional(&details.room_number),
            render::optional(&details.status),
            table.to_text()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CheckoutInventoryItem;

    fn details() -> CheckoutInventoryDetails {
        CheckoutInventoryDetails {
            checkout_request_id: 5,
            room_number: Some("204".to_string()),
            status: Some("pending".to_string()),
            items: vec![CheckoutInventoryItem {
                item_id: 1,
                item_name: Some("Mineral water".to_string()),
                quantity: 4.0,
                is_complimentary: true,
            }],
            extra: Default::default(),
        }
    }

    fn check(item_id: i64, used: f64, missing: f64) -> CheckoutItemCheck {
        CheckoutItemCheck {
            item_id,
            used_qty: used,
            missing_qty: missing,
            damage_notes: None,
        }
    }

    #[test]
    fn test_counts_within_stock() {
        assert!(validate_inventory_check(&details(), &[check(1, 2.0, 2.0)]).is_ok());
    }

    #[test]
    fn test_counts_over_stock_rejected() {
        assert!(validate_inventory_check(&details(), &[check(1, 3.0, 2.0)]).is_err());
    }

    #[test]
    fn test_repeated_item_rejected() {
        let checks = [check(1, 3.0, 0.0), check(1, 3.0, 0.0)];
        assert!(matches!(
            validate_inventory_check(&details(), &checks),
            Err(ConsoleError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_unknown_item_rejected() {
        assert!(validate_inventory_check(&details(), &[check(9, 1.0, 0.0)]).is_err());
    }
}
