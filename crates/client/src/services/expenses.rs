//! Project expenditures (`/expenses/...`).

use hamro_core::models::{Expenditure, ExpenditurePayload, NewExpenditure};
use reqwest::Method;

use crate::error::ApiResult;
use crate::gateway::{into_model, Gateway};

#[derive(Debug, Clone, Copy)]
pub struct ExpenseService<'a> {
    gateway: &'a Gateway,
}

impl<'a> ExpenseService<'a> {
    pub fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    /// Record spending against `expenditure.project_id`. Admin only.
    pub async fn create(&self, expenditure: &NewExpenditure) -> ApiResult<Expenditure> {
        expenditure.validate()?;
        let project_id = expenditure.project_id.as_str();
        let request = self
            .gateway
            .authenticated(Method::POST, &["expenses", project_id, "expenditures"])?
            .json(expenditure);
        let payload: ExpenditurePayload = self
            .gateway
            .fetch(request, "Expenditure creation failed")
            .await?;
        let created: Expenditure = into_model(payload.with_project_fallback(project_id))?;
        tracing::info!(project_id, amount = created.amount, "Expenditure recorded");
        Ok(created)
    }

    pub async fn list(&self, project_id: &str) -> ApiResult<Vec<Expenditure>> {
        let request = self.gateway.public(
            Method::GET,
            &["expenses", "projects", project_id, "expenditures"],
        )?;
        let payloads: Vec<ExpenditurePayload> = self
            .gateway
            .fetch(request, "Failed to fetch expenditures")
            .await?;
        payloads
            .into_iter()
            .map(|payload| into_model(payload.with_project_fallback(project_id)))
            .collect()
    }
}
