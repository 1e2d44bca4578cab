//! Expenditure entity model and DTOs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::normalize::{created_at_or_now, id_or_generate, optional_text, require_date, require_text};
use crate::types::{Amount, DateOnly, EntityId, Timestamp};

const ENTITY: &str = "expenditure";

/// Money spent by a contractor against a project. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expenditure {
    pub id: EntityId,
    pub created_at: Timestamp,
    pub project_id: EntityId,
    pub description: Option<String>,
    pub amount: Amount,
    pub spent_on: DateOnly,
    /// Link to the scanned bill.
    pub bill_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExpenditurePayload {
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub project_id: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub spent_on: Option<String>,
    pub bill_url: Option<String>,
}

impl ExpenditurePayload {
    /// Fill a missing project reference from the request context.
    pub fn with_project_fallback(mut self, project_id: &str) -> Self {
        if self
            .project_id
            .as_deref()
            .map_or(true, |id| id.trim().is_empty())
        {
            self.project_id = Some(project_id.to_string());
        }
        self
    }
}

impl TryFrom<ExpenditurePayload> for Expenditure {
    type Error = CoreError;

    fn try_from(payload: ExpenditurePayload) -> Result<Self, Self::Error> {
        let amount = payload
            .amount
            .ok_or_else(|| CoreError::missing(ENTITY, "amount"))?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(CoreError::invalid(
                ENTITY,
                "amount",
                format!("must be a non-negative amount (got {amount})"),
            ));
        }
        Ok(Self {
            id: id_or_generate(payload.id),
            created_at: created_at_or_now(ENTITY, payload.created_at)?,
            project_id: require_text(ENTITY, "project_id", payload.project_id)?,
            description: optional_text(payload.description),
            amount,
            spent_on: require_date(ENTITY, "spent_on", payload.spent_on)?,
            bill_url: optional_text(payload.bill_url),
        })
    }
}

/// Body of `POST /expenses/{project_id}/expenditures`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewExpenditure {
    pub project_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: Amount,
    pub spent_on: DateOnly,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_url: Option<String>,
}

impl NewExpenditure {
    /// Reject amounts that could never be accepted before sending them.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(CoreError::Validation(
                "Amount must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
