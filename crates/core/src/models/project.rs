//! Project entity model and DTOs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::enum_or_default;
use crate::models::milestone::NewMilestone;
use crate::normalize::{
    amount_or_zero, created_at_or_now, id_or_generate, optional_date, optional_scalar_int,
    optional_text, require_text, Scalar,
};
use crate::types::{Amount, DateOnly, EntityId, Timestamp};

const ENTITY: &str = "project";

define_wire_enum! {
    /// Who pays for the project.
    ProjectType {
        GovFunded = "Gov-funded",
        CommunityFunded = "Community-funded",
    }
}

define_wire_enum! {
    /// Project lifecycle status.
    #[derive(Default)]
    ProjectStatus {
        #[default]
        Soon = "soon",
        Ongoing = "ongoing",
        Completed = "completed",
        Delayed = "delayed",
    }
}

/// A ward improvement project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: EntityId,
    pub created_at: Timestamp,
    pub title: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub description: Option<String>,
    pub ward_num: Option<i32>,
    pub district: Option<String>,
    pub city: Option<String>,
    /// Contractor phone number.
    pub contractor: Option<String>,
    pub contractor_name: Option<String>,
    pub total_budget: Amount,
    pub budget_utilized: Amount,
    pub fundraised: Amount,
    pub deadline: Option<DateOnly>,
    pub status: ProjectStatus,
    pub image_urls: Vec<String>,
}

impl Project {
    /// Fundraising progress as a percentage of the total budget, capped at 100.
    /// A project without a budget reports zero.
    pub fn funding_progress(&self) -> f64 {
        if self.total_budget <= 0.0 {
            return 0.0;
        }
        (self.fundraised / self.total_budget * 100.0).min(100.0)
    }

    /// Budget not yet spent. Never negative.
    pub fn budget_remaining(&self) -> Amount {
        (self.total_budget - self.budget_utilized).max(0.0)
    }

    /// Whether `phone` is the contractor assigned to this project.
    pub fn is_contractor(&self, phone: &str) -> bool {
        self.contractor.as_deref() == Some(phone)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectPayload {
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub description: Option<String>,
    pub ward_num: Option<Scalar>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub contractor: Option<String>,
    pub contractor_name: Option<String>,
    pub total_budget: Option<f64>,
    pub budget_utilized: Option<f64>,
    pub fundraised: Option<f64>,
    pub deadline: Option<String>,
    pub status: Option<String>,
    pub image_urls: Option<Vec<String>>,
}

impl TryFrom<ProjectPayload> for Project {
    type Error = CoreError;

    fn try_from(payload: ProjectPayload) -> Result<Self, Self::Error> {
        let raw_type = require_text(ENTITY, "type", payload.project_type)?;
        Ok(Self {
            id: id_or_generate(payload.id),
            created_at: created_at_or_now(ENTITY, payload.created_at)?,
            title: require_text(ENTITY, "title", payload.title)?,
            project_type: ProjectType::parse(ENTITY, "type", &raw_type)?,
            description: optional_text(payload.description),
            ward_num: optional_scalar_int(ENTITY, "ward_num", payload.ward_num)?,
            district: optional_text(payload.district),
            city: optional_text(payload.city),
            contractor: optional_text(payload.contractor),
            contractor_name: optional_text(payload.contractor_name),
            total_budget: amount_or_zero(payload.total_budget),
            budget_utilized: amount_or_zero(payload.budget_utilized),
            fundraised: amount_or_zero(payload.fundraised),
            deadline: optional_date(ENTITY, "deadline", payload.deadline)?,
            status: enum_or_default(payload.status, |raw| {
                ProjectStatus::parse(ENTITY, "status", raw)
            })?,
            image_urls: payload.image_urls.unwrap_or_default(),
        })
    }
}

/// Project fields supplied by an admin when proposing a new project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProject {
    pub title: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ward_num: i32,
    pub district: String,
    pub city: String,
    pub contractor: String,
    pub contractor_name: String,
    pub total_budget: Amount,
    pub budget_utilized: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateOnly>,
    pub fundraised: Amount,
    pub status: ProjectStatus,
}

/// Body of `POST /project/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateProjectRequest {
    pub project: NewProject,
    pub milestones: Vec<NewMilestone>,
}

/// Partial update of a project. Unset fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contractor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_utilized: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateOnly>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fundraised: Option<Amount>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Server acknowledgement of a project deletion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeletionReceipt {
    #[serde(default)]
    pub detail: Option<String>,
}
