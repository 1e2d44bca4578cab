//! Milestone entity model and DTOs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::normalize::{id_or_generate, optional_date, optional_text, optional_timestamp, require_text};
use crate::types::{DateOnly, EntityId, Timestamp};

const ENTITY: &str = "milestone";

/// A checkpoint within exactly one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub id: EntityId,
    pub project_id: EntityId,
    pub description: Option<String>,
    pub due_date: Option<DateOnly>,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    /// Progress photos, in upload order.
    pub photo_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MilestonePayload {
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub completed: Option<bool>,
    pub completed_at: Option<String>,
    pub photo_urls: Option<Vec<String>>,
}

impl MilestonePayload {
    /// Fill a missing project reference from the request context (e.g. the
    /// `{project_id}` path segment the milestone was listed under).
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

impl TryFrom<MilestonePayload> for Milestone {
    type Error = CoreError;

    fn try_from(payload: MilestonePayload) -> Result<Self, Self::Error> {
        Ok(Self {
            id: id_or_generate(payload.id),
            project_id: require_text(ENTITY, "project_id", payload.project_id)?,
            description: optional_text(payload.description),
            due_date: optional_date(ENTITY, "due_date", payload.due_date)?,
            completed: payload.completed.unwrap_or(false),
            completed_at: optional_timestamp(ENTITY, "completed_at", payload.completed_at)?,
            photo_urls: payload.photo_urls.unwrap_or_default(),
        })
    }
}

/// Milestone proposed alongside a new project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMilestone {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateOnly>,
}

/// Contractor progress report on a milestone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MilestoneUpdate {
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub photo_urls: Vec<String>,
}

impl MilestoneUpdate {
    /// Mark the milestone done at `at`, attaching proof photos.
    pub fn completed(at: Timestamp, photo_urls: Vec<String>) -> Self {
        Self {
            completed: true,
            completed_at: Some(at),
            photo_urls,
        }
    }
}
