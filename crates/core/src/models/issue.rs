//! Issue (work request / complaint) model and DTOs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::enum_or_default;
use crate::normalize::{created_at_or_now, id_or_generate, optional_text, require_text};
use crate::types::{EntityId, Timestamp};

const ENTITY: &str = "issue";

define_wire_enum! {
    /// Triage state of an issue. Only admins move it forward.
    #[derive(Default)]
    IssueStatus {
        #[default]
        Pending = "pending",
        Reviewed = "reviewed",
        Resolved = "resolved",
    }
}

/// A citizen-filed issue against a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub id: EntityId,
    pub created_at: Timestamp,
    pub project_id: EntityId,
    pub reason: String,
    pub proof_urls: Vec<String>,
    pub user_id: Option<String>,
    pub anonymous: bool,
    pub status: IssueStatus,
}

impl Issue {
    /// Reporter to show in listings. Always `None` for anonymous issues, even
    /// if the backend echoed a user reference.
    pub fn reporter(&self) -> Option<&str> {
        if self.anonymous {
            return None;
        }
        self.user_id.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IssuePayload {
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub project_id: Option<String>,
    pub reason: Option<String>,
    pub proof_urls: Option<Vec<String>>,
    pub user_id: Option<String>,
    pub anonymous: Option<bool>,
    pub status: Option<String>,
}

impl IssuePayload {
    /// Fill a missing project reference from the `{project_id}` path
    /// segment the issue was listed or filed under.
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

impl TryFrom<IssuePayload> for Issue {
    type Error = CoreError;

    fn try_from(payload: IssuePayload) -> Result<Self, Self::Error> {
        Ok(Self {
            id: id_or_generate(payload.id),
            created_at: created_at_or_now(ENTITY, payload.created_at)?,
            project_id: require_text(ENTITY, "project_id", payload.project_id)?,
            reason: require_text(ENTITY, "reason", payload.reason)?,
            proof_urls: payload.proof_urls.unwrap_or_default(),
            user_id: optional_text(payload.user_id),
            anonymous: payload.anonymous.unwrap_or(false),
            status: enum_or_default(payload.status, |raw| IssueStatus::parse(ENTITY, "status", raw))?,
        })
    }
}

/// Body of `POST /issues/{project_id}/issues`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewIssue {
    pub project_id: EntityId,
    pub reason: String,
    pub proof_urls: Vec<String>,
    pub anonymous: bool,
}

impl NewIssue {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.reason.trim().is_empty() {
            return Err(CoreError::Validation(
                "Please describe the issue".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body of `PUT /issues/issues/{issue_id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IssueStatusUpdate {
    pub status: IssueStatus,
}
