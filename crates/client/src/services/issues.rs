//! Issues raised by citizens against projects (`/issues/...`).

use hamro_core::models::{Issue, IssuePayload, IssueStatus, IssueStatusUpdate, NewIssue};
use reqwest::Method;

use crate::error::ApiResult;
use crate::gateway::{into_model, Gateway};

#[derive(Debug, Clone, Copy)]
pub struct IssueService<'a> {
    gateway: &'a Gateway,
}

impl<'a> IssueService<'a> {
    pub fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    /// File an issue. Requires a logged-in citizen even when `anonymous`.
    pub async fn create(&self, issue: &NewIssue) -> ApiResult<Issue> {
        issue.validate()?;
        let request = self
            .gateway
            .authenticated(Method::POST, &["issues", issue.project_id.as_str(), "issues"])?
            .json(issue);
        let payload: IssuePayload = self
            .gateway
            .fetch(request, "Issue creation failed")
            .await?;
        let created: Issue = into_model(payload.with_project_fallback(&issue.project_id))?;
        tracing::info!(
            issue_id = %created.id,
            project_id = %created.project_id,
            anonymous = created.anonymous,
            "Issue filed"
        );
        Ok(created)
    }

    /// Issues filed against a project. Entries without a project reference
    /// are attributed to `project_id`.
    pub async fn list(&self, project_id: &str) -> ApiResult<Vec<Issue>> {
        let request = self
            .gateway
            .public(Method::GET, &["issues", project_id, "issues"])?;
        let payloads: Vec<IssuePayload> = self
            .gateway
            .fetch(request, "Failed to fetch issues")
            .await?;
        payloads
            .into_iter()
            .map(|payload| into_model(payload.with_project_fallback(project_id)))
            .collect()
    }

    /// Move an issue through triage. Admin only.
    pub async fn update_status(&self, issue_id: &str, status: IssueStatus) -> ApiResult<Issue> {
        let request = self
            .gateway
            .authenticated(Method::PUT, &["issues", "issues", issue_id, "status"])?
            .json(&IssueStatusUpdate { status });
        let updated: Issue = self
            .gateway
            .fetch_model::<IssuePayload, _>(request, "Failed to update issue status")
            .await?;
        tracing::info!(issue_id, status = %updated.status, "Issue status updated");
        Ok(updated)
    }
}
