//! Projects and their milestones (`/project/...`).

use hamro_core::models::{
    CreateProjectRequest, DeletionReceipt, Milestone, MilestonePayload, MilestoneUpdate,
    Project, ProjectPayload, ProjectUpdate,
};
use reqwest::Method;

use crate::error::{ApiError, ApiResult};
use crate::gateway::{into_model, Gateway};

#[derive(Debug, Clone, Copy)]
pub struct ProjectService<'a> {
    gateway: &'a Gateway,
}

impl<'a> ProjectService<'a> {
    pub fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    /// Create a project together with its initial milestones. Admin only.
    pub async fn create(&self, body: &CreateProjectRequest) -> ApiResult<Project> {
        if body.project.title.trim().is_empty() {
            return Err(ApiError::Validation("Project title is required".into()));
        }
        let request = self
            .gateway
            .authenticated(Method::POST, &["project", ""])?
            .json(body);
        let project: Project = self
            .gateway
            .fetch_model::<ProjectPayload, _>(request, "Project creation failed")
            .await?;
        tracing::info!(
            project_id = %project.id,
            milestones = body.milestones.len(),
            "Project created"
        );
        Ok(project)
    }

    pub async fn list(&self) -> ApiResult<Vec<Project>> {
        let request = self.gateway.public(Method::GET, &["project", ""])?;
        self.gateway
            .fetch_models::<ProjectPayload, _>(request, "Failed to fetch projects")
            .await
    }

    pub async fn get(&self, project_id: &str) -> ApiResult<Project> {
        let request = self.gateway.public(Method::GET, &["project", project_id])?;
        self.gateway
            .fetch_model::<ProjectPayload, _>(request, "Project not found")
            .await
    }

    /// Apply a partial update. An empty update is rejected locally.
    pub async fn update(&self, project_id: &str, update: &ProjectUpdate) -> ApiResult<Project> {
        if update.is_empty() {
            return Err(ApiError::Validation("Nothing to update".into()));
        }
        let request = self
            .gateway
            .authenticated(Method::PUT, &["project", project_id])?
            .json(update);
        let project: Project = self
            .gateway
            .fetch_model::<ProjectPayload, _>(request, "Project update failed")
            .await?;
        tracing::info!(project_id, status = %project.status, "Project updated");
        Ok(project)
    }

    pub async fn delete(&self, project_id: &str) -> ApiResult<DeletionReceipt> {
        let request = self
            .gateway
            .authenticated(Method::DELETE, &["project", project_id])?;
        let receipt: DeletionReceipt = self
            .gateway
            .fetch(request, "Project deletion failed")
            .await?;
        tracing::info!(project_id, "Project deleted");
        Ok(receipt)
    }

    /// Milestones of a project. Entries without a project reference are
    /// attributed to `project_id`.
    pub async fn milestones(&self, project_id: &str) -> ApiResult<Vec<Milestone>> {
        let request = self
            .gateway
            .public(Method::GET, &["project", project_id, "milestones"])?;
        let payloads: Vec<MilestonePayload> = self
            .gateway
            .fetch(request, "Failed to fetch milestones")
            .await?;
        payloads
            .into_iter()
            .map(|payload| into_model(payload.with_project_fallback(project_id)))
            .collect()
    }

    pub async fn update_milestone(
        &self,
        project_id: &str,
        milestone_id: &str,
        update: &MilestoneUpdate,
    ) -> ApiResult<Milestone> {
        let request = self
            .gateway
            .authenticated(Method::PUT, &["project", project_id, milestone_id])?
            .json(update);
        let payload: MilestonePayload = self
            .gateway
            .fetch(request, "Milestone update failed")
            .await?;
        let milestone: Milestone = into_model(payload.with_project_fallback(project_id))?;
        tracing::info!(
            project_id,
            milestone_id,
            completed = milestone.completed,
            "Milestone updated"
        );
        Ok(milestone)
    }
}
