//! Citizenship document upload and review (`/verification/...`).

use hamro_core::models::{
    DocumentUpload, PendingCitizenship, PendingCitizenshipPayload, UploadReceipt,
    UserCitizenship, UserPublic, UserPublicPayload,
};
use reqwest::multipart::{Form, Part};
use reqwest::Method;

use crate::error::{ApiError, ApiResult};
use crate::gateway::Gateway;

#[derive(Debug, Clone, Copy)]
pub struct VerificationService<'a> {
    gateway: &'a Gateway,
}

impl<'a> VerificationService<'a> {
    pub fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    /// Upload a citizenship image for `phone` as multipart field `file`.
    ///
    /// The backend only accepts uploads for the caller's own phone number.
    pub async fn upload_citizenship(
        &self,
        phone: &str,
        document: DocumentUpload,
    ) -> ApiResult<UploadReceipt> {
        document.validate()?;
        let size = document.bytes.len();
        let part = Part::bytes(document.bytes)
            .file_name(document.filename)
            .mime_str(&document.content_type)
            .map_err(|e| ApiError::Validation(format!("Invalid content type: {e}")))?;
        let form = Form::new().part("file", part);

        let request = self
            .gateway
            .authenticated_multipart(&["verification", "citizenship", phone], form)?;
        let receipt: UploadReceipt = self.gateway.fetch(request, "Upload failed").await?;
        tracing::info!(phone, size, saved_to = %receipt.saved_to, "Citizenship uploaded");
        Ok(receipt)
    }

    /// The oldest unreviewed submission with its image inlined. Admin only.
    pub async fn pending_citizenship(&self) -> ApiResult<PendingCitizenship> {
        let request = self
            .gateway
            .authenticated(Method::GET, &["verification", "citizenship"])?;
        self.gateway
            .fetch_model::<PendingCitizenshipPayload, _>(request, "Failed to fetch citizenship")
            .await
    }

    /// Record citizenship details for `phone` and mark the submission
    /// verified. Admin only.
    pub async fn verify_identity(
        &self,
        phone: &str,
        details: &UserCitizenship,
    ) -> ApiResult<UserPublic> {
        let request = self
            .gateway
            .authenticated(Method::PUT, &["verification", "citizenship", phone])?
            .json(details);
        let user: UserPublic = self
            .gateway
            .fetch_model::<UserPublicPayload, _>(request, "Verification failed")
            .await?;
        tracing::info!(phone = %user.phone, "Identity verified");
        Ok(user)
    }
}
