//! Citizenship document models.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::enum_or_default;
use crate::normalize::require_text;
use crate::types::CitizenshipId;
use crate::validation::validate_document;

const ENTITY: &str = "citizenship";

define_wire_enum! {
    /// Review state of an uploaded citizenship document.
    #[derive(Default)]
    CitizenshipStatus {
        #[default]
        Pending = "pending",
        Approved = "approved",
        Rejected = "rejected",
    }
}

/// An uploaded citizenship document awaiting or past admin review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citizenship {
    pub id: Option<CitizenshipId>,
    pub phone: String,
    /// Server-side storage path of the uploaded image.
    pub path: String,
    pub status: CitizenshipStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CitizenshipPayload {
    pub id: Option<CitizenshipId>,
    pub phone: Option<String>,
    pub path: Option<String>,
    pub status: Option<String>,
}

impl TryFrom<CitizenshipPayload> for Citizenship {
    type Error = CoreError;

    fn try_from(payload: CitizenshipPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            id: payload.id,
            phone: require_text(ENTITY, "phone", payload.phone)?,
            path: require_text(ENTITY, "path", payload.path)?,
            status: enum_or_default(payload.status, |raw| {
                CitizenshipStatus::parse(ENTITY, "status", raw)
            })?,
        })
    }
}

/// Head of the admin review queue: the next unverified document, with the
/// image inlined as base64 text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingCitizenship {
    pub id: CitizenshipId,
    pub phone: String,
    pub image_data: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PendingCitizenshipPayload {
    pub id: Option<CitizenshipId>,
    pub phone: Option<String>,
    pub image_data: Option<String>,
}

impl TryFrom<PendingCitizenshipPayload> for PendingCitizenship {
    type Error = CoreError;

    fn try_from(payload: PendingCitizenshipPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            id: payload.id.ok_or_else(|| CoreError::missing(ENTITY, "id"))?,
            phone: require_text(ENTITY, "phone", payload.phone)?,
            image_data: payload.image_data.unwrap_or_default(),
        })
    }
}

/// Server acknowledgement of a document upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub filename: String,
    pub saved_to: String,
}

/// A document image picked by the user, ready for multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpload {
    pub filename: String,
    /// MIME type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Check filename, MIME type and size before anything is sent.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.filename.trim().is_empty() {
            return Err(CoreError::Validation("Invalid filename".to_string()));
        }
        validate_document(&self.content_type, self.bytes.len())
    }
}
