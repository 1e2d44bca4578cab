//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `Serialize` model struct that is always valid once built
//! - A lenient `Deserialize` payload struct (`*Payload`) matching the wire
//!   shape, turned into the model via `TryFrom`
//! - `Serialize` request DTOs for creates and partial updates

/// Defines a string-valued wire enum with case-insensitive parsing.
///
/// Extra attributes pass through, so a default variant is declared with
/// `#[derive(Default)]` on the enum and `#[default]` on the variant.
macro_rules! define_wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The exact string the backend uses for this variant.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }

            /// Match a wire string, ignoring ASCII case and surrounding whitespace.
            pub fn from_wire(raw: &str) -> Option<Self> {
                let raw = raw.trim();
                $(
                    if raw.eq_ignore_ascii_case($wire) {
                        return Some($name::$variant);
                    }
                )+
                None
            }

            /// Parse a wire string, reporting unknown values against `entity.field`.
            pub fn parse(
                entity: &'static str,
                field: &'static str,
                raw: &str,
            ) -> Result<Self, $crate::error::CoreError> {
                Self::from_wire(raw).ok_or_else(|| {
                    $crate::error::CoreError::invalid(entity, field, format!("unknown value '{raw}'"))
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod citizenship;
pub mod expenditure;
pub mod issue;
pub mod milestone;
pub mod project;
pub mod user;

pub use citizenship::{
    Citizenship, CitizenshipPayload, CitizenshipStatus, DocumentUpload, PendingCitizenship,
    PendingCitizenshipPayload, UploadReceipt,
};
pub use expenditure::{Expenditure, ExpenditurePayload, NewExpenditure};
pub use issue::{Issue, IssuePayload, IssueStatus, IssueStatusUpdate, NewIssue};
pub use milestone::{Milestone, MilestonePayload, MilestoneUpdate, NewMilestone};
pub use project::{
    CreateProjectRequest, DeletionReceipt, NewProject, Project, ProjectPayload, ProjectStatus,
    ProjectType, ProjectUpdate,
};
pub use user::{
    Credentials, RegisterRequest, TokenResponse, User, UserCitizenship, UserPayload, UserPublic,
    UserPublicPayload,
};

/// Parse an optional wire enum, falling back to the type's default when the
/// value is absent or blank.
fn enum_or_default<T: Default>(
    raw: Option<String>,
    parse: impl FnOnce(&str) -> Result<T, crate::error::CoreError>,
) -> Result<T, crate::error::CoreError> {
    match raw.filter(|value| !value.trim().is_empty()) {
        None => Ok(T::default()),
        Some(raw) => parse(&raw),
    }
}
