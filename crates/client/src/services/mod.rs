//! Per-resource services over the shared [`Gateway`](crate::gateway::Gateway).
//!
//! Each service borrows the gateway and maps one backend router. Fallback
//! messages are used when an error response carries no `detail`.

pub mod auth;
pub mod expenses;
pub mod issues;
pub mod projects;
pub mod verification;

pub use auth::AuthService;
pub use expenses::ExpenseService;
pub use issues::IssueService;
pub use projects::ProjectService;
pub use verification::VerificationService;
