//! Hamro Ward domain layer.
//!
//! Plain data types mirroring the backend DTOs, the fallible parsing step
//! that turns lenient wire payloads into always-valid models, and the
//! client-side validation rules applied before any request is sent.

pub mod error;
pub mod models;
pub mod normalize;
pub mod types;
pub mod validation;
