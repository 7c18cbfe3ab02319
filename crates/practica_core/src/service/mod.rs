//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and directory calls into use-case level APIs.
//! - Keep the administrative surface decoupled from storage details.

pub mod content_service;
pub mod person_service;
