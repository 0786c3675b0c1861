//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate entity and repository calls into use-case level APIs.
//! - Keep console/HTTP layers decoupled from storage details.

pub mod catalog_service;
pub mod response;
