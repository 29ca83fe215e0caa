//! HKids HTTP API Service.
//!
//! This crate provides the HTTP API for the HKids e-book platform,
//! including:
//!
//! - Authentication (registration, login, JWT issuance)
//! - Book management and the two-phase page-ingestion write path
//! - Category management
//! - Parental controls (kid profiles, category approvals)
//! - Static serving of uploaded covers and pages
//!
//! # Book ingestion
//!
//! `POST /api/books` commits the book row and answers `201` before any page
//! rows exist; supplied page files are handed to an in-process
//! [`ingest::IngestQueue`] whose worker batch-inserts them afterwards. A
//! failed batch is logged and never surfaced to the original caller.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod routes;
pub mod state;
pub mod upload;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use ingest::IngestQueue;
pub use routes::create_router;
pub use state::AppState;
