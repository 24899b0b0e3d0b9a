//! # Inkshelf Bot
//!
//! The capture side of inkshelf: photograph a book's first page, let the
//! recognition collaborator extract a bibliographic card, confirm it, and
//! the record lands in the tenant datastore selected by your access key.
//!
//! ## Module Organization
//!
//! - `config`: Environment-driven configuration
//! - `error`: Workflow error taxonomy and user-message mapping
//! - `workflow`: The capture state machine (bind, stage, confirm)
//! - `commands`: Command grammar for the transport surface
//! - `dispatch`: Command-to-workflow routing and reply rendering
//! - `adapters`: Recognition collaborator (HTTP provider, mock)
//! - `transport`: Console transport loop

pub mod adapters;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod transport;
pub mod workflow;
