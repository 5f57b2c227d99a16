//! Networking modules for the REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` performs HTTP calls and owns 401 handling; `types` defines the
//! auth wire schema.

pub mod api;
pub mod types;
