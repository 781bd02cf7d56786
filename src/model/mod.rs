//! Data model.
//!
//! - [`db`]: records as stored by the persistence layer.
//! - [`api`]: JSON-friendly request and response bodies.
//! - [`common`]: types shared by both.
//! - [`mongodb`]: MongoDB plumbing.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
