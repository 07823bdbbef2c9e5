//! HTTP handlers for all web routes.

pub mod page;
pub mod predict;
pub mod download;
pub mod view;
