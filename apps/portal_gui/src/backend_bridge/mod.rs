//! Bridge between the UI thread and the backend worker that owns the dashboard.

pub mod commands;
pub mod runtime;
