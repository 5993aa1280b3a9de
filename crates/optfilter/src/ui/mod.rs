//! Interactive terminal UI.

pub mod app;
pub mod components;
