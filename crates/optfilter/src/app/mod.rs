//! Application layer: binding discovery, filtering, and page orchestration.

pub mod binding;
pub mod events;
pub mod filter;
pub mod page;
pub mod report;
pub mod session;
