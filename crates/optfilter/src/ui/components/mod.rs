//! Collection of reusable TUI components.

pub mod filter_input;
pub mod option_list;
pub mod summary;
