//! Document tree, filter bindings, and domain errors.

pub mod dom;
pub mod errors;
pub mod model;
