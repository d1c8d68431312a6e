//! A to-do list backend with paginated listing over an in-memory store.

pub mod app;
pub mod feature;
pub mod infra;
