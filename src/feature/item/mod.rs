//! To-do items: storage, service and REST API.

pub mod in_memory;
pub mod item_api;
pub mod item_repository;
pub mod item_service;
