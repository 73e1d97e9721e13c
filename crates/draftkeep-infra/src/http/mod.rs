//! HTTP adapters for the authoring backend.

pub mod backend;
