//! Editing session orchestration.
//!
//! The controller loads a document, reconciles it against the local draft,
//! and drives autosave, save and discard for the rest of the session.

pub mod controller;
pub mod observer;
