//! Specify - spec-driven project scaffolding
//!
//! Initializes projects from the spec-kit template releases for an AI
//! assistant, keeps a validated local template cache, and drives the
//! numbered feature workflow (spec, plan, agent context).

pub mod agent;
pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod document;
pub mod environment;
pub mod error;
pub mod feature;
pub mod git;
pub mod project;
pub mod remote;
pub mod template;
pub mod tree;
pub mod ui;

pub use error::{SpecifyError, SpecifyResult};
