//! pswitch core: swap a package dependency for its source project and back.
//!
//! This crate holds the dependency graph model, the condition-marker switch
//! and restore engine, and the solution membership updates driven through
//! `dotnet sln`.

pub mod config;
pub mod dotnet;
pub mod error;
pub mod graph;
pub mod membership;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod process;
pub mod switch;
pub mod text_file;

pub use error::{Result, SwitchError};
