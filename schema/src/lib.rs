//! Schema definitions for Beacon
//!
//! This crate contains the data model shared by the attention engine, its
//! storage adapters and the command-line front end. All types here implement
//! JSON Schema generation for external consumption and use camelCase on the
//! wire so that UI clients can consume snapshots directly.

pub mod attention;
pub mod events;
pub mod module;


pub use attention::*;
pub use events::*;
pub use module::ModuleKind;
