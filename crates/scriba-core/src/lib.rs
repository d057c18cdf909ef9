//! # Scriba Core - Tool Invocation Contract
//!
//! Shared contract between the host orchestrator and the tools it dispatches.
//! A tool exposes a stable name and description for discovery, an async
//! `execute` taking a JSON input mapping, and always answers with a structured
//! [`ToolResult`] envelope - a raw fault never crosses this boundary.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolFailure, ToolResult};
