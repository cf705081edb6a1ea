//! Live validation of MCP candidates: install, spawn, speak MCP, probe tools.
//!
//! `collect()` provisions a scratch install directory, installs the
//! candidate, spawns it, speaks MCP over stdio, probes its tools, and tears
//! everything down on every exit path — success, error, or cancellation.

mod collector;
mod mcp_client;
mod process;
mod protocol;
mod scratch;

pub use collector::{classify_health, collect, CollectorConfig};
pub use mcp_client::{McpClient, McpClientError};
pub use scratch::ScratchDir;
