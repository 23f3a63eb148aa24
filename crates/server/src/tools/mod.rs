//! MCP tool implementations.
//!
//! This module contains all tools exposed by the pgcache server.

pub mod cache;
