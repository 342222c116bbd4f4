//! Core types and services for docx-mcp.
//!
//! `document` models a Word package, `editor` holds the editing operations,
//! `parsers` and `render` move documents in and out of `.docx` and the export
//! formats. `control` composes those with the `SurrealDB` metadata store and
//! the blob store into the operations the API and MCP layers expose.

pub mod control;
pub mod document;
pub mod editor;
pub mod parsers;
pub mod render;
pub mod services;
pub mod store;
