//! MCP tool modules.
//!
//! Tools are grouped by area: document records and templates, the editing
//! groups (text, tables, lists, styles, media, layout, navigation), review
//! (comments, versions, revisions), batches, export, and contextual help.

pub mod batch;
pub mod comments;
pub mod documents;
pub mod export;
pub mod layout;
pub mod lists;
pub mod media;
pub mod navigation;
pub mod revisions;
pub mod styles;
pub mod tables;
pub mod text;
pub mod versions;
mod context;
