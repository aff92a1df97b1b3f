//! Renderer for logic-less query templates
//!
//! This module takes a compiled template and a render context and produces
//! the query payload text. Output is not validated; malformed JSON surfaces
//! when the backend parses it.

pub mod config;
pub mod context;
pub mod mustache;

pub use config::{EscapeMode, RenderConfig};
pub use context::RenderContext;
pub use mustache::Renderer;
