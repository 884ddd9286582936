//! Utilities Module - shared helpers
//!
//! - `html`: HTML escaping for error blocks and fixture markup

mod html;

pub use html::escape_html;
