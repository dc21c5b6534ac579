//! Text codec for calendar documents.
//!
//! [`render`] writes a whole document from calendar items and [`parse`]
//! reads one back, line by line.

pub mod parse;
pub mod render;

pub use parse::{DocumentParser, ParseOptions, parse_calendar, parse_calendar_with};
pub use render::{DEFAULT_PROD_ID, RenderContext, RenderOptions, render_document};
