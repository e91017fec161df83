//! Display composition and the terminal preview.
//!
//! - [`compose`]: pure mapping from a status view to display lines
//! - [`export`]: JSON export of the composed screen
//! - [`panel`]: ratatui rendering of the panel preview
//! - [`common`]: header, status bar and help overlay
//! - [`theme`]: preview colours

pub mod common;
pub mod compose;
pub mod export;
pub mod panel;
pub mod theme;

pub use compose::{compose, fit, GaugeRange, LineLayout, Screen, StatusLine};
pub use export::export_screen;
pub use theme::Theme;
