//! Terminal styling for roster output.
//!
//! Color is applied only when the terminal supports it; every renderer
//! degrades to the plain string otherwise.

pub mod styles;
pub mod terminal;
