//! test data shared between the font editing crates.

pub mod bebuffer;
pub mod ttf;

pub use ttf::simple_font;
