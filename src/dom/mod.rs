pub mod locator;
pub mod text;

pub use locator::{ElementRef, Locator, LocatorTable, Scope};
pub use text::{normalize_text, xpath_literal};
