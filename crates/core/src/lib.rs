//! Domain rules for the movie catalog.
//!
//! No I/O lives here: error kinds, field limits, SID generation, the search
//! filter vocabulary and the page envelope are shared by the store layer
//! and the HTTP boundary.

pub mod error;
pub mod movie;
pub mod page;
pub mod search;
pub mod types;
