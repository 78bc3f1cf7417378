//! Route compilation and matching for the Gatehouse routing layer.
//!
//! Two pieces: [`PathPattern`] compiles `{name}` patterns into
//! parameter-extracting matchers with correct escaping of literal
//! regex metacharacters, and [`RouteTable`] holds the ordered compiled
//! routes for a contract, distinguishing not-found from
//! method-not-allowed at resolution time.

pub mod pattern;
pub mod table;

pub use pattern::{PathPattern, PatternError};
pub use table::{CompiledRoute, RouteResolution, RouteTable};
