//! Safe SQL builder: identifiers syntax-checked and quoted, values as parameters.

mod builder;
pub mod ident;
pub mod logic;
pub mod params;
pub use builder::*;
pub use ident::check_identifier;
pub use logic::*;
pub use params::*;
