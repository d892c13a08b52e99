pub mod catalog;
mod curriculum;
mod identity;

pub use curriculum::*;
pub use identity::*;
