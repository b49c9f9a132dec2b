pub mod clipping;
pub mod location;

pub use clipping::*;
pub use location::*;
