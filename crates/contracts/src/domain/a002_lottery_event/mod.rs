pub mod aggregate;
pub mod levels;

pub use aggregate::*;
pub use levels::*;
