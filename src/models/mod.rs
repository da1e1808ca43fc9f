pub mod enums;
mod defect;
mod library;

pub use defect::*;
pub use library::*;
