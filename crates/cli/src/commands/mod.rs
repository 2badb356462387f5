pub mod analyze;
pub mod stats;
pub mod tools;
pub mod util;

pub use analyze::*;
pub use stats::*;
pub use tools::*;
