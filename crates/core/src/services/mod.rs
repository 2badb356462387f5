pub mod analysis;
pub mod cache;
pub mod output;
pub mod tools;
