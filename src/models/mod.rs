pub mod admin;
pub mod lead;
mod lenient;
pub mod visit;
