pub mod clock;
pub mod lenient;
pub mod types;
