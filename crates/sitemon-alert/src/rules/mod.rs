pub mod consecutive_failures;
pub mod latency;
pub mod status;

pub use consecutive_failures::ConsecutiveFailureRule;
pub use latency::LatencyRule;
pub use status::StatusRule;
