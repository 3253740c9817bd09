//! answercheck-core — Answer grading engine, ordering policy, and recheck driver.
//!
//! This crate holds the pure grading logic that compares a learner's answer
//! against an answer key, plus the store traits and batch driver used to
//! regrade stored submissions.

pub mod engine;
pub mod error;
pub mod grader;
pub mod model;
pub mod numeric;
pub mod parser;
pub mod policy;
pub mod report;
pub mod statistics;
pub mod text;
pub mod traits;
pub mod variants;

pub use grader::{grade, Grader, GraderConfig};
pub use model::{GradingRequest, GradingResult, PointValue, Subject};
pub use policy::OrderingPolicy;
