// Shared types used on both sides of the broker

pub mod id;
pub mod job_message;

pub use id::Id;
pub use job_message::{Job, JobId, JobMessage};
