pub mod context;
pub mod orchestrator;
pub mod outcome;
pub mod types;

pub use context::PipelineRun;
pub use orchestrator::Pipeline;
pub use outcome::{PipelineOutcome, PipelineReport};

#[cfg(test)]
mod tests;
