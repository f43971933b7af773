//! Try-on generation workflow.
//!
//! Sequences image-processing jobs into the full try-on pipeline: pull the
//! garment from S3 and generate a model image in parallel, then derive a
//! mask, render the try-on, and push the result back to S3. Each step
//! carries its own retry policy, layered above the job client's per-request
//! attempt budget.

pub mod config;
pub mod error;
pub mod run;
pub mod steps;

pub use config::FlowConfig;
pub use error::{FlowError, FlowResult};
pub use run::{run, FlowRequest};
