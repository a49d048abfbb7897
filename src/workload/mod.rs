//! Process-backed collaborators: compile the C workloads and run them

mod build;
mod process;
mod results;

pub use build::GccBuilder;
pub use process::ProcessRunner;
