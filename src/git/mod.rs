// Git module wrapping the version-control operations of a run

mod driver;
mod fake;
mod runner;

pub use driver::RepositoryDriver;
pub use fake::{FakeCommit, FakeGit};
pub use runner::{CommandOutput, GitRunner, ProcessRunner};
