pub mod command;
pub mod docker;
pub mod executor;
pub mod host;

pub use command::{Cmd, CommandError};
pub use docker::{CheckResult, DockerClient, DockerError, DoctorReport};
pub use executor::{CommandExecutor, RealExecutor};
pub use host::HostToolchain;
