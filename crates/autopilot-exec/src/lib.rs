pub mod mask;
pub mod quote;
pub mod runner;
pub mod scripted;

pub use mask::mask_secrets;
pub use quote::shell_quote;
pub use runner::{CommandRunner, ShellRunner, EXIT_SPAWN_FAILED, EXIT_TIMED_OUT};
pub use scripted::ScriptedRunner;
