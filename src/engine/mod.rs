pub mod launcher;

pub use launcher::{EngineLauncher, LaunchError, LaunchFuture, ShellLauncher};
