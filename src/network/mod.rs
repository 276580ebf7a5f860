pub mod errors;
pub mod reload;

pub use errors::ReloadError;
pub use reload::{HttpReloader, ReloadFuture, ReloadResult, Reloader};
