// * Persistence of the rendered config artifact
// * The filesystem is treated as a store for exactly one named blob

pub mod store;

pub use store::{ConfigStore, FileConfigStore, InMemoryConfigStore, PersistError, PersistResult};
