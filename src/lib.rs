// * Scrape Registry
// * Dynamic configuration registry for a metrics-scraping engine: callers register
// * scrape targets and alert rules over HTTP, the registry renders them into the
// * engine's config, persists it and triggers a hot reload.

pub mod config;
pub mod engine;
pub mod network;
pub mod ops;
pub mod persistence;
pub mod registry;
pub mod render;
pub mod server;
