pub mod advisor;
pub mod api;
pub mod catalog;
pub mod config;
pub mod interests;
pub mod llm;
pub mod models;
pub mod relay;
pub mod roadmap;
pub mod store;
