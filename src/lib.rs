// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Template pipeline
pub mod batch;
pub mod functions;
pub mod store;
pub mod template;
pub mod transform;

// Application layer
pub mod api;
pub mod server;
