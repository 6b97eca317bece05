pub mod error;
pub mod limiter;
pub mod metrics;
pub mod orchestrator;
pub mod progress;
pub mod server;
pub mod unit;


pub use error::*;
pub use limiter::{Permit, RateLimiter};
pub use orchestrator::{BatchReport, Orchestrator};
pub use unit::{Ingested, IngestionUnit};
