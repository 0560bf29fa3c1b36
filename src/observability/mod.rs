//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! engine, gateway, session, mint:
//!     → logging.rs (tracing subscriber, env filter)
//!     → metrics.rs (counters and gauges via the `metrics` facade)
//! ```
//!
//! # Design Decisions
//! - Log level comes from config, `RUST_LOG` overrides it
//! - Metrics go through the facade; with no recorder installed they are no-ops

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
