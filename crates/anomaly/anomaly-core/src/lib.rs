//! Anomaly Detection Core
//!
//! Rolling z-score detection over an unbounded stream, plus the monitor,
//! sinks and synthetic sources that surround it.

mod alerting;
mod detector;
mod monitoring;
mod rolling;
mod sinks;
mod source;

pub use alerting::*;
pub use detector::*;
pub use monitoring::*;
pub use rolling::*;
pub use sinks::*;
pub use source::*;
