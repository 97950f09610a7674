//! Tracing setup. The filter can be swapped at runtime once settings are known.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
