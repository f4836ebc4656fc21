//! # Built-in subscribers
//!
//! - [`LogWriter`]: logs each delivered event (demo/debug).

mod log;

pub use log::LogWriter;
