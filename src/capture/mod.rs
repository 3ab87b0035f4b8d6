//! Recorded traffic sources.
//!
//! Captures are replayed through the scanner as if the traffic had just been
//! observed. Each recorded exchange becomes an [`ObservedTransaction`] carrying raw
//! request and response bytes.
//!
//! [`ObservedTransaction`]: crate::http::ObservedTransaction

pub mod har;

pub use har::{load_har, parse_har, Capture};
