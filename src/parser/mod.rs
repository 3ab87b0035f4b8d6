//! Package name extraction from response bodies.
//!
//! Bundles, source maps and stack traces served to clients often keep the build
//! machine's `node_modules/<name>/...` paths. The extractor pulls those names out so
//! they can be checked against the public registry.

pub mod node_modules;

pub use node_modules::{extract_module_names, NODE_MODULES_MARKER};
