//! Shared test utilities for the page sync workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`site`]: [`TestSite`] builder for a throwaway site directory

pub mod site;

pub use site::TestSite;
