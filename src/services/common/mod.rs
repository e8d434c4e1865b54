//! Common utilities and abstractions for services

/// Watchable value cells shared between the synchronizer and its readers
pub mod property;

pub use property::Property;
