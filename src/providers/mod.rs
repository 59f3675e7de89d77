//! Frame provider implementations

pub mod link;

pub use link::LinkProvider;
