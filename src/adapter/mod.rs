//! Concrete implementations of the device port.
//!
//! - [`tcp`] - TCP reachability connector used by the binary

pub mod tcp;

pub use tcp::TcpConnector;
