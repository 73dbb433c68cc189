//! Transport-agnostic domain types.

mod key;
mod metric;

pub use key::{ConnectionKey, Credentials, TlsSettings};
pub use metric::{MetricKind, MetricRecord};
