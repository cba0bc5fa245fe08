//! Observability: structured logging setup.
//!
//! The library only emits `tracing` events and `metrics` samples. Hosts
//! that want them printed call [`init_logging`] once; hosts that want
//! metrics exported install a `metrics` recorder of their choice.
//!
//! | Metric | Kind | Labels |
//! |--------|------|--------|
//! | `annstore_operations_total` | counter | `operation`, `status` |
//! | `annstore_operation_duration_ms` | histogram | `operation` |
//! | `annstore_documents_added_total` | counter | |
//! | `annstore_documents_deduplicated_total` | counter | |

mod logging;

pub use logging::{LogFormat, LoggingConfig, init_logging};
