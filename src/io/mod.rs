//! Thread export (§6, §9A): `thread.export(thread_id)` implemented at the
//! orchestrator/storage level, independent of the out-of-scope HTTP
//! endpoint that would expose it.

pub mod services;

pub use services::export::ThreadExport;
