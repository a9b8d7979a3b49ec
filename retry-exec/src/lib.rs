//! Retry execution core for idempotent remote operations.
//!
//! [`RetryExecutor`] invokes a caller-supplied async operation, classifies
//! each produced outcome with a predicate, and re-invokes per a
//! [`RetryPolicy`] until the predicate reports success, a fixed schedule is
//! exhausted, or the execution is cancelled. The operation must be safe to
//! invoke more than once; the core assumes idempotency but cannot enforce it.
//!
//! Outcomes and errors are distinct here: an operation that *produces* a
//! failing outcome (say an HTTP 500 response) is retried, while an operation
//! that fails to produce anything at all (a connect error) propagates
//! immediately without retry.

mod executor;
mod policy;

pub use executor::*;
pub use policy::*;
