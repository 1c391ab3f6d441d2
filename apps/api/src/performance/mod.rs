// Read-only performance rollup over an employee's objectives plus project
// and feedback data owned by other services. Recomputed on every read.

pub mod handlers;
pub mod metrics;
pub mod source;
