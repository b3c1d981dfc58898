/// Classification for failure handling.
///
/// Used by the orchestrator to decide what a failed step leads to.
///
/// # Behavior Summary
///
/// | Class | Surfaced to host? | Schedules |
/// |-------|-------------------|-----------|
/// | `WaitForRefresh` | Empty data only | Standard refresh |
/// | `RetryWithBackoff` | After the retry budget is spent | Short retry, then cooldown |
/// | `SurfaceImmediately` | Yes | Standard refresh |
/// | `FallThrough` | No | Continues with the live fetch |
/// | `LogOnly` | No (log record only) | Nothing extra |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The request itself is unusable; wait for the next natural refresh.
    WaitForRefresh,

    /// Transient failure; retry at a fixed interval until the budget is exhausted.
    RetryWithBackoff,

    /// The service answered with a structured error; report it as-is.
    SurfaceImmediately,

    /// Treat as absent data and continue with the next source (live fetch or fallback).
    FallThrough,

    /// Data is present but flagged; log it without failing the fetch.
    LogOnly,
}
