/// Classification for failure handling.
///
/// Used to determine how the cache should respond to errors from the backend.
///
/// # Behavior Summary
///
/// | Class | Update path | Fetch path |
/// |-------|-------------|------------|
/// | `FeatureUnavailable` | Optimistic local merge | Try fallback endpoint |
/// | `Transient` | Propagate to caller | Serve defaults, enter backoff |
/// | `Fatal` | Propagate to caller | Serve defaults, enter backoff |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureClass {
    /// The endpoint or record does not exist on this backend deployment.
    ///
    /// Updates degrade gracefully: the partial record is shallow-merged into
    /// the current (or default) cached value and persisted locally, so the
    /// UI keeps working until the backend feature ships.
    FeatureUnavailable,

    /// Connectivity problems, timeouts, rate limiting, 5xx responses.
    ///
    /// Reads recover silently (defaults plus a backoff window); writes are
    /// surfaced so the caller can retry deliberately.
    Transient,

    /// Validation failures, auth failures, undecodable payloads.
    ///
    /// Retrying won't help and silently absorbing the error would hide a
    /// real problem, so writes propagate it to the caller.
    Fatal,
}
