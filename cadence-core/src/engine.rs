use std::time::Instant;

/// The interface for any embedded engine driven by the run loop.
///
/// The loop calls `process_messages` exactly once per iteration, after the
/// native messages for that iteration have been drained. The returned instant
/// is when the engine next wants to run, even if no input arrives before then.
/// Returning an instant in the past asks for another call as soon as possible.
pub trait Engine {
    fn process_messages(&mut self) -> Instant;
}

/// Closures make convenient one-off engines (tests, glue code).
impl<F> Engine for F
where
    F: FnMut() -> Instant,
{
    fn process_messages(&mut self) -> Instant {
        self()
    }
}
