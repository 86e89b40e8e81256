//! Refresh orchestrator: single-writer async runtime and event stream.

/// Event stream payloads emitted by the runtime.
pub mod events;
/// Handle, command loop, and refresh scheduling.
pub mod handle;
