//! JSONL append-only run-log for pipeline lifecycle events.
//!
//! Strictly operational telemetry — run start/end, per-layer status,
//! host-level error codes — never part of a `BuildResult` payload and never
//! itself canonical-JSON-hashed. Carries its own wall-clock timestamps,
//! unlike the payload, which is timestamp-free by design.
pub mod jsonl;
