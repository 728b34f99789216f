// src/controller/routing.rs - Request-code to dispatcher mapping
use std::ops::RangeInclusive;

/// The three handler groups panel requests fan out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchGroup {
    /// Read-only queries (A0-A8, A33).
    Info,
    /// One-shot actions (A9-A28).
    Action,
    /// Stateful multi-step operations (A29-A36).
    Process,
}

/// Code ranges are a hard contract with the panel firmware and must not be
/// renumbered. Kept as one table so the partition stays checkable in one
/// place instead of scattered range tests.
const ROUTES: &[(RangeInclusive<u8>, DispatchGroup)] = &[
    (0..=8, DispatchGroup::Info),
    (33..=33, DispatchGroup::Info),
    (9..=28, DispatchGroup::Action),
    (29..=32, DispatchGroup::Process),
    (34..=36, DispatchGroup::Process),
];

/// Route a request code to its handler group. `None` means the request gets
/// the empty acknowledgement.
pub fn route(code: u8) -> Option<DispatchGroup> {
    ROUTES
        .iter()
        .find(|(range, _)| range.contains(&code))
        .map(|(_, group)| *group)
}
