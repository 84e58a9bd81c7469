//! Routing decision logic.
//!
//! Decides, for one well-formed event, whether it is accepted into the fact
//! store or quarantined, given the line's current lifecycle state.

use crate::event::{QuarantineReason, Status};
use crate::logging::structured::LogContext;

/// What a line expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expected {
    /// No open cycle: only START is acceptable.
    #[default]
    AwaitingStart,
    /// A START has been accepted and no STOP yet: ON or STOP are acceptable.
    InProgress,
}

impl Expected {
    pub fn as_str(&self) -> &'static str {
        match self {
            Expected::AwaitingStart => "awaiting_start",
            Expected::InProgress => "in_progress",
        }
    }

    /// Statuses this state would accept.
    pub fn acceptable(&self) -> &'static [Status] {
        match self {
            Expected::AwaitingStart => &[Status::Start],
            Expected::InProgress => &[Status::On, Status::Stop],
        }
    }
}

/// Routing decision for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Accept the event and move the line to the given state.
    Accept(Expected),
    /// Reject the event; the line state is unchanged.
    Quarantine(QuarantineReason),
}

impl RoutingDecision {
    pub fn as_str(&self) -> &str {
        match self {
            RoutingDecision::Accept(_) => "accepted",
            RoutingDecision::Quarantine(_) => "quarantined",
        }
    }
}

/// Determine routing for an event.
///
/// # Decision Table (evaluated in order)
/// 1. Duplicate natural key -> Quarantine("duplicate event")
/// 2. AwaitingStart, status != START -> Quarantine("missing START")
/// 3. AwaitingStart, START -> Accept, InProgress
/// 4. InProgress, START -> Quarantine("duplicate START without STOP")
/// 5. InProgress, ON -> Accept, InProgress
/// 6. InProgress, STOP -> Accept, AwaitingStart
pub fn determine_routing(
    expected: Expected,
    status: Status,
    duplicate_key: bool,
    ctx: &LogContext,
) -> RoutingDecision {
    let decision = if duplicate_key {
        RoutingDecision::Quarantine(QuarantineReason::DuplicateEvent)
    } else {
        match (expected, status) {
            (Expected::AwaitingStart, Status::Start) => RoutingDecision::Accept(Expected::InProgress),
            (Expected::AwaitingStart, _) => RoutingDecision::Quarantine(QuarantineReason::MissingStart),
            (Expected::InProgress, Status::Start) => {
                RoutingDecision::Quarantine(QuarantineReason::DuplicateStartWithoutStop)
            }
            (Expected::InProgress, Status::On) => RoutingDecision::Accept(Expected::InProgress),
            (Expected::InProgress, Status::Stop) => RoutingDecision::Accept(Expected::AwaitingStart),
        }
    };

    log::trace!(
        "{} ROUTING_DECISION expected={} status={} duplicate={} decision={}",
        ctx,
        expected.as_str(),
        status,
        duplicate_key,
        decision.as_str()
    );

    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(expected: Expected, status: Status, dup: bool) -> RoutingDecision {
        determine_routing(expected, status, dup, &LogContext::new("test-run"))
    }

    #[test]
    fn test_start_opens_cycle() {
        assert_eq!(
            route(Expected::AwaitingStart, Status::Start, false),
            RoutingDecision::Accept(Expected::InProgress)
        );
    }

    #[test]
    fn test_missing_start() {
        for status in [Status::On, Status::Stop] {
            assert_eq!(
                route(Expected::AwaitingStart, status, false),
                RoutingDecision::Quarantine(QuarantineReason::MissingStart)
            );
        }
    }

    #[test]
    fn test_in_progress_transitions() {
        assert_eq!(
            route(Expected::InProgress, Status::Start, false),
            RoutingDecision::Quarantine(QuarantineReason::DuplicateStartWithoutStop)
        );
        assert_eq!(
            route(Expected::InProgress, Status::On, false),
            RoutingDecision::Accept(Expected::InProgress)
        );
        assert_eq!(
            route(Expected::InProgress, Status::Stop, false),
            RoutingDecision::Accept(Expected::AwaitingStart)
        );
    }

    #[test]
    fn test_duplicate_checked_first() {
        assert_eq!(
            route(Expected::AwaitingStart, Status::Start, true),
            RoutingDecision::Quarantine(QuarantineReason::DuplicateEvent)
        );
    }

    #[test]
    fn test_acceptable_sets() {
        assert_eq!(Expected::AwaitingStart.acceptable(), &[Status::Start]);
        assert!(Expected::InProgress.acceptable().contains(&Status::Stop));
    }
}
