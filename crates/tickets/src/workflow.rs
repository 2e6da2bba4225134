//! Ticket status transitions.

use spk_database::TicketStatus;

/// Statuses reachable from `from`.
pub fn allowed_transitions(from: TicketStatus) -> &'static [TicketStatus] {
    use TicketStatus::*;
    match from {
        Open => &[InProgress, Resolved, Closed],
        InProgress => &[Open, Resolved, Closed],
        Resolved => &[Closed, Open],
        Closed => &[Open],
    }
}

pub fn can_transition(from: TicketStatus, to: TicketStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use TicketStatus::*;

    #[test]
    fn transition_table() {
        let expected = [
            (Open, InProgress, true),
            (Open, Resolved, true),
            (Open, Closed, true),
            (InProgress, Open, true),
            (InProgress, Resolved, true),
            (InProgress, Closed, true),
            (Resolved, Closed, true),
            (Resolved, Open, true),
            (Resolved, InProgress, false),
            (Closed, Open, true),
            (Closed, InProgress, false),
            (Closed, Resolved, false),
        ];
        for (from, to, allowed) in expected {
            assert_eq!(can_transition(from, to), allowed, "{from:?} -> {to:?}");
        }
        for status in TicketStatus::ALL {
            assert!(!can_transition(status, status), "{status:?} -> itself");
        }
    }
}
