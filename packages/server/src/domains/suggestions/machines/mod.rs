//! The suggestion lifecycle state machine.
//!
//! This module is the single authority on which status transitions are
//! legal. Route handlers and sweeps never check statuses themselves; they
//! ask this table. All functions here are pure.
//!
//! Two transitions cascade automatically so a single party action always
//! leaves the suggestion either waiting on the other side or resolved:
//! `FirstPartyApproved` advances to `PendingSecondParty`, and
//! `SecondPartyApproved` advances to `ContactDetailsShared`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "suggestion_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Draft,
    PendingFirstParty,
    FirstPartyApproved,
    FirstPartyDeclined,
    PendingSecondParty,
    SecondPartyApproved,
    SecondPartyDeclined,
    AwaitingMatchmakerApproval,
    ContactDetailsShared,
    AwaitingFirstDateFeedback,
    ThinkingAfterDate,
    ProceedingToSecondDate,
    EndedAfterFirstDate,
    MeetingPending,
    MeetingScheduled,
    MatchApproved,
    MatchDeclined,
    Dating,
    Engaged,
    Married,
    Expired,
    Closed,
    Cancelled,
}

use SuggestionStatus::*;

impl SuggestionStatus {
    pub const ALL: [SuggestionStatus; 23] = [
        Draft,
        PendingFirstParty,
        FirstPartyApproved,
        FirstPartyDeclined,
        PendingSecondParty,
        SecondPartyApproved,
        SecondPartyDeclined,
        AwaitingMatchmakerApproval,
        ContactDetailsShared,
        AwaitingFirstDateFeedback,
        ThinkingAfterDate,
        ProceedingToSecondDate,
        EndedAfterFirstDate,
        MeetingPending,
        MeetingScheduled,
        MatchApproved,
        MatchDeclined,
        Dating,
        Engaged,
        Married,
        Expired,
        Closed,
        Cancelled,
    ];

    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FirstPartyDeclined
                | SecondPartyDeclined
                | EndedAfterFirstDate
                | MatchDeclined
                | Married
                | Expired
                | Closed
                | Cancelled
        )
    }

    /// The automatic follow-up applied right after this status commits.
    pub fn cascade(&self) -> Option<SuggestionStatus> {
        match self {
            FirstPartyApproved => Some(PendingSecondParty),
            SecondPartyApproved => Some(ContactDetailsShared),
            _ => None,
        }
    }

    /// Explicit outgoing edges of the transition table. `Cancelled` and
    /// `Expired` are global edges handled in [`can_transition_to`] and are
    /// not repeated here.
    ///
    /// [`can_transition_to`]: SuggestionStatus::can_transition_to
    pub fn next_statuses(&self) -> &'static [SuggestionStatus] {
        match self {
            Draft => &[PendingFirstParty, AwaitingMatchmakerApproval],
            PendingFirstParty => &[FirstPartyApproved, FirstPartyDeclined],
            FirstPartyApproved => &[PendingSecondParty],
            PendingSecondParty => &[SecondPartyApproved, SecondPartyDeclined],
            SecondPartyApproved => &[ContactDetailsShared],
            AwaitingMatchmakerApproval => &[PendingFirstParty, Closed],
            ContactDetailsShared => &[AwaitingFirstDateFeedback, Closed],
            AwaitingFirstDateFeedback => &[
                ThinkingAfterDate,
                ProceedingToSecondDate,
                EndedAfterFirstDate,
            ],
            ThinkingAfterDate => &[ProceedingToSecondDate, EndedAfterFirstDate, Closed],
            ProceedingToSecondDate => &[Dating, MeetingPending],
            MeetingPending => &[MeetingScheduled, Closed],
            MeetingScheduled => &[MatchApproved, MatchDeclined, Closed],
            MatchApproved => &[Dating, Closed],
            Dating => &[Engaged, MatchDeclined, Closed],
            Engaged => &[Married],
            FirstPartyDeclined | SecondPartyDeclined | EndedAfterFirstDate | MatchDeclined
            | Married | Expired | Closed | Cancelled => &[],
        }
    }

    /// Whether `to` is reachable from this status in one step.
    ///
    /// Any non-terminal status may move to `Cancelled` (administrator
    /// override) or `Expired` (deadline sweep); who may request those is
    /// enforced separately by the transition action.
    pub fn can_transition_to(&self, to: SuggestionStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(to, Cancelled | Expired) {
            return true;
        }
        self.next_statuses().contains(&to)
    }

    /// Contact details become visible exactly when the lifecycle has passed
    /// through `ContactDetailsShared`. Computed from the current status on
    /// every read; never cached.
    pub fn contact_details_visible(&self) -> bool {
        matches!(
            self,
            ContactDetailsShared
                | AwaitingFirstDateFeedback
                | ThinkingAfterDate
                | ProceedingToSecondDate
                | MeetingPending
                | MeetingScheduled
                | MatchApproved
                | Dating
                | Engaged
                | Married
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Draft => "draft",
            PendingFirstParty => "pending_first_party",
            FirstPartyApproved => "first_party_approved",
            FirstPartyDeclined => "first_party_declined",
            PendingSecondParty => "pending_second_party",
            SecondPartyApproved => "second_party_approved",
            SecondPartyDeclined => "second_party_declined",
            AwaitingMatchmakerApproval => "awaiting_matchmaker_approval",
            ContactDetailsShared => "contact_details_shared",
            AwaitingFirstDateFeedback => "awaiting_first_date_feedback",
            ThinkingAfterDate => "thinking_after_date",
            ProceedingToSecondDate => "proceeding_to_second_date",
            EndedAfterFirstDate => "ended_after_first_date",
            MeetingPending => "meeting_pending",
            MeetingScheduled => "meeting_scheduled",
            MatchApproved => "match_approved",
            MatchDeclined => "match_declined",
            Dating => "dating",
            Engaged => "engaged",
            Married => "married",
            Expired => "expired",
            Closed => "closed",
            Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for status in SuggestionStatus::ALL {
            if status.is_terminal() {
                assert!(status.next_statuses().is_empty(), "{status} should be a dead end");
                for to in SuggestionStatus::ALL {
                    assert!(
                        !status.can_transition_to(to),
                        "terminal {status} must reject {to}"
                    );
                }
            }
        }
    }

    #[test]
    fn non_terminal_statuses_accept_cancel_and_expire() {
        for status in SuggestionStatus::ALL {
            if !status.is_terminal() {
                assert!(status.can_transition_to(SuggestionStatus::Cancelled));
                assert!(status.can_transition_to(SuggestionStatus::Expired));
            }
        }
    }

    #[test]
    fn every_status_is_reachable_from_draft() {
        let mut seen = HashSet::new();
        let mut queue = vec![SuggestionStatus::Draft];
        while let Some(status) = queue.pop() {
            if !seen.insert(status) {
                continue;
            }
            for &next in status.next_statuses() {
                queue.push(next);
            }
            if !status.is_terminal() {
                queue.push(SuggestionStatus::Cancelled);
                queue.push(SuggestionStatus::Expired);
            }
        }
        for status in SuggestionStatus::ALL {
            assert!(seen.contains(&status), "{status} is unreachable from draft");
        }
    }

    #[test]
    fn cascades_target_legal_edges() {
        for status in SuggestionStatus::ALL {
            if let Some(next) = status.cascade() {
                assert!(
                    status.can_transition_to(next),
                    "cascade {status} -> {next} must be in the table"
                );
            }
        }
    }

    #[test]
    fn approval_cascades() {
        assert_eq!(
            SuggestionStatus::FirstPartyApproved.cascade(),
            Some(SuggestionStatus::PendingSecondParty)
        );
        assert_eq!(
            SuggestionStatus::SecondPartyApproved.cascade(),
            Some(SuggestionStatus::ContactDetailsShared)
        );
        assert_eq!(SuggestionStatus::ContactDetailsShared.cascade(), None);
    }

    #[test]
    fn contact_details_gate() {
        assert!(!SuggestionStatus::PendingSecondParty.contact_details_visible());
        assert!(!SuggestionStatus::SecondPartyApproved.contact_details_visible());
        assert!(SuggestionStatus::ContactDetailsShared.contact_details_visible());
        assert!(SuggestionStatus::Dating.contact_details_visible());
        assert!(!SuggestionStatus::FirstPartyDeclined.contact_details_visible());
    }

    #[test]
    fn declined_statuses_do_not_cascade() {
        assert_eq!(SuggestionStatus::FirstPartyDeclined.cascade(), None);
        assert_eq!(SuggestionStatus::SecondPartyDeclined.cascade(), None);
    }
}
