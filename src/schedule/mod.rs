//! Scheduling logic
//!
//! Pure functions over appointment lists:
//!
//! - **priority**: urgency score for the waiting queue
//! - **filter**: month/day/status/provider/text filtering with ranking
//! - **conflict**: provider and room double-booking checks

pub mod conflict;
pub mod filter;
pub mod priority;

pub use conflict::{detect_conflicts, Conflict, ConflictCandidate, ConflictKind};
pub use filter::{filter_and_rank, filter_appointments, AppointmentFilter, YearMonth};
pub use priority::{
    breakdown, has_urgent_keyword, priority_score, rank, score, PriorityBreakdown,
    ScoredAppointment, URGENT_KEYWORDS,
};
