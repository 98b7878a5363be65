//! View models
//!
//! Pure functions from store data to serializable screens. Markup is left
//! to whatever front-end consumes the API.
//!
//! - **calendar**: month grid and day agenda
//! - **timeline**: provider day/week grid and quick-book
//! - **dashboard**: daily counts, revenue, provider load
//! - **queue**: waiting room ordered by priority

pub mod calendar;
pub mod dashboard;
pub mod queue;
pub mod timeline;

pub use calendar::{build_agenda, build_month, AgendaItem, CalendarDay, CalendarMonth, DayAgenda};
pub use dashboard::{build_dashboard, DashboardView, ProviderLoad, StatusCount, UpcomingItem};
pub use queue::{build_queue, QueueEntry, QueueView};
pub use timeline::{
    build_timeline, quick_book, week_start, QuickBook, TimelineBlock, TimelineColumn,
    TimelineSettings, TimelineSlot, TimelineView,
};
