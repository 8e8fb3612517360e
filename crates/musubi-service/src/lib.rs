//! Musubi Service: the circle management workflows.
//!
//! Every service is generic over the repository traits of
//! `musubi-core`, so this crate has no dependency on the database.
//! Mutating operations re-check the caller's role through
//! [`guard::require_role`] on every call.

pub mod activity;
pub mod analytics;
pub mod attendance;
pub mod config;
pub mod error;
pub mod event;
pub mod guard;
pub mod payment;
pub mod profile;
pub mod registry;
pub mod reminder;

pub use analytics::{AnalyticsService, CircleAnalytics, EventAttendanceStat, UnpaidMember};
pub use attendance::{AttendanceService, CheckInOutcome, RecordSummary};
pub use config::{RerecordPolicy, ServiceConfig};
pub use error::ServiceError;
pub use event::{EventInput, EventService};
pub use payment::PaymentService;
pub use profile::{MemberActivity, ProfileService};
pub use registry::{GuestInput, RegistryService};
pub use reminder::{ReminderOutcome, ReminderRequest, ReminderService};
