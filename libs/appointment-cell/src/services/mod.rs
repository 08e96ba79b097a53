pub mod booking;
pub mod conflict;
pub mod lifecycle;

pub use booking::AppointmentScheduler;
pub use conflict::SlotLocks;
pub use lifecycle::AppointmentLifecycleService;
