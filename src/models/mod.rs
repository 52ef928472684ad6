mod blocked;
mod booking;
mod location;
mod opening_hours;
mod service;
mod settings;

pub use blocked::BlockedTimeSlot;
pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use location::Location;
pub use opening_hours::{weekday_of, OpeningHoursEntry, TimeOfDay};
pub use service::ServicePrice;
pub use settings::{BookingSettings, BookingSettingsUpdate};
