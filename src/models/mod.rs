pub mod admin;
pub mod booking;
pub mod owner;
pub mod property;
pub mod user;

pub use admin::Admin;
pub use booking::{Booking, BookingSource, BookingStatus, BookingWithUser, ShiftType};
pub use owner::Owner;
pub use property::{Property, PropertyPricing, PropertyType, ShiftPrice};
pub use user::User;
