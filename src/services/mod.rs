pub mod bookings;
pub mod email;
pub mod notify;
pub mod pricing;
pub mod scope;
