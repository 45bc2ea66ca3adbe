pub mod admin;
pub mod bookings;
pub mod health;
pub mod messages;
pub mod owners;
pub mod properties;
pub mod users;
