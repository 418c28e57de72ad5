pub mod auth;
pub mod bookings;
pub mod customers;
pub mod invoices;
pub mod rooms;
