pub mod auth_service;
pub mod booking_service;
pub mod customer_service;
pub mod identifier_service;
pub mod invoice_service;
pub mod mapping;
pub mod room_service;
