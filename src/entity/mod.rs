pub mod audit_logs;
pub mod bookings;
pub mod check_ins;
pub mod customers;
pub mod invoice_items;
pub mod invoices;
pub mod payments;
pub mod room_types;
pub mod rooms;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use bookings::Entity as Bookings;
pub use check_ins::Entity as CheckIns;
pub use customers::Entity as Customers;
pub use invoice_items::Entity as InvoiceItems;
pub use invoices::Entity as Invoices;
pub use payments::Entity as Payments;
pub use room_types::Entity as RoomTypes;
pub use rooms::Entity as Rooms;
pub use users::Entity as Users;
