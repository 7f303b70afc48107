pub mod audit_logs;
pub mod bookings;
pub mod categories;
pub mod events;
pub mod reviews;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use bookings::Entity as Bookings;
pub use categories::Entity as Categories;
pub use events::Entity as Events;
pub use reviews::Entity as Reviews;
pub use users::Entity as Users;
