pub mod countries;
pub mod customer_updates;
pub mod job;
pub mod schema;
pub mod status;
