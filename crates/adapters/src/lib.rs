pub mod driver;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use driver::{DriverBackend, DriverConnection};
