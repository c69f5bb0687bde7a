pub mod traits;
pub mod memory;
pub mod sqlite;
