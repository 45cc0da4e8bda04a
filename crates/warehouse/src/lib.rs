pub mod db;
pub mod mock;

pub use db::{
    LookupError, LookupResult, PgWarehouse, Warehouse, WarehouseSession,
};
pub use mock::MockWarehouse;
