// State management module
// Handles SQLite persistence and data directory resolution

pub mod db;
pub mod models;
pub mod queries;
pub mod storage;

pub use db::{init_db, init_in_memory, DbConnection, DbError, DbResult};
pub use models::{
    Component, DeleteScope, InsertOutcome, Machine, Movement, MovementFilter, TIMESTAMP_FORMAT,
};
pub use queries::{
    add_component, add_machine, components_at, current_machine, delete_movements,
    get_component, list_components, list_logged_serials, list_machines, list_movements,
    machine_exists, move_component,
};
