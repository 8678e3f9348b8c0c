pub mod insert;
pub mod schema_gen;
pub mod sqlite;

pub use insert::*;
pub use schema_gen::{generate_create_table, generate_indexes};
pub use sqlite::{load_sql_files, SqliteLoader};
pub(crate) use insert::ensure_parent;
