//! Local SQLite key-value store for client-side preferences
//! (`style.<view_type>`, `smart_cap`, keybinding overrides).

mod preferences;
mod schema;
mod types;

pub use schema::Database;
pub use types::DatabaseError;
