//! Persistence layer
//!
//! SQLite storage for the three entities the companion owns:
//! users, vital readings, and the alerts raised for abnormal readings.
//!
//! # Example
//!
//! ```rust,no_run
//! use health_companion::storage::{Database, NewUser, NewVital, Role};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open("companion.db")?;
//!     let user = db.create_user(NewUser {
//!         username: "grandpa_joe".to_string(),
//!         password_hash: "...".to_string(),
//!         role: Role::Elderly,
//!         full_name: "Joe Smith".to_string(),
//!     })?;
//!
//!     db.record_vital(user.id, NewVital::new("heart_rate", 72.0, "bpm"), None)?;
//!     let recent = db.recent_vitals(user.id, 50)?;
//!     println!("{} readings", recent.len());
//!     Ok(())
//! }
//! ```

mod database;
mod error;
mod types;

pub use database::Database;
pub use error::{StorageError, StorageResult};
pub use types::{Alert, NewAlert, NewUser, NewVital, Role, Severity, User, Vital};
