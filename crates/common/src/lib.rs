pub mod config;
pub mod error;
pub mod firestore;
pub mod types;
