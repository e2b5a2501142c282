//! Durable persistence — libSQL backend for profiles and conversations.

pub mod libsql_backend;

pub use libsql_backend::LibSqlBackend;
