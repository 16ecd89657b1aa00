#![doc = "The `task_manager` library crate."]
#![doc = ""]
#![doc = "Shared code for the two binaries: the auth service (registration, login,"]
#![doc = "token refresh, JSON-RPC token validation) and the task service (per-user task"]
#![doc = "CRUD behind bearer-token authentication)."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod rpc;

pub use crate::error::AppError;
