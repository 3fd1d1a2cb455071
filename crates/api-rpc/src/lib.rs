//! JSON-RPC API Layer
//!
//! Exposes auction creation and lookup over JSON-RPC 2.0 for the Gavel daemon.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
