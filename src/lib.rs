pub mod config;
pub mod context;
pub mod db;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;
pub mod transport;

#[cfg(test)]
pub(crate) mod testutil;
