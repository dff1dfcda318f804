pub mod connection;
pub mod event;
