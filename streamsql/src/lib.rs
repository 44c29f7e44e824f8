pub mod connector;
pub mod consumer;
pub mod env;
pub mod error;
pub mod event;
pub mod kafka;
pub mod sink;
pub mod source;
