//! Middleware modules

pub mod logger;
pub mod recover;
pub mod request_id;
