pub mod client;
pub mod models;

pub(crate) mod realtime;
