pub mod api;
pub mod backend;
pub mod config;
pub mod event;
pub mod feed;
pub mod health;
pub mod ledger;
pub mod logger;
pub mod notification;
pub mod state;
pub mod store;
pub mod trade;
pub mod wallet;

mod commons;
mod tasks;
