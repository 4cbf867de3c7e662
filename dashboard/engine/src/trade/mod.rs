pub mod contract;
pub mod history;
pub mod order;
pub mod position;
