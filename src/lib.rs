pub mod bet;
pub mod client;
pub mod controller;
pub mod http_service;
pub mod in_memory_service;
pub mod service;
pub mod ui;
pub mod validation;
pub mod view;

pub mod test_helpers;
