pub mod cli;
pub mod data;
pub mod model;
pub mod planner;
pub mod routing;
pub mod server;
pub mod store;
