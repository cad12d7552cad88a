pub mod manager;
pub mod route;
pub mod schema;
