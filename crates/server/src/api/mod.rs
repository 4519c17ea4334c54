pub mod handlers;
pub mod processing;
pub mod routes;

pub use routes::create_router;
