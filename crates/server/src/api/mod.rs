pub mod audit;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod slates;

pub use routes::create_router;
