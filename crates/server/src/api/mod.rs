pub mod audit;
pub mod handlers;
pub mod middleware;
pub mod notices;
pub mod orders;
pub mod routes;
pub mod settings;

pub use routes::create_router;
