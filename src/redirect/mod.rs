pub mod handlers;
pub mod resolver;
pub mod routes;

pub use resolver::{RedirectResolver, Resolution};
pub use routes::create_redirect_router;
