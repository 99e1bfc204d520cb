pub mod ai_ticket;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod shortcut_info;

pub use routes::create_router;
