pub mod ai_handlers;
pub mod doc;
pub mod ecos_handlers;
pub mod handlers;
pub mod market_handlers;
pub mod routes;
pub mod state;
