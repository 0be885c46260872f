pub mod api;
pub mod websocket;
