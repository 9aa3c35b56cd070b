//! Sesli gateway — WebSocket duplex channel and one-shot HTTP endpoint
//! over the streaming turn pipeline.

pub mod connection;
pub mod handlers;
pub mod server;
pub mod state;
pub mod turn;

pub use state::GatewayState;
pub use turn::TurnCoordinator;
