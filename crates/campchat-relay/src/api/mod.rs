pub mod chat;
pub mod health;
pub mod state;

pub use state::RelayState;
