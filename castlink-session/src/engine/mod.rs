mod engine_config;
mod engine_event;
mod peer_engine;
mod webrtc_engine;

pub use engine_config::*;
pub use engine_event::*;
pub use peer_engine::*;
pub use webrtc_engine::*;
