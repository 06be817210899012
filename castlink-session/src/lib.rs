mod config;
mod coordinator;
mod engine;
mod error;
pub mod logging;
mod media;
mod store;
mod supervisor;

pub use config::*;
pub use coordinator::*;
pub use engine::*;
pub use error::*;
pub use media::*;
pub use store::*;
pub use supervisor::*;
