pub use castlink_core::model::{Role, RoomCode, SessionId};

pub mod model {
    pub use castlink_core::model::*;
}

#[cfg(feature = "session")]
pub mod session {
    pub use castlink_session::*;
}
