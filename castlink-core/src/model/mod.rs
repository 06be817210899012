mod mailbox;
mod path;
mod role;
mod room_code;
mod session_id;
mod signaling;

pub use mailbox::{MailboxEntry, decode_mailbox};
pub use path::SignalPath;
pub use role::Role;
pub use room_code::{
    MAX_ROOM_CODE_LEN, MIN_ROOM_CODE_LEN, ROOM_CODE_ALPHABET, RoomCode, RoomCodeError,
};
pub use session_id::SessionId;
pub use signaling::{IceCandidate, IceServerConfig, SdpKind, SessionDescription, SignalMessage};
