use crate::model::role::Role;
use crate::model::room_code::RoomCode;
use std::fmt;

/// Logical location of a value in the shared store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalPath {
    /// Whole subtree of one room.
    Room(RoomCode),
    Offer(RoomCode),
    Answer(RoomCode),
    /// All candidates written by one role.
    Mailbox(RoomCode, Role),
    MailboxEntry(RoomCode, Role, u64),
}

impl fmt::Display for SignalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalPath::Room(code) => write!(f, "rooms/{}", code),
            SignalPath::Offer(code) => write!(f, "rooms/{}/offer", code),
            SignalPath::Answer(code) => write!(f, "rooms/{}/answer", code),
            SignalPath::Mailbox(code, role) => write!(f, "rooms/{}/{}", code, role.mailbox()),
            SignalPath::MailboxEntry(code, role, seq) => {
                write!(f, "rooms/{}/{}/{}", code, role.mailbox(), seq)
            }
        }
    }
}
