/// Join failures reported back to the client as a `room-error` event.
/// The display text is the message the client sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("ERROR: Room not found")]
    RoomNotFound,
    #[error("ERROR: Room is full")]
    RoomFull,
}
