//! Predicates used by the engine and the media converter to decide between
//! the direct path and the clone path.

use crate::model::{MediaDescriptor, Message, Peer};

/// True when the source peer forbids server-side forwarding with
/// attribution.
pub fn source_protected(from: &Peer) -> bool {
    from.noforwards()
}

/// True when the message itself carries the content-protection flag.
pub fn message_protected(msg: &Message) -> bool {
    msg.noforwards()
}

/// True when either the source peer or the message is protected.
pub fn is_protected(from: &Peer, msg: &Message) -> bool {
    source_protected(from) || message_protected(msg)
}

/// True when the media is a photo or a document — the only kinds the
/// converter can re-upload under clone.
pub fn is_photo_or_document(media: &MediaDescriptor) -> bool {
    media.is_photo() || media.is_document()
}
