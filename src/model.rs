//! Job and data model: `Peer`, `Message`, media descriptors, `Elem`, `Mode`.
//!
//! These types are the engine's view of the outside world. A real deployment
//! fills them in from a `grammers`-shaped client; the stub session in
//! [`crate::stub`] fills them in from an in-memory table for demos and tests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of chat a [`Peer`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerKind {
    User,
    Chat,
    Channel,
}

/// An opaque reference to a source or destination peer.
///
/// `input` is whatever the RPC layer needs to address the peer (e.g. a
/// serialized `InputPeer`); the engine never inspects it beyond passing it
/// through to a [`crate::ports::RpcSession`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub id: i64,
    pub kind: PeerKind,
    #[serde(default)]
    pub input: Vec<u8>,
    #[serde(default)]
    pub noforwards: bool,
}

impl Peer {
    pub fn new(id: i64, kind: PeerKind, input: Vec<u8>, noforwards: bool) -> Self {
        Self {
            id,
            kind,
            input,
            noforwards,
        }
    }

    /// Whether server-side forwarding with attribution is forbidden for
    /// messages owned by this peer.
    pub fn noforwards(&self) -> bool {
        self.noforwards
    }
}

/// A formatting span over message text (bold, link, mention, ...).
///
/// The concrete formatting kind is opaque to the engine — it is copied
/// verbatim into clone and text-only sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub offset: i32,
    pub length: i32,
    pub kind: String,
}

/// Non-interactive reply markup (inline keyboard, ...), copied verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyMarkup(pub Vec<u8>);

/// The largest representable size of a photo, as a server-side reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub id: i64,
    pub access_hash: i64,
    pub file_reference: Vec<u8>,
}

/// Attributes describing a document (filename, duration, dimensions, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentAttribute {
    Filename(String),
    Video { duration: f64, w: i32, h: i32 },
    Audio { duration: f64, title: Option<String> },
    Sticker { alt: String, set_id: i64 },
    Animated,
}

/// A server-side document reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: i64,
    pub access_hash: i64,
    pub file_reference: Vec<u8>,
    pub mime_type: String,
    pub attributes: Vec<DocumentAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb: Option<Box<MediaDescriptor>>,
}

impl DocumentRef {
    /// A document descriptor is considered "empty" when it carries neither a
    /// usable id nor a file reference — nothing the uploader can stage.
    pub fn is_empty(&self) -> bool {
        self.id == 0 && self.file_reference.is_empty()
    }
}

/// The source message's media, as classified by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaDescriptor {
    Photo {
        sizes: Vec<PhotoSize>,
        #[serde(default)]
        spoiler: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ttl_seconds: Option<i32>,
    },
    Document {
        doc: DocumentRef,
        #[serde(default)]
        spoiler: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ttl_seconds: Option<i32>,
    },
    /// Web page previews, polls, contacts, dice, ... — never directly
    /// re-uploadable.
    Other { kind: String },
}

impl MediaDescriptor {
    pub fn is_photo(&self) -> bool {
        matches!(self, MediaDescriptor::Photo { .. })
    }

    pub fn is_document(&self) -> bool {
        matches!(self, MediaDescriptor::Document { .. })
    }
}

/// A message belonging to some peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i32,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaDescriptor>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouped_id: Option<i64>,
    #[serde(default)]
    pub noforwards: bool,
}

impl Message {
    pub fn noforwards(&self) -> bool {
        self.noforwards
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Forwarding strategy for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Try a server-side forward first, falling back to clone on any error.
    Direct,
    /// Always reconstruct the message client-side.
    Clone,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Direct => write!(f, "direct"),
            Mode::Clone => write!(f, "clone"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Mode::Direct),
            "clone" => Ok(Mode::Clone),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// One unit of forwarding work, as yielded by a [`crate::ports::JobSource`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Elem {
    pub from: Peer,
    pub msg: Message,
    pub to: Peer,
    #[serde(default)]
    pub silent: bool,
    #[serde(default)]
    pub dry_run: bool,
    pub mode: Mode,
}

impl Elem {
    /// The `(from-peer-id, message-id)` pair used to dedup this job.
    pub fn dedup_key(&self) -> (i64, i32) {
        (self.from.id, self.msg.id)
    }
}
