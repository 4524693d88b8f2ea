//! External collaborators consumed by the forward engine.
//!
//! None of these are designed at the algorithm level here — a real
//! deployment backs them with a `grammers`-based client and uploader; the
//! in-memory implementations in [`crate::stub`] and [`crate::dryrun`] exist
//! to exercise the engine end to end in tests and the demo binary.

use async_trait::async_trait;

use crate::errors::ForwardError;
use crate::model::{Elem, Entity, Message, Peer, ReplyMarkup};

/// Input media ready to be attached to an outbound send request.
#[derive(Debug, Clone, PartialEq)]
pub enum InputMedia {
    /// Reference-copy of an existing server-side photo.
    Photo {
        id: i64,
        access_hash: i64,
        file_reference: Vec<u8>,
        spoiler: bool,
        ttl_seconds: Option<i32>,
    },
    /// Reference-copy of an existing server-side document.
    Document {
        id: i64,
        access_hash: i64,
        file_reference: Vec<u8>,
        spoiler: bool,
        ttl_seconds: Option<i32>,
    },
    /// A freshly re-uploaded photo.
    UploadedPhoto {
        file: InputFileRef,
        spoiler: bool,
        ttl_seconds: Option<i32>,
    },
    /// A freshly re-uploaded document. `nosound_video`, `force_file`, and
    /// custom-sticker flags are deliberately not represented: the converter
    /// never propagates them (see `crate::convert`).
    UploadedDocument {
        file: InputFileRef,
        thumb: Option<InputFileRef>,
        mime_type: String,
        attributes: Vec<crate::model::DocumentAttribute>,
        spoiler: bool,
        ttl_seconds: Option<i32>,
    },
}

/// What [`Uploader::clone_media`] is asked to stage.
#[derive(Debug, Clone)]
pub struct UploadInput {
    /// Raw byte source identifier the uploader resolves (opaque to the
    /// engine — typically a server-side file id the uploader re-downloads
    /// before re-uploading, or a local path).
    pub source_ref: Vec<u8>,
    /// Total size in bytes, when known in advance.
    pub total_size: u64,
    /// Upload chunk size hint in KiB.
    pub part_size_kb: u32,
}

/// The result of staging bytes through an [`Uploader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFileRef {
    pub id: i64,
    pub parts: i32,
    pub name: String,
}

/// A byte-progress sink for a single upload.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, uploaded: u64, total: u64);
}

/// The lifecycle callbacks the engine must invoke around every attempted
/// job, plus the byte-progress callback invoked by the primary adapter.
pub trait ProgressSink: Send + Sync {
    fn on_add(&self, job: &Elem);
    fn on_done(&self, job: &Elem, err: Option<&ForwardError>);
    fn on_progress(&self, job: &Elem, uploaded: u64, total: u64);
}

/// Yields forwarding jobs, e.g. from a paged RPC history query or a JSONL
/// file. Paging, filtering, and ordering are this collaborator's concern.
#[async_trait]
pub trait JobSource: Send {
    /// Advance and return the next job, or `None` at exhaustion.
    async fn next(&mut self) -> Option<Elem>;

    /// The terminal error, if iteration stopped because of one rather than
    /// because the source was exhausted. Consumed once, after `next`
    /// returns `None`.
    fn take_err(&mut self) -> Option<ForwardError>;
}

/// Provides a session bound to whichever data center the pool selects.
#[async_trait]
pub trait RpcPool: Send + Sync {
    async fn default_session(&self) -> Result<std::sync::Arc<dyn RpcSession>, ForwardError>;
}

/// The four outbound request shapes the engine can issue, plus album fetch.
#[async_trait]
pub trait RpcSession: Send + Sync {
    /// Server-side forward of one or more message ids from `from` to `to`.
    async fn forward_messages(
        &self,
        from: &Peer,
        to: &Peer,
        ids: &[i32],
        silent: bool,
        random_ids: &[i64],
    ) -> Result<(), ForwardError>;

    /// A plain text send, used by the text-only fallback.
    async fn send_text(
        &self,
        to: &Peer,
        text: &str,
        entities: &[Entity],
        reply_markup: Option<&ReplyMarkup>,
        silent: bool,
        random_id: i64,
    ) -> Result<(), ForwardError>;

    /// A single media item with an optional caption.
    async fn send_media(
        &self,
        to: &Peer,
        media: &InputMedia,
        text: &str,
        entities: &[Entity],
        reply_markup: Option<&ReplyMarkup>,
        silent: bool,
        random_id: i64,
    ) -> Result<(), ForwardError>;

    /// An album reconstructed from surviving clone conversions.
    async fn send_multi_media(
        &self,
        to: &Peer,
        items: &[(InputMedia, String, Vec<Entity>)],
        silent: bool,
        random_ids: &[i64],
    ) -> Result<(), ForwardError>;

    /// Resolve every sibling message sharing `msg`'s `grouped_id`.
    async fn get_grouped_messages(
        &self,
        from: &Peer,
        msg: &Message,
    ) -> Result<Vec<Message>, ForwardError>;
}

/// Stages bytes for a piece of media to be re-uploaded.
///
/// Dry-run short-circuiting is the caller's responsibility (see
/// [`crate::upload::CloneUploaderAdapter`]) — by the time this trait is
/// invoked, real I/O is intended to happen.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn clone_media(
        &self,
        input: UploadInput,
        progress: std::sync::Arc<dyn ProgressReporter>,
    ) -> Result<InputFileRef, ForwardError>;
}
