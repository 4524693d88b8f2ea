//! In-memory stand-ins for [`RpcPool`]/[`RpcSession`]/[`Uploader`], backing
//! the demo binary and integration tests. A real deployment replaces this
//! whole module with a `grammers`-backed client; nothing else in the crate
//! depends on it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::errors::ForwardError;
use crate::model::{Entity, Message, Peer, ReplyMarkup};
use crate::ports::{InputFileRef, InputMedia, ProgressReporter, RpcPool, RpcSession, UploadInput, Uploader};

/// One outbound request the stub session observed, recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentRequest {
    Forward { from: i64, to: i64, ids: Vec<i32> },
    Text { to: i64, text: String },
    Media { to: i64, text: String },
    MultiMedia { to: i64, count: usize },
}

struct Inner {
    /// `(peer_id, grouped_id) -> every message sharing that group`.
    groups: HashMap<(i64, i64), Vec<Message>>,
    /// Peer ids for which `forward_messages` should fail, exercising the
    /// direct-to-clone fallback.
    fail_direct: std::collections::HashSet<i64>,
    /// Peer ids for which `forward_messages` never resolves on its own,
    /// exercising cancellation tests deterministically.
    stall_direct: std::collections::HashSet<i64>,
    /// Peer ids for which `get_grouped_messages` never resolves on its own.
    stall_group_fetch: std::collections::HashSet<i64>,
    sent: Vec<SentRequest>,
}

/// A single in-process peer/message table shared by the pool's session and
/// the uploader, standing in for a real client's connection state.
pub struct StubSession {
    inner: Mutex<Inner>,
    /// Notified once a stalled call has parked, so a test can safely cancel
    /// its token without racing the call's own start-up.
    entered_stall: tokio::sync::Notify,
}

impl StubSession {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                groups: HashMap::new(),
                fail_direct: std::collections::HashSet::new(),
                stall_direct: std::collections::HashSet::new(),
                stall_group_fetch: std::collections::HashSet::new(),
                sent: Vec::new(),
            }),
            entered_stall: tokio::sync::Notify::new(),
        }
    }

    /// Register every message of an album under `peer_id`, so a later
    /// `get_grouped_messages` call can resolve it.
    pub fn seed_album(&self, peer_id: i64, grouped_id: i64, members: Vec<Message>) {
        self.inner
            .lock()
            .unwrap()
            .groups
            .insert((peer_id, grouped_id), members);
    }

    /// Make `forward_messages` fail whenever `from.id == peer_id`.
    pub fn fail_direct_forward_for(&self, peer_id: i64) {
        self.inner.lock().unwrap().fail_direct.insert(peer_id);
    }

    /// Make `forward_messages` park forever whenever `from.id == peer_id`,
    /// so a racing cancellation is the only way the call ever resolves.
    pub fn stall_direct_forward_for(&self, peer_id: i64) {
        self.inner.lock().unwrap().stall_direct.insert(peer_id);
    }

    /// Make `get_grouped_messages` park forever whenever `from.id == peer_id`.
    pub fn stall_group_fetch_for(&self, peer_id: i64) {
        self.inner.lock().unwrap().stall_group_fetch.insert(peer_id);
    }

    /// Wait until a stalled call has actually parked. Call this before
    /// cancelling a token so the cancellation cannot win the race by firing
    /// before the call has even started.
    pub async fn wait_until_stalled(&self) {
        self.entered_stall.notified().await;
    }

    pub fn sent_requests(&self) -> Vec<SentRequest> {
        self.inner.lock().unwrap().sent.clone()
    }
}

impl Default for StubSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RpcSession for StubSession {
    async fn forward_messages(
        &self,
        from: &Peer,
        to: &Peer,
        ids: &[i32],
        _silent: bool,
        _random_ids: &[i64],
    ) -> Result<(), ForwardError> {
        {
            let inner = self.inner.lock().unwrap();
            if inner.fail_direct.contains(&from.id) {
                return Err(ForwardError::Rpc("direct forward forbidden for this peer".into()));
            }
            if inner.stall_direct.contains(&from.id) {
                drop(inner);
                self.entered_stall.notify_one();
                std::future::pending::<()>().await;
                unreachable!("pending future never resolves");
            }
        }
        let mut inner = self.inner.lock().unwrap();
        inner.sent.push(SentRequest::Forward {
            from: from.id,
            to: to.id,
            ids: ids.to_vec(),
        });
        Ok(())
    }

    async fn send_text(
        &self,
        to: &Peer,
        text: &str,
        _entities: &[Entity],
        _reply_markup: Option<&ReplyMarkup>,
        _silent: bool,
        _random_id: i64,
    ) -> Result<(), ForwardError> {
        self.inner.lock().unwrap().sent.push(SentRequest::Text {
            to: to.id,
            text: text.to_owned(),
        });
        Ok(())
    }

    async fn send_media(
        &self,
        to: &Peer,
        _media: &InputMedia,
        text: &str,
        _entities: &[Entity],
        _reply_markup: Option<&ReplyMarkup>,
        _silent: bool,
        _random_id: i64,
    ) -> Result<(), ForwardError> {
        self.inner.lock().unwrap().sent.push(SentRequest::Media {
            to: to.id,
            text: text.to_owned(),
        });
        Ok(())
    }

    async fn send_multi_media(
        &self,
        to: &Peer,
        items: &[(InputMedia, String, Vec<Entity>)],
        _silent: bool,
        _random_ids: &[i64],
    ) -> Result<(), ForwardError> {
        self.inner.lock().unwrap().sent.push(SentRequest::MultiMedia {
            to: to.id,
            count: items.len(),
        });
        Ok(())
    }

    async fn get_grouped_messages(
        &self,
        from: &Peer,
        msg: &Message,
    ) -> Result<Vec<Message>, ForwardError> {
        let Some(gid) = msg.grouped_id else {
            return Ok(Vec::new());
        };
        if self.inner.lock().unwrap().stall_group_fetch.contains(&from.id) {
            self.entered_stall.notify_one();
            std::future::pending::<()>().await;
            unreachable!("pending future never resolves");
        }
        self.inner
            .lock()
            .unwrap()
            .groups
            .get(&(from.id, gid))
            .cloned()
            .ok_or_else(|| ForwardError::AlbumFetchFailed(format!("no album seeded for group {gid}")))
    }
}

/// Hands out the single shared [`StubSession`] for every call.
pub struct StubRpcPool {
    session: Arc<StubSession>,
}

impl StubRpcPool {
    pub fn new(session: Arc<StubSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl RpcPool for StubRpcPool {
    async fn default_session(&self) -> Result<Arc<dyn RpcSession>, ForwardError> {
        Ok(self.session.clone())
    }
}

/// Produces a deterministic synthetic file reference from the input's byte
/// length, without any real upload.
pub struct StubUploader;

#[async_trait]
impl Uploader for StubUploader {
    async fn clone_media(
        &self,
        input: UploadInput,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<InputFileRef, ForwardError> {
        if input.source_ref.is_empty() {
            return Err(ForwardError::Upload("source reference is empty".into()));
        }
        progress.report(input.source_ref.len() as u64, input.source_ref.len() as u64);
        Ok(InputFileRef {
            id: input.source_ref.len() as i64,
            parts: 1,
            name: "stub-upload.bin".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PeerKind;
    use crate::progress::Silent;

    fn peer(id: i64) -> Peer {
        Peer::new(id, PeerKind::User, vec![], false)
    }

    #[tokio::test]
    async fn forward_messages_is_recorded_unless_peer_is_marked_to_fail() {
        let session = StubSession::new();
        session
            .forward_messages(&peer(1), &peer(2), &[10], false, &[99])
            .await
            .unwrap();
        assert_eq!(session.sent_requests().len(), 1);

        session.fail_direct_forward_for(1);
        let err = session
            .forward_messages(&peer(1), &peer(2), &[10], false, &[99])
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::Rpc(_)));
    }

    #[tokio::test]
    async fn seeded_album_is_returned_by_group_id() {
        let session = StubSession::new();
        let members = vec![Message {
            id: 1,
            text: String::new(),
            media: None,
            entities: vec![],
            reply_markup: None,
            grouped_id: Some(42),
            noforwards: false,
        }];
        session.seed_album(1, 42, members.clone());
        let msg = Message {
            grouped_id: Some(42),
            ..members[0].clone()
        };
        let fetched = session.get_grouped_messages(&peer(1), &msg).await.unwrap();
        assert_eq!(fetched, members);
    }

    #[tokio::test]
    async fn uploader_derives_file_id_from_input_length() {
        let file = StubUploader
            .clone_media(
                UploadInput {
                    source_ref: vec![0; 7],
                    total_size: 7,
                    part_size_kb: 512,
                },
                Arc::new(Silent),
            )
            .await
            .unwrap();
        assert_eq!(file.id, 7);
    }
}
