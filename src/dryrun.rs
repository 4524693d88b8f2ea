//! Dry-Run Transport: a null RPC session/pool/uploader satisfying the same
//! traits as the real ones, returning success for any request without
//! encoding or transmitting anything.
//!
//! All engine decision code is agnostic to which implementation it holds —
//! this is the only branch that differs from normal operation.

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::ForwardError;
use crate::model::{Entity, Message, Peer, ReplyMarkup};
use crate::ports::{InputFileRef, InputMedia, ProgressReporter, RpcPool, RpcSession, UploadInput, Uploader};

pub struct DryRunSession;

#[async_trait]
impl RpcSession for DryRunSession {
    async fn forward_messages(
        &self,
        _from: &Peer,
        _to: &Peer,
        _ids: &[i32],
        _silent: bool,
        _random_ids: &[i64],
    ) -> Result<(), ForwardError> {
        Ok(())
    }

    async fn send_text(
        &self,
        _to: &Peer,
        _text: &str,
        _entities: &[Entity],
        _reply_markup: Option<&ReplyMarkup>,
        _silent: bool,
        _random_id: i64,
    ) -> Result<(), ForwardError> {
        Ok(())
    }

    async fn send_media(
        &self,
        _to: &Peer,
        _media: &InputMedia,
        _text: &str,
        _entities: &[Entity],
        _reply_markup: Option<&ReplyMarkup>,
        _silent: bool,
        _random_id: i64,
    ) -> Result<(), ForwardError> {
        Ok(())
    }

    async fn send_multi_media(
        &self,
        _to: &Peer,
        _items: &[(InputMedia, String, Vec<Entity>)],
        _silent: bool,
        _random_ids: &[i64],
    ) -> Result<(), ForwardError> {
        Ok(())
    }

    async fn get_grouped_messages(
        &self,
        _from: &Peer,
        _msg: &Message,
    ) -> Result<Vec<Message>, ForwardError> {
        Ok(Vec::new())
    }
}

pub struct DryRunPool;

#[async_trait]
impl RpcPool for DryRunPool {
    async fn default_session(&self) -> Result<Arc<dyn RpcSession>, ForwardError> {
        Ok(Arc::new(DryRunSession))
    }
}

pub struct DryRunUploader;

#[async_trait]
impl Uploader for DryRunUploader {
    async fn clone_media(
        &self,
        input: UploadInput,
        _progress: Arc<dyn ProgressReporter>,
    ) -> Result<InputFileRef, ForwardError> {
        Ok(InputFileRef {
            id: 0,
            parts: 0,
            name: format!("dry-run:{}", input.source_ref.len()),
        })
    }
}
