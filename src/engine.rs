//! The Forward Engine: the outer loop, album fetch, mode dispatch, fallback,
//! and send-request construction.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::cancel::cancellable;
use crate::classify::is_protected;
use crate::convert::convert_media;
use crate::dedup::DedupSet;
use crate::dryrun::DryRunSession;
use crate::errors::ForwardError;
use crate::model::{Elem, Entity, Message, Mode};
use crate::ports::{InputMedia, JobSource, ProgressSink, RpcPool, RpcSession, Uploader};
use crate::progress::JobGuard;
use crate::random_id::RandomIdGen;
use crate::upload::CloneUploaderAdapter;

enum FetchOutcome {
    Ok(Vec<Message>),
    Failed,
    Cancelled,
}

/// Drives an iterator of [`Elem`] jobs to exhaustion, replaying each into its
/// destination peer via the direct path with clone fallback.
pub struct ForwardEngine {
    pool: Arc<dyn RpcPool>,
    uploader: Arc<dyn Uploader>,
    sink: Arc<dyn ProgressSink>,
    dedup: DedupSet,
    rng: RandomIdGen,
    part_size_kb: u32,
    album_fetch_page_size: usize,
    dry_run_session: Arc<dyn RpcSession>,
}

impl ForwardEngine {
    pub fn new(
        pool: Arc<dyn RpcPool>,
        uploader: Arc<dyn Uploader>,
        sink: Arc<dyn ProgressSink>,
        part_size_kb: u32,
        album_fetch_page_size: usize,
    ) -> Self {
        Self {
            pool,
            uploader,
            sink,
            dedup: DedupSet::new(),
            rng: RandomIdGen::new(),
            part_size_kb,
            album_fetch_page_size,
            dry_run_session: Arc::new(DryRunSession),
        }
    }

    /// Returns the dry-run stub session for `job.dry_run` jobs so a dry run
    /// never opens or touches the real transport, or the pool's real session
    /// otherwise.
    async fn session_for(&self, job: &Elem) -> Result<Arc<dyn RpcSession>, ForwardError> {
        if job.dry_run {
            return Ok(self.dry_run_session.clone());
        }
        self.pool
            .default_session()
            .await
            .map_err(|e| ForwardError::Rpc(e.to_string()))
    }

    pub fn dedup_len(&self) -> usize {
        self.dedup.len()
    }

    /// Drive `jobs` to exhaustion. Returns the iterator's terminal error, or
    /// a cancellation observed during a send; all other per-job errors are
    /// reported through the progress sink and absorbed.
    pub async fn forward(
        &mut self,
        jobs: &mut dyn JobSource,
        cancel: &CancellationToken,
    ) -> Result<(), ForwardError> {
        loop {
            if cancel.is_cancelled() {
                break;
            }

            let Some(job) = jobs.next().await else {
                break;
            };

            if self.dedup.contains(job.dedup_key()) {
                continue;
            }

            let group_members = if job.msg.grouped_id.is_some() {
                match self.fetch_group(&job, cancel).await {
                    FetchOutcome::Ok(list) => Some(list),
                    FetchOutcome::Failed => {
                        debug!(msg_id = job.msg.id, "album fetch failed, skipping silently");
                        continue;
                    }
                    FetchOutcome::Cancelled => {
                        self.sink.on_add(&job);
                        self.sink.on_done(&job, Some(&ForwardError::Cancelled));
                        continue;
                    }
                }
            } else {
                None
            };

            let job_id = uuid::Uuid::new_v4();
            let span = tracing::info_span!(
                "forward_job",
                %job_id,
                from = job.from.id,
                msg_id = job.msg.id,
                mode = %job.mode,
            );
            if let Err(err) = self
                .process_job(job, group_members, cancel)
                .instrument(span)
                .await
            {
                return Err(err);
            }
        }

        if let Some(err) = jobs.take_err() {
            return Err(err);
        }
        Ok(())
    }

    async fn fetch_group(&self, job: &Elem, cancel: &CancellationToken) -> FetchOutcome {
        let session = match self.pool.default_session().await {
            Ok(s) => s,
            Err(_) => return FetchOutcome::Failed,
        };
        tokio::select! {
            _ = cancel.cancelled() => FetchOutcome::Cancelled,
            res = session.get_grouped_messages(&job.from, &job.msg) => match res {
                Ok(mut list) => {
                    list.truncate(self.album_fetch_page_size);
                    FetchOutcome::Ok(list)
                }
                Err(_) => FetchOutcome::Failed,
            },
        }
    }

    /// Owns the `OnAdd`/`OnDone` pairing, dedup insertion, and dispatch for
    /// one job. Returns `Err` only for a fatal (cancelled) exit, which the
    /// caller must propagate immediately.
    async fn process_job(
        &mut self,
        job: Elem,
        group_members: Option<Vec<Message>>,
        cancel: &CancellationToken,
    ) -> Result<(), ForwardError> {
        let mut guard = JobGuard::new(self.sink.as_ref(), job.clone());

        let sibling_keys: Vec<(i64, i32)> = group_members
            .as_ref()
            .map(|members| members.iter().map(|m| (job.from.id, m.id)).collect())
            .unwrap_or_default();

        let outcome = self.dispatch(&job, group_members.as_deref(), cancel).await;

        self.dedup.insert_all(job.dedup_key(), sibling_keys);

        match outcome {
            Ok(()) => {
                guard.finish();
                Ok(())
            }
            Err(err) if err.is_fatal() => {
                guard.set_err(Some(err.clone()));
                guard.finish();
                Err(err)
            }
            Err(err) => {
                guard.set_err(Some(err));
                guard.finish();
                Ok(())
            }
        }
    }

    async fn dispatch(
        &mut self,
        job: &Elem,
        group_members: Option<&[Message]>,
        cancel: &CancellationToken,
    ) -> Result<(), ForwardError> {
        match job.mode {
            Mode::Direct => {
                if !is_protected(&job.from, &job.msg) {
                    match self.try_direct(job, group_members, cancel).await {
                        Ok(()) => return Ok(()),
                        Err(err) if err.is_fatal() => return Err(err),
                        Err(err) => {
                            debug!(error = %err, "direct forward failed, falling back to clone");
                        }
                    }
                }
                self.try_clone(job, group_members, cancel).await
            }
            Mode::Clone => self.try_clone(job, group_members, cancel).await,
        }
    }

    async fn try_direct(
        &mut self,
        job: &Elem,
        group_members: Option<&[Message]>,
        cancel: &CancellationToken,
    ) -> Result<(), ForwardError> {
        let session = self
            .session_for(job)
            .await
            .map_err(|e| ForwardError::DirectSendFailed(e.to_string()))?;

        let ids: Vec<i32> = match group_members {
            Some(members) => members.iter().map(|m| m.id).collect(),
            None => vec![job.msg.id],
        };
        let random_ids = self.rng.next_ids(ids.len());

        let result = cancellable(
            session.forward_messages(&job.from, &job.to, &ids, job.silent, &random_ids),
            cancel,
        )
        .await;

        match result {
            Ok(()) => {
                info!(msg_id = job.msg.id, to = job.to.id, "forwarded directly");
                Ok(())
            }
            Err(ForwardError::Cancelled) => Err(ForwardError::Cancelled),
            Err(e) => Err(ForwardError::DirectSendFailed(e.to_string())),
        }
    }

    async fn try_clone(
        &mut self,
        job: &Elem,
        group_members: Option<&[Message]>,
        cancel: &CancellationToken,
    ) -> Result<(), ForwardError> {
        let session = self
            .session_for(job)
            .await
            .map_err(|e| ForwardError::CloneSendFailed(e.to_string()))?;
        let adapter = CloneUploaderAdapter::new(self.uploader.clone(), self.sink.clone());

        if let Some(members) = group_members {
            return self.try_clone_album(job, members, &adapter, session.as_ref(), cancel).await;
        }

        match convert_media(job, &job.msg, &adapter, self.part_size_kb, cancel).await {
            Ok(media) => {
                let random_id = self.rng.next_id();
                let fut = session.send_media(
                    &job.to,
                    &media,
                    &job.msg.text,
                    &job.msg.entities,
                    job.msg.reply_markup.as_ref(),
                    job.silent,
                    random_id,
                );
                match cancellable(fut, cancel).await {
                    Ok(()) => Ok(()),
                    Err(ForwardError::Cancelled) => Err(ForwardError::Cancelled),
                    Err(e) => Err(ForwardError::CloneSendFailed(e.to_string())),
                }
            }
            Err(err) => {
                debug!(error = %err, "media conversion failed, falling back to text-only");
                self.send_text_only(job, session.as_ref(), cancel).await
            }
        }
    }

    async fn try_clone_album(
        &mut self,
        job: &Elem,
        members: &[Message],
        adapter: &CloneUploaderAdapter,
        session: &dyn RpcSession,
        cancel: &CancellationToken,
    ) -> Result<(), ForwardError> {
        let mut surviving: Vec<(InputMedia, String, Vec<Entity>)> = Vec::new();
        for member in members {
            match convert_media(job, member, adapter, self.part_size_kb, cancel).await {
                Ok(media) => surviving.push((media, member.text.clone(), member.entities.clone())),
                Err(err) => {
                    warn!(msg_id = member.id, error = %err, "dropping album sibling that failed conversion");
                }
            }
        }

        if surviving.is_empty() {
            return self.send_text_only(job, session, cancel).await;
        }

        let random_ids = self.rng.next_ids(surviving.len());
        let fut = session.send_multi_media(&job.to, &surviving, job.silent, &random_ids);
        match cancellable(fut, cancel).await {
            Ok(()) => Ok(()),
            Err(ForwardError::Cancelled) => Err(ForwardError::Cancelled),
            Err(e) => Err(ForwardError::CloneSendFailed(e.to_string())),
        }
    }

    async fn send_text_only(
        &mut self,
        job: &Elem,
        session: &dyn RpcSession,
        cancel: &CancellationToken,
    ) -> Result<(), ForwardError> {
        if !job.msg.has_text() {
            return Err(ForwardError::EmptyMessage);
        }
        let random_id = self.rng.next_id();
        let fut = session.send_text(
            &job.to,
            &job.msg.text,
            &job.msg.entities,
            job.msg.reply_markup.as_ref(),
            job.silent,
            random_id,
        );
        match cancellable(fut, cancel).await {
            Ok(()) => Ok(()),
            Err(ForwardError::Cancelled) => Err(ForwardError::Cancelled),
            Err(e) => Err(ForwardError::CloneSendFailed(e.to_string())),
        }
    }
}
