//! Clone Uploader Adapter: wraps the external [`Uploader`] with progress
//! composition and the dry-run short-circuit.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cancel::cancellable;
use crate::errors::ForwardError;
use crate::model::Elem;
use crate::ports::{InputFileRef, ProgressSink, UploadInput, Uploader};
use crate::progress::{JobProgressAdapter, Silent};

/// Wraps an [`Uploader`] so the engine can stage a job's primary file (with
/// visible progress) or a thumbnail (silently), honoring dry-run.
pub struct CloneUploaderAdapter {
    uploader: Arc<dyn Uploader>,
    sink: Arc<dyn ProgressSink>,
}

impl CloneUploaderAdapter {
    pub fn new(uploader: Arc<dyn Uploader>, sink: Arc<dyn ProgressSink>) -> Self {
        Self { uploader, sink }
    }

    /// Stage the primary (user-visible) file for `job`.
    pub async fn stage_primary(
        &self,
        job: &Elem,
        input: UploadInput,
        cancel: &CancellationToken,
    ) -> Result<InputFileRef, ForwardError> {
        if job.dry_run {
            return Ok(synthetic_file_ref(&input));
        }
        let progress = Arc::new(JobProgressAdapter::new(self.sink.clone(), job.clone()));
        cancellable(self.uploader.clone_media(input, progress), cancel).await
    }

    /// Stage a thumbnail: same staging path, but progress is swallowed.
    pub async fn stage_thumbnail(
        &self,
        job: &Elem,
        input: UploadInput,
        cancel: &CancellationToken,
    ) -> Result<InputFileRef, ForwardError> {
        if job.dry_run {
            return Ok(synthetic_file_ref(&input));
        }
        cancellable(self.uploader.clone_media(input, Arc::new(Silent)), cancel).await
    }
}

/// A deterministic stand-in file descriptor so downstream send RPCs can
/// still be constructed and inspected in dry-run, without reading a byte or
/// invoking the real uploader.
fn synthetic_file_ref(input: &UploadInput) -> InputFileRef {
    InputFileRef {
        id: 0,
        parts: 0,
        name: format!("dry-run:{}", input.source_ref.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mode, Peer, PeerKind};
    use crate::ports::ProgressReporter;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct RecordingSink {
        progress: Mutex<Vec<(u64, u64)>>,
    }

    impl ProgressSink for RecordingSink {
        fn on_add(&self, _job: &Elem) {}
        fn on_done(&self, _job: &Elem, _err: Option<&ForwardError>) {}
        fn on_progress(&self, _job: &Elem, uploaded: u64, total: u64) {
            self.progress.lock().unwrap().push((uploaded, total));
        }
    }

    struct CountingUploader {
        invoked: AtomicBool,
    }

    #[async_trait]
    impl Uploader for CountingUploader {
        async fn clone_media(
            &self,
            _input: UploadInput,
            progress: Arc<dyn ProgressReporter>,
        ) -> Result<InputFileRef, ForwardError> {
            self.invoked.store(true, Ordering::SeqCst);
            progress.report(50, 100);
            progress.report(100, 100);
            Ok(InputFileRef {
                id: 99,
                parts: 1,
                name: "file.bin".into(),
            })
        }
    }

    fn job(dry_run: bool) -> Elem {
        Elem {
            from: Peer::new(1, PeerKind::User, vec![], false),
            msg: crate::model::Message {
                id: 1,
                text: String::new(),
                media: None,
                entities: vec![],
                reply_markup: None,
                grouped_id: None,
                noforwards: false,
            },
            to: Peer::new(2, PeerKind::User, vec![], false),
            silent: false,
            dry_run,
            mode: Mode::Clone,
        }
    }

    #[tokio::test]
    async fn dry_run_never_invokes_the_uploader() {
        let uploader = Arc::new(CountingUploader {
            invoked: AtomicBool::new(false),
        });
        let sink = Arc::new(RecordingSink {
            progress: Mutex::new(vec![]),
        });
        let adapter = CloneUploaderAdapter::new(uploader.clone(), sink.clone());
        let input = UploadInput {
            source_ref: vec![1, 2, 3],
            total_size: 3,
            part_size_kb: 512,
        };
        let file = adapter
            .stage_primary(&job(true), input, &CancellationToken::new())
            .await
            .unwrap();
        assert!(!uploader.invoked.load(Ordering::SeqCst));
        assert!(sink.progress.lock().unwrap().is_empty());
        assert_eq!(file.id, 0);
    }

    #[tokio::test]
    async fn primary_stage_forwards_progress_to_sink() {
        let uploader = Arc::new(CountingUploader {
            invoked: AtomicBool::new(false),
        });
        let sink = Arc::new(RecordingSink {
            progress: Mutex::new(vec![]),
        });
        let adapter = CloneUploaderAdapter::new(uploader.clone(), sink.clone());
        let input = UploadInput {
            source_ref: vec![1, 2, 3],
            total_size: 3,
            part_size_kb: 512,
        };
        adapter
            .stage_primary(&job(false), input, &CancellationToken::new())
            .await
            .unwrap();
        assert!(uploader.invoked.load(Ordering::SeqCst));
        assert_eq!(*sink.progress.lock().unwrap(), vec![(50, 100), (100, 100)]);
    }

    #[tokio::test]
    async fn thumbnail_stage_swallows_progress() {
        let uploader = Arc::new(CountingUploader {
            invoked: AtomicBool::new(false),
        });
        let sink = Arc::new(RecordingSink {
            progress: Mutex::new(vec![]),
        });
        let adapter = CloneUploaderAdapter::new(uploader.clone(), sink.clone());
        let input = UploadInput {
            source_ref: vec![1],
            total_size: 1,
            part_size_kb: 512,
        };
        adapter
            .stage_thumbnail(&job(false), input, &CancellationToken::new())
            .await
            .unwrap();
        assert!(uploader.invoked.load(Ordering::SeqCst));
        assert!(sink.progress.lock().unwrap().is_empty());
    }
}
