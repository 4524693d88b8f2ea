//! Progress adapter composition and the `OnAdd`/`OnDone` pairing guard.
//!
//! Two adapter flavors are sufficient: [`JobProgressAdapter`] forwards every
//! byte-progress event to the sink, tagged with the owning job; [`Silent`]
//! swallows it. No general middleware is required.

use std::sync::Arc;

use crate::errors::ForwardError;
use crate::model::Elem;
use crate::ports::{ProgressReporter, ProgressSink};

/// Forwards upload progress to the sink for the job's primary file.
pub struct JobProgressAdapter {
    sink: Arc<dyn ProgressSink>,
    job: Elem,
}

impl JobProgressAdapter {
    pub fn new(sink: Arc<dyn ProgressSink>, job: Elem) -> Self {
        Self { sink, job }
    }
}

impl ProgressReporter for JobProgressAdapter {
    fn report(&self, uploaded: u64, total: u64) {
        self.sink.on_progress(&self.job, uploaded, total);
    }
}

/// Swallows progress entirely — used for thumbnail uploads.
pub struct Silent;

impl ProgressReporter for Silent {
    fn report(&self, _uploaded: u64, _total: u64) {}
}

/// RAII guard pairing one `OnAdd` with exactly one `OnDone`, covering every
/// exit path (including early returns) the way a deferred block would in a
/// language with `defer`.
pub struct JobGuard<'a> {
    sink: &'a dyn ProgressSink,
    job: Elem,
    err: Option<ForwardError>,
    done: bool,
}

impl<'a> JobGuard<'a> {
    pub fn new(sink: &'a dyn ProgressSink, job: Elem) -> Self {
        sink.on_add(&job);
        Self {
            sink,
            job,
            err: None,
            done: false,
        }
    }

    pub fn job(&self) -> &Elem {
        &self.job
    }

    /// Record the terminal error for this job. Call at most once; the last
    /// call before drop wins.
    pub fn set_err(&mut self, err: Option<ForwardError>) {
        self.err = err;
    }

    /// Fire `OnDone` now instead of waiting for drop, returning the error (if
    /// any) so callers can still act on it.
    pub fn finish(mut self) -> Option<ForwardError> {
        self.done = true;
        self.sink.on_done(&self.job, self.err.as_ref());
        self.err.take()
    }
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.sink.on_done(&self.job, self.err.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mode, Peer, PeerKind};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        added: Mutex<Vec<(i64, i32)>>,
        done: Mutex<Vec<(i64, i32, bool)>>,
        progress: Mutex<Vec<(u64, u64)>>,
    }

    impl ProgressSink for RecordingSink {
        fn on_add(&self, job: &Elem) {
            self.added.lock().unwrap().push(job.dedup_key());
        }
        fn on_done(&self, job: &Elem, err: Option<&ForwardError>) {
            self.done
                .lock()
                .unwrap()
                .push((job.dedup_key().0, job.dedup_key().1, err.is_some()));
        }
        fn on_progress(&self, _job: &Elem, uploaded: u64, total: u64) {
            self.progress.lock().unwrap().push((uploaded, total));
        }
    }

    fn job() -> Elem {
        Elem {
            from: Peer::new(1, PeerKind::User, vec![], false),
            msg: crate::model::Message {
                id: 7,
                text: String::new(),
                media: None,
                entities: vec![],
                reply_markup: None,
                grouped_id: None,
                noforwards: false,
            },
            to: Peer::new(2, PeerKind::User, vec![], false),
            silent: false,
            dry_run: false,
            mode: Mode::Direct,
        }
    }

    #[test]
    fn guard_pairs_add_and_done_on_normal_finish() {
        let sink = RecordingSink::default();
        let guard = JobGuard::new(&sink, job());
        let err = guard.finish();
        assert!(err.is_none());
        assert_eq!(*sink.added.lock().unwrap(), vec![(1, 7)]);
        assert_eq!(*sink.done.lock().unwrap(), vec![(1, 7, false)]);
    }

    #[test]
    fn guard_fires_done_on_drop_when_not_explicitly_finished() {
        let sink = RecordingSink::default();
        {
            let mut guard = JobGuard::new(&sink, job());
            guard.set_err(Some(ForwardError::EmptyMessage));
        }
        assert_eq!(*sink.done.lock().unwrap(), vec![(1, 7, true)]);
    }

    #[test]
    fn silent_adapter_drops_progress() {
        let sink = RecordingSink::default();
        let adapter = Silent;
        adapter.report(10, 100);
        assert!(sink.progress.lock().unwrap().is_empty());
    }

    #[test]
    fn job_adapter_forwards_progress_tagged_with_job() {
        let sink = Arc::new(RecordingSink::default());
        let adapter = JobProgressAdapter::new(sink.clone(), job());
        adapter.report(5, 10);
        assert_eq!(*sink.progress.lock().unwrap(), vec![(5, 10)]);
    }
}
