//! A [`JobSource`] reading newline-delimited JSON-encoded [`Elem`] records
//! from a file, used by the demo binary and integration tests.

use std::io::{BufRead, BufReader};

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::ForwardError;
use crate::model::{Elem, Message, Mode, Peer};
use crate::ports::JobSource;

/// Per-run fallbacks applied to any job record that omits `mode`, `dry_run`,
/// or `silent` — the run's config-level defaults, per [`crate::config::ForwardConfig`].
#[derive(Debug, Clone, Copy)]
pub struct JobDefaults {
    pub mode: Mode,
    pub dry_run: bool,
    pub silent: bool,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            mode: Mode::Direct,
            dry_run: false,
            silent: false,
        }
    }
}

/// The on-disk shape of one job line: same as [`Elem`], except `mode`,
/// `dry_run`, and `silent` are optional and fall back to [`JobDefaults`]
/// when the line omits them.
#[derive(Debug, Deserialize)]
struct RawElem {
    from: Peer,
    msg: Message,
    to: Peer,
    silent: Option<bool>,
    dry_run: Option<bool>,
    mode: Option<Mode>,
}

impl RawElem {
    fn into_elem(self, defaults: &JobDefaults) -> Elem {
        Elem {
            from: self.from,
            msg: self.msg,
            to: self.to,
            silent: self.silent.unwrap_or(defaults.silent),
            dry_run: self.dry_run.unwrap_or(defaults.dry_run),
            mode: self.mode.unwrap_or(defaults.mode),
        }
    }
}

/// Reads one [`Elem`] per non-blank line of a JSONL file, in order.
///
/// The whole file is read and parsed eagerly at construction — this source
/// never touches the filesystem again once built, matching the amount of
/// buffering a real paged RPC history query would require anyway.
pub struct JsonlJobSource {
    jobs: std::vec::IntoIter<Elem>,
    err: Option<ForwardError>,
}

impl JsonlJobSource {
    pub fn from_path(path: &std::path::Path, defaults: &JobDefaults) -> Result<Self, ForwardError> {
        let file = std::fs::File::open(path)
            .map_err(|e| ForwardError::Iter(format!("opening '{}': {e}", path.display())))?;
        Self::from_reader(BufReader::new(file), defaults)
    }

    pub fn from_reader(reader: impl BufRead, defaults: &JobDefaults) -> Result<Self, ForwardError> {
        let mut jobs = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| ForwardError::Iter(format!("reading line {lineno}: {e}")))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let raw: RawElem = serde_json::from_str(trimmed)
                .map_err(|e| ForwardError::Iter(format!("parsing line {lineno}: {e}")))?;
            jobs.push(raw.into_elem(defaults));
        }
        Ok(Self {
            jobs: jobs.into_iter(),
            err: None,
        })
    }
}

#[async_trait]
impl JobSource for JsonlJobSource {
    async fn next(&mut self) -> Option<Elem> {
        self.jobs.next()
    }

    fn take_err(&mut self) -> Option<ForwardError> {
        self.err.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Message, Mode, Peer, PeerKind};
    use std::io::Cursor;

    fn sample_line() -> String {
        let elem = Elem {
            from: Peer::new(1, PeerKind::Channel, vec![], false),
            msg: Message {
                id: 7,
                text: "hello".into(),
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
        };
        serde_json::to_string(&elem).unwrap()
    }

    #[tokio::test]
    async fn reads_jobs_in_order_and_skips_blank_lines() {
        let text = format!("{}\n\n{}\n", sample_line(), sample_line());
        let mut source =
            JsonlJobSource::from_reader(Cursor::new(text), &JobDefaults::default()).unwrap();
        assert!(source.next().await.is_some());
        assert!(source.next().await.is_some());
        assert!(source.next().await.is_none());
        assert!(source.take_err().is_none());
    }

    #[tokio::test]
    async fn malformed_line_is_a_construction_error() {
        let err = JsonlJobSource::from_reader(Cursor::new("not json\n"), &JobDefaults::default())
            .unwrap_err();
        assert!(matches!(err, ForwardError::Iter(_)));
    }

    #[tokio::test]
    async fn omitted_fields_fall_back_to_run_defaults() {
        let line = r#"{"from":{"id":1,"kind":"channel"},"msg":{"id":7},"to":{"id":2,"kind":"user"}}"#;
        let defaults = JobDefaults {
            mode: Mode::Clone,
            dry_run: true,
            silent: true,
        };
        let mut source =
            JsonlJobSource::from_reader(Cursor::new(format!("{line}\n")), &defaults).unwrap();
        let job = source.next().await.unwrap();
        assert_eq!(job.mode, Mode::Clone);
        assert!(job.dry_run);
        assert!(job.silent);
    }

    #[tokio::test]
    async fn present_fields_override_run_defaults() {
        let line = r#"{"from":{"id":1,"kind":"channel"},"msg":{"id":7},"to":{"id":2,"kind":"user"},"mode":"direct","dry_run":false,"silent":false}"#;
        let defaults = JobDefaults {
            mode: Mode::Clone,
            dry_run: true,
            silent: true,
        };
        let mut source =
            JsonlJobSource::from_reader(Cursor::new(format!("{line}\n")), &defaults).unwrap();
        let job = source.next().await.unwrap();
        assert_eq!(job.mode, Mode::Direct);
        assert!(!job.dry_run);
        assert!(!job.silent);
    }
}
