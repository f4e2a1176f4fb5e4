//! The Job controller and the log lines it emits.

use std::fmt;

use k8s_openapi::api::batch::v1::Job;
use kube_client::{Api, Client};
use kube_core::ResourceExt;
use kube_runtime::watcher;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    handler::Handler,
    runner,
    subscriber::{Informer, Lister, LookupError, QualifiedName},
    Error,
};

/// Logs the lifecycle of every Job in the cluster.
pub struct Controller {
    informer: Informer<Job>,
}

impl Controller {
    /// Binds a controller to all Jobs visible to `client`.
    ///
    /// No request is made until [`run`](Self::run) is polled.
    pub fn new(client: Client) -> Self {
        Self {
            informer: Informer::new(Api::all(client), watcher::Config::default()),
        }
    }

    /// A read handle to the Job cache the controller maintains.
    pub fn lister(&self) -> Lister<Job> {
        self.informer.lister()
    }

    /// Lists all Jobs, then follows their changes until `cancel` fires.
    ///
    /// Meant to be spawned on its own task.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), Error> {
        let handler = JobLogger::new(self.informer.lister());
        log::debug!("starting job informer");
        runner::run(self.informer.subscribe(), &handler, cancel).await
    }
}

/// The [`Handler`] behind [`Controller`].
pub struct JobLogger {
    lister: Lister<Job>,
}

impl JobLogger {
    pub fn new(lister: Lister<Job>) -> Self {
        Self { lister }
    }

    pub fn added(&self, job: &Job) -> Line {
        Line::Added {
            name: job.name_any(),
        }
    }

    /// Re-reads `new` from the cache and describes its current status.
    pub fn updated(&self, new: &Job) -> Line {
        let key = QualifiedName::from_resource(new);
        match self.lister.get(&key) {
            Ok(job) => Line::Updated {
                name: key.name,
                status: render_status(job.status.as_ref()),
            },
            Err(err) => Line::LookupFailed(err),
        }
    }

    pub fn deleted(&self, job: &Job, final_state_unknown: bool) -> Line {
        if final_state_unknown {
            log::debug!(
                "deletion of {} inferred from relist",
                QualifiedName::from_resource(job)
            );
        }
        Line::Deleted {
            name: job.name_any(),
        }
    }
}

impl Handler<Job> for JobLogger {
    fn on_add(&self, job: &Job) {
        self.added(job).emit();
    }

    fn on_update(&self, _old: &Job, new: &Job) {
        self.updated(new).emit();
    }

    fn on_delete(&self, job: &Job, final_state_unknown: bool) {
        self.deleted(job, final_state_unknown).emit();
    }
}

/// One lifecycle log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Added { name: String },
    Updated { name: String, status: String },
    LookupFailed(LookupError),
    Deleted { name: String },
}

impl Line {
    pub fn level(&self) -> log::Level {
        match self {
            Self::LookupFailed(_) => log::Level::Warn,
            Self::Added { .. } | Self::Updated { .. } | Self::Deleted { .. } => log::Level::Info,
        }
    }

    fn emit(&self) {
        log::log!(self.level(), "{self}");
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { name } => write!(f, "job added: {name}"),
            Self::Updated { name, status } => {
                write!(f, "job '{name}' updated with status: {status}")
            }
            Self::LookupFailed(err) => write!(f, "failed to get job during update event: {err}"),
            Self::Deleted { name } => write!(f, "job deleted: {name}"),
        }
    }
}

/// JSON of `status`, or `{}` when the object has none yet.
fn render_status<S: Serialize + Default>(status: Option<&S>) -> String {
    let rendered = match status {
        Some(status) => serde_json::to_string(status),
        None => serde_json::to_string(&S::default()),
    };
    rendered.unwrap_or_else(|err| format!("<unserializable status: {err}>"))
}
