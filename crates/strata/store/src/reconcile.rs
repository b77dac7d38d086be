//! Push and pull against the remote.
//!
//! A push sends an overlay graph as-is, merges the accepted elements into
//! `main`, records the rejected ones as the overlay's error graph and then
//! clears the overlay. A pull fetches a view and overwrites `main` with it,
//! deleting what the view covers locally but the remote no longer has.
//! When the remote call itself fails nothing is merged and the error is
//! returned unchanged.

use std::collections::BTreeMap;

use bytes::Bytes;
use futures::future::join_all;
use serde_json::{Map, Value};
use strata_graph::path::lookup_nested;
use strata_graph::{
    ElementError, ErrorGraph, FileEntry, FileKey, Graph, GraphPath, Leaf, LeafRef, MergeMode,
    PendingUpload, Region, Slot, MISSING_STATUS, NO_ADMIN_RIGHT, NO_WRITE_RIGHT,
};
use strata_view::{filter_graph, View};
use tracing::{debug, info, instrument, warn};

use crate::action::Action;
use crate::config::SyncConfig;
use crate::error::{RemoteError, Result, StoreError};
use crate::remote::{RemoteApi, UploadRequest, UploadTicket};
use crate::state::MAIN;
use crate::store::Store;

const STATUS_CODE: &str = "statusCode";
const NAME: &str = "name";
const UPLOAD_URLS: &str = "uploadUrls";
const UPLOAD_ID: &str = "uploadId";
const UNEXPECTED_STATUS: &str = "UnexpectedStatus";

/// A pushed graph split by the remote's per-element answers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushSplit {
    /// Elements answered with 200.
    pub success: Graph,
    /// Everything else, each wrapped with its status.
    pub errors: ErrorGraph,
    /// Accepted pending files the remote handed upload URLs for.
    pub uploads: Vec<UploadTicket>,
}

/// Outcome of one file transfer after a push.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub file: FileKey,
    pub result: std::result::Result<(), RemoteError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushReport {
    pub success: Graph,
    pub errors: ErrorGraph,
    pub uploads: Vec<UploadOutcome>,
}

/// Split `pushed` into accepted and rejected elements using `result`, a
/// status tree shaped like the pushed graph.
///
/// Every leaf of `pushed` lands in exactly one of the two outputs. The
/// status for a leaf is the nearest status object at or above its path; a
/// leaf with no status is rejected with code 0 and [`MISSING_STATUS`].
pub fn create_success_and_error_graphs(pushed: &Graph, result: &Value) -> Result<PushSplit> {
    let mut split = PushSplit::default();

    for (path, leaf) in pushed.leaves() {
        let segments = path.segments();
        let status = status_at(result, &segments);
        let code = status.map(status_code).unwrap_or(0);

        if code == 200 {
            if let (GraphPath::File(key), LeafRef::File(Slot::Data(FileEntry::Upload(upload)))) =
                (&path, leaf)
            {
                if let Some(ticket) = status.and_then(|s| upload_ticket(key, upload, s)) {
                    split.uploads.push(ticket);
                }
            }
            split.success.set(path, leaf.into_leaf())?;
            continue;
        }

        let name = match status.and_then(|s| s.get(NAME)).and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => default_error_name(code, &path).to_string(),
        };
        warn!(path = %path, status = code, name = %name, "element rejected");
        split.errors.insert(
            path,
            ElementError {
                status_code: code,
                name,
                element: leaf.to_value()?,
            },
        );
    }

    Ok(split)
}

fn status_at<'a>(result: &'a Value, segments: &[String]) -> Option<&'a Map<String, Value>> {
    (1..=segments.len()).rev().find_map(|depth| {
        lookup_nested(result, &segments[..depth])?
            .as_object()
            .filter(|object| object.contains_key(STATUS_CODE))
    })
}

fn status_code(status: &Map<String, Value>) -> u16 {
    status
        .get(STATUS_CODE)
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .unwrap_or(0)
}

fn default_error_name(code: u16, path: &GraphPath) -> &'static str {
    match (code, path.region()) {
        (0, _) => MISSING_STATUS,
        (403, Region::Rights) => NO_ADMIN_RIGHT,
        (403, _) => NO_WRITE_RIGHT,
        _ => UNEXPECTED_STATUS,
    }
}

fn upload_ticket(
    file: &FileKey,
    upload: &PendingUpload,
    status: &Map<String, Value>,
) -> Option<UploadTicket> {
    let urls: Vec<String> = status
        .get(UPLOAD_URLS)?
        .as_array()?
        .iter()
        .filter_map(|url| url.as_str().map(str::to_string))
        .collect();
    if urls.is_empty() {
        return None;
    }
    Some(UploadTicket {
        file: file.clone(),
        urls,
        upload_id: status
            .get(UPLOAD_ID)
            .and_then(Value::as_str)
            .map(str::to_string),
        part_size: upload.part_size,
    })
}

/// Push the overlay `graph_name`.
///
/// An empty overlay is not sent. On success the accepted elements are merged
/// additively into `main`, the overlay is cleared and the rejected elements
/// become its error graph. Accepted files are uploaded last when
/// `config.upload_files` is set; upload failures are reported but never
/// undo the merge.
#[instrument(skip(store, api, config))]
pub async fn push<S, A>(store: &S, api: &A, graph_name: &str, config: &SyncConfig) -> Result<PushReport>
where
    S: Store,
    A: RemoteApi + ?Sized,
{
    if graph_name == MAIN {
        return Err(StoreError::ReadOnlyGraph(MAIN.to_string()));
    }

    let (body, blobs) = store.select(|state| {
        state
            .graph_state(graph_name)
            .map(|gs| (gs.graph.clone(), gs.blobs.clone()))
            .unwrap_or_default()
    });
    if body.is_empty() {
        debug!("nothing to push");
        return Ok(PushReport::default());
    }

    let result = api.push(&body).await?;
    let split = create_success_and_error_graphs(&body, &result)?;
    info!(
        accepted = split.success.len(),
        rejected = split.errors.len(),
        "push completed"
    );

    store.dispatch(Action::Merge {
        graph_name: MAIN.to_string(),
        graph: split.success.clone(),
        mode: MergeMode::Additive,
    });
    store.dispatch(Action::Clear {
        graph_name: graph_name.to_string(),
        keep_errors: false,
        errors: split.errors.clone(),
    });

    let uploads = if config.upload_files {
        upload_files(store, api, graph_name, &split.uploads, &blobs).await
    } else {
        Vec::new()
    };

    Ok(PushReport {
        success: split.success,
        errors: split.errors,
        uploads,
    })
}

/// Upload every ticket whose blob is known, concurrently. Progress,
/// completion and failure are dispatched against `graph_name`.
pub async fn upload_files<S, A>(
    store: &S,
    api: &A,
    graph_name: &str,
    tickets: &[UploadTicket],
    blobs: &BTreeMap<FileKey, Bytes>,
) -> Vec<UploadOutcome>
where
    S: Store,
    A: RemoteApi + ?Sized,
{
    let requests: Vec<UploadRequest> = tickets
        .iter()
        .filter_map(|ticket| match blobs.get(&ticket.file) {
            Some(blob) => Some(UploadRequest::new(ticket.clone(), blob.clone())),
            None => {
                warn!(file = %ticket.file, "accepted file has no local blob");
                None
            }
        })
        .collect();

    join_all(
        requests
            .iter()
            .map(|request| upload_one(store, api, graph_name, request)),
    )
    .await
}

async fn upload_one<S, A>(store: &S, api: &A, graph_name: &str, request: &UploadRequest) -> UploadOutcome
where
    S: Store,
    A: RemoteApi + ?Sized,
{
    let file = request.ticket.file.clone();
    let report = |progress: f64| {
        store.dispatch(Action::UploadProgress {
            graph_name: graph_name.to_string(),
            file: file.clone(),
            progress: progress.clamp(0.0, 1.0),
        });
    };
    report(0.0);

    let result = api.upload(request, &report).await;
    match &result {
        Ok(()) => {
            debug!(file = %file, multipart = request.is_multipart(), "upload complete");
            store.dispatch(Action::UploadComplete {
                graph_name: graph_name.to_string(),
                file: file.clone(),
            });
        }
        Err(err) => {
            warn!(file = %file, error = %err, "upload failed");
            store.dispatch(Action::UploadError {
                graph_name: graph_name.to_string(),
                file: file.clone(),
                message: err.to_string(),
            });
        }
    }
    UploadOutcome { file, result }
}

/// Pull `view` from the remote and overwrite-merge it into `main`.
///
/// Roles are resolved before sending. Leaves of `main` the view covers that
/// are missing from the response are deleted. Returns the update that was
/// merged.
#[instrument(skip(store, api, view))]
pub async fn pull<S, A>(store: &S, api: &A, view: &View) -> Result<Graph>
where
    S: Store,
    A: RemoteApi + ?Sized,
{
    view.validate()?;
    let remote = api.pull(&view.with_resolved_roles()).await?;

    let main = store
        .select(|state| state.graph(MAIN).cloned())
        .unwrap_or_default();
    let update = pull_update(view, &main, remote)?;
    info!(leaves = update.len(), "pull completed");

    store.dispatch(Action::Merge {
        graph_name: MAIN.to_string(),
        graph: update.clone(),
        mode: MergeMode::Overwrite,
    });
    Ok(update)
}

/// `remote` plus an explicit unset for every leaf of `main` covered by
/// `view` and absent from `remote`.
pub fn pull_update(view: &View, main: &Graph, remote: Graph) -> Result<Graph> {
    let covered = filter_graph(view, main)?;
    let mut update = remote;
    for (path, _) in covered.leaves() {
        if update.get(&path).is_some() {
            continue;
        }
        if let Some(unset) = Leaf::unset(&path) {
            update.set(path, unset)?;
        }
    }
    Ok(update)
}
