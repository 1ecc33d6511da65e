//! Client-side cache of the submission list.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::watch;

use crate::flows::errors::{require_success, FlowError};
use crate::schemas::gateway::Action;
use crate::schemas::submission::{decode_records, SubmissionRecord};
use crate::services::gateway::SharedGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
}

/// One generation of the cache. `revision` grows on every replacement.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub revision: u64,
    pub records: Arc<Vec<SubmissionRecord>>,
}

#[derive(Clone)]
pub struct SubmissionStore {
    gateway: SharedGateway,
    snapshot: Arc<watch::Sender<Snapshot>>,
    status: Arc<watch::Sender<LoadStatus>>,
}

impl SubmissionStore {
    pub fn new(gateway: SharedGateway) -> Self {
        let (snapshot, _) = watch::channel(Snapshot::default());
        let (status, _) = watch::channel(LoadStatus::Idle);
        Self { gateway, snapshot: Arc::new(snapshot), status: Arc::new(status) }
    }

    /// Replaces the cache with the gateway's `list`. A loud refresh raises the
    /// loading flag for its duration; a silent one leaves it alone. Concurrent
    /// refreshes are not coordinated: the last reply to land wins.
    pub async fn refresh(&self, silent: bool) -> Result<usize, FlowError> {
        if !silent {
            self.status.send_replace(LoadStatus::Loading);
        }

        let result = require_success(self.gateway.call(Action::List, json!({})).await);

        let outcome = match result {
            Ok(reply) => {
                let records = decode_records(reply.data);
                let count = records.len();
                self.replace(records);
                tracing::debug!(count, silent, "Submission cache refreshed");
                Ok(count)
            }
            Err(err) => {
                tracing::warn!(error = %err, silent, "Submission refresh failed; keeping cache");
                Err(err)
            }
        };

        if !silent {
            self.status.send_replace(LoadStatus::Idle);
        }

        outcome
    }

    pub fn records(&self) -> Arc<Vec<SubmissionRecord>> {
        self.snapshot.borrow().records.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    pub fn status(&self) -> LoadStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<LoadStatus> {
        self.status.subscribe()
    }

    fn replace(&self, records: Vec<SubmissionRecord>) {
        let records = Arc::new(records);
        self.snapshot.send_modify(|snapshot| {
            snapshot.revision += 1;
            snapshot.records = records;
        });
    }
}
