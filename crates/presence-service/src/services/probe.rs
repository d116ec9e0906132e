//! Fresh fetch-and-evaluate of one subject's status

use std::sync::Arc;

use presence_core::{
    Clock, RecordFilter, RecordStore, StatusEvaluator, StoreResult, SubjectId,
    USERS_STATUS_COLLECTION,
};
use tracing::instrument;

/// Reads a subject's record and applies the staleness rule
#[derive(Clone)]
pub struct StatusProbe {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    evaluator: StatusEvaluator,
}

impl StatusProbe {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, evaluator: StatusEvaluator) -> Self {
        Self {
            store,
            clock,
            evaluator,
        }
    }

    /// Fetch the record (bypassing any cache) and evaluate it at the current time
    #[instrument(skip(self))]
    pub async fn probe(&self, subject_id: &SubjectId) -> StoreResult<bool> {
        let record = self
            .store
            .query_one(
                USERS_STATUS_COLLECTION,
                &RecordFilter::subject(subject_id.clone()),
            )
            .await?;

        Ok(self.evaluator.evaluate(record.as_ref(), self.clock.now()))
    }

    pub fn evaluator(&self) -> StatusEvaluator {
        self.evaluator
    }
}

impl std::fmt::Debug for StatusProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusProbe")
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}
