//! Offline write interception
//!
//! [`OfflineStudyStore`] sits in front of a [`StudyStore`]. Writes go to the
//! remote store first. When that fails because the device is offline the
//! write is handed to the [`OfflineQueue`] together with a closure that
//! replays it, and the caller gets an optimistic [`WriteReceipt`] marked as
//! queued. Any other failure is returned unchanged and nothing is queued.
//! Reads are never intercepted.

use std::future::Future;
use std::sync::Arc;

use certprep_common::error::CommonError;
use certprep_common::sync::queue::{
    operation, EnqueueRequest, OfflineQueue, OperationFn, OperationType, ProcessSummary,
    QueueError,
};
use certprep_common::sync::RetryPolicies;
use certprep_common::NumericIdGenerator;
use certprep_domain::constants::TEMP_ID_PREFIX;
use certprep_domain::{
    Attempt, AttemptDraft, BatchCommit, Note, NoteChanges, NoteDraft, Quiz, QuizChanges,
    QuizDraft, Result, StudyError, StudyWrite, Updated, WriteReceipt,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::ports::StudyStore;

const SERVICE_NAME: &str = "study_store";

/// Whether a store error means "could not reach the store"
///
/// `Network` always counts. Validation, not-found, permission, config and
/// queue failures never do, whatever their message says. Storage and
/// internal errors are judged by their own message (`Failed to fetch`,
/// `offline`, `timed out`, ...), never by the variant's display prefix.
pub fn is_connectivity_failure(err: &StudyError) -> bool {
    match err {
        StudyError::Network(_) => true,
        StudyError::Validation(_)
        | StudyError::NotFound(_)
        | StudyError::PermissionDenied(_)
        | StudyError::Config(_)
        | StudyError::Queue(_) => false,
        StudyError::Storage(message) | StudyError::Internal(message) => {
            RetryPolicies::message_is_connectivity(message)
        }
    }
}

/// Replay failures keep the store's message; only connectivity failures are
/// flagged retryable.
fn replay_error(err: StudyError) -> CommonError {
    let retryable = is_connectivity_failure(&err);
    CommonError::backend(SERVICE_NAME, err.to_string(), retryable)
}

fn queue_error(err: QueueError) -> StudyError {
    StudyError::Queue(err.to_string())
}

/// [`StudyStore`] front end that queues writes while offline
pub struct OfflineStudyStore {
    remote: Arc<dyn StudyStore>,
    queue: OfflineQueue<StudyWrite>,
    temp_ids: NumericIdGenerator,
}

impl OfflineStudyStore {
    pub fn new(remote: Arc<dyn StudyStore>, queue: OfflineQueue<StudyWrite>) -> Self {
        Self { remote, queue, temp_ids: NumericIdGenerator::new() }
    }

    /// Use a specific id generator for optimistic ids
    pub fn with_temp_ids(mut self, temp_ids: NumericIdGenerator) -> Self {
        self.temp_ids = temp_ids;
        self
    }

    pub fn queue(&self) -> &OfflineQueue<StudyWrite> {
        &self.queue
    }

    /// Replay queued writes now instead of waiting for reconnect
    pub async fn sync_now(&self) -> Result<ProcessSummary> {
        self.queue.process_queue().await.map_err(queue_error)
    }

    /// Whether writes are still waiting to reach the store
    pub fn has_pending_writes(&self) -> bool {
        self.queue.has_pending_operations()
    }

    pub async fn create_quiz(&self, draft: QuizDraft) -> Result<WriteReceipt<Quiz>> {
        let replay = {
            let draft = draft.clone();
            self.replay(move |remote| {
                let draft = draft.clone();
                async move { remote.create_quiz(&draft).await.map(|_| ()) }
            })
        };

        let write = StudyWrite::CreateQuiz(draft.clone());
        let pending = draft.clone();
        self.intercept(
            self.remote.create_quiz(&draft),
            OperationType::Create,
            write,
            replay,
            |temp_id| Quiz::new(temp_id, pending),
        )
        .await
    }

    pub async fn update_quiz(
        &self,
        id: &str,
        changes: QuizChanges,
    ) -> Result<WriteReceipt<Updated<QuizChanges>>> {
        let replay = {
            let (id, changes) = (id.to_string(), changes.clone());
            self.replay(move |remote| {
                let (id, changes) = (id.clone(), changes.clone());
                async move { remote.update_quiz(&id, &changes).await }
            })
        };

        let write = StudyWrite::UpdateQuiz { id: id.to_string(), changes: changes.clone() };
        let echo = Updated::new(id, changes);
        let applied = echo.clone();
        let remote = self.remote.as_ref();
        self.intercept(
            async move {
                remote.update_quiz(&applied.id, &applied.changes).await.map(|()| applied)
            },
            OperationType::Update,
            write,
            replay,
            |_| echo,
        )
        .await
    }

    pub async fn create_note(&self, draft: NoteDraft) -> Result<WriteReceipt<Note>> {
        let replay = {
            let draft = draft.clone();
            self.replay(move |remote| {
                let draft = draft.clone();
                async move { remote.create_note(&draft).await.map(|_| ()) }
            })
        };

        let write = StudyWrite::CreateNote(draft.clone());
        let pending = draft.clone();
        self.intercept(
            self.remote.create_note(&draft),
            OperationType::Create,
            write,
            replay,
            |temp_id| Note::new(temp_id, pending),
        )
        .await
    }

    pub async fn update_note(
        &self,
        id: &str,
        changes: NoteChanges,
    ) -> Result<WriteReceipt<Updated<NoteChanges>>> {
        let replay = {
            let (id, changes) = (id.to_string(), changes.clone());
            self.replay(move |remote| {
                let (id, changes) = (id.clone(), changes.clone());
                async move { remote.update_note(&id, &changes).await }
            })
        };

        let write = StudyWrite::UpdateNote { id: id.to_string(), changes: changes.clone() };
        let echo = Updated::new(id, changes);
        let applied = echo.clone();
        let remote = self.remote.as_ref();
        self.intercept(
            async move {
                remote.update_note(&applied.id, &applied.changes).await.map(|()| applied)
            },
            OperationType::Update,
            write,
            replay,
            |_| echo,
        )
        .await
    }

    pub async fn record_attempt(&self, draft: AttemptDraft) -> Result<WriteReceipt<Attempt>> {
        let replay = {
            let draft = draft.clone();
            self.replay(move |remote| {
                let draft = draft.clone();
                async move { remote.record_attempt(&draft).await.map(|_| ()) }
            })
        };

        let write = StudyWrite::RecordAttempt(draft.clone());
        let pending = draft.clone();
        self.intercept(
            self.remote.record_attempt(&draft),
            OperationType::Create,
            write,
            replay,
            |temp_id| Attempt::new(temp_id, pending),
        )
        .await
    }

    /// Commit a batch, queueing it if the store is unreachable
    ///
    /// The receipt echoes the collection and payload that were sent, since
    /// the store returns nothing for a batch.
    pub async fn commit_batch(
        &self,
        collection: &str,
        payload: Value,
    ) -> Result<WriteReceipt<BatchCommit>> {
        let replay = {
            let (collection, payload) = (collection.to_string(), payload.clone());
            self.replay(move |remote| {
                let (collection, payload) = (collection.clone(), payload.clone());
                async move { remote.commit_batch(&collection, &payload).await }
            })
        };

        let write = StudyWrite::Batch { collection: collection.to_string(), payload: payload.clone() };
        let echo = BatchCommit { collection: collection.to_string(), payload };
        let applied = echo.clone();
        let remote = self.remote.as_ref();
        self.intercept(
            async move {
                remote.commit_batch(&applied.collection, &applied.payload).await.map(|()| applied)
            },
            OperationType::Batch,
            write,
            replay,
            |_| echo,
        )
        .await
    }

    /// Queue a batch write without trying the store first
    ///
    /// `operation` performs the write on replay; `payload` is what the queue
    /// persists and shows. Returns the queue id.
    pub fn enqueue_batch(
        &self,
        collection: &str,
        payload: Value,
        operation: OperationFn,
    ) -> Result<String> {
        let write = StudyWrite::Batch { collection: collection.to_string(), payload };
        let id = self
            .queue
            .enqueue(EnqueueRequest::new(OperationType::Batch, collection, write, operation))
            .map_err(queue_error)?;
        debug!(queue_id = %id, collection, "Batch write queued");
        Ok(id)
    }

    pub async fn get_quiz(&self, id: &str) -> Result<Quiz> {
        self.remote.get_quiz(id).await
    }

    pub async fn list_quizzes(&self, certification: Option<&str>) -> Result<Vec<Quiz>> {
        self.remote.list_quizzes(certification).await
    }

    pub async fn get_note(&self, id: &str) -> Result<Note> {
        self.remote.get_note(id).await
    }

    /// Wrap a remote call as a queue operation
    ///
    /// `call` is invoked once per attempt with the remote store and must
    /// carry its own copy of the write's arguments.
    fn replay<F, Fut>(&self, call: F) -> OperationFn
    where
        F: Fn(Arc<dyn StudyStore>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let remote = Arc::clone(&self.remote);
        operation(move || {
            let attempt = call(Arc::clone(&remote));
            async move { attempt.await.map_err(replay_error) }
        })
    }

    async fn intercept<T, Fut>(
        &self,
        attempt: Fut,
        kind: OperationType,
        write: StudyWrite,
        replay: OperationFn,
        optimistic: impl FnOnce(String) -> T,
    ) -> Result<WriteReceipt<T>>
    where
        Fut: Future<Output = Result<T>>,
    {
        let err = match attempt.await {
            Ok(value) => return Ok(WriteReceipt::confirmed(value)),
            Err(err) if is_connectivity_failure(&err) => err,
            Err(err) => return Err(err),
        };

        let collection = write.collection();
        let queue_id = self
            .queue
            .enqueue(EnqueueRequest::new(kind, collection.as_str(), write, replay))
            .map_err(queue_error)?;

        warn!(
            queue_id = %queue_id,
            kind = %kind,
            collection = %collection,
            error = %err,
            "Study store unreachable, write queued for replay"
        );

        let temp_id = format!("{TEMP_ID_PREFIX}{}", self.temp_ids.next_id());
        Ok(WriteReceipt::queued(optimistic(temp_id), queue_id))
    }
}
