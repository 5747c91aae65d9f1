//! Query lifecycle controller

use super::state::{Presentation, SubmissionState};
use crate::models::Answer;
use crate::network::{ClientError, SearchService};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Proof that a submission was dispatched.
///
/// Carries the sequence number captured at dispatch time; only a ticket whose
/// sequence is still current may commit an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub sequence: u64,
    pub query: String,
}

struct Inner {
    draft: String,
    sequence: u64,
    state: SubmissionState,
    /// Bumped on every transition
    revision: u64,
}

/// Lock order: the watch value, then `inner`. `inner` is never held while
/// calling into the channel.
struct Shared {
    inner: Mutex<Inner>,
    publisher: watch::Sender<SubmissionState>,
    /// Revision currently held by the watch channel
    published: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sole owner of the [`SubmissionState`].
///
/// Clones share the same state; the rendering layer reads it through
/// [`QueryController::state`] or [`QueryController::subscribe`].
#[derive(Clone)]
pub struct QueryController {
    service: Arc<dyn SearchService>,
    shared: Arc<Shared>,
}

impl QueryController {
    /// Create an idle controller backed by the given service
    pub fn new(service: Arc<dyn SearchService>) -> Self {
        let (publisher, _) = watch::channel(SubmissionState::Idle);
        Self {
            service,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    draft: String::new(),
                    sequence: 0,
                    state: SubmissionState::Idle,
                    revision: 0,
                }),
                publisher,
                published: AtomicU64::new(0),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.lock()
    }

    /// Replace the editable draft text
    pub fn set_query_text(&self, text: impl Into<String>) {
        self.lock().draft = text.into();
    }

    /// Current draft text
    pub fn query_text(&self) -> String {
        self.lock().draft.clone()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SubmissionState {
        self.lock().state.clone()
    }

    /// Snapshot of the current state as a presentation view
    pub fn presentation(&self) -> Presentation {
        Presentation::from(&self.lock().state)
    }

    /// Sequence number of the most recent submission
    pub fn sequence(&self) -> u64 {
        self.lock().sequence
    }

    /// Receive every state transition
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.shared.publisher.subscribe()
    }

    /// Start a submission without dispatching it.
    ///
    /// Returns `None` when the draft is blank or a submission is already in
    /// flight; the state is untouched in both cases.
    pub fn begin(&self) -> Option<Ticket> {
        let ticket = {
            let mut inner = self.lock();

            if inner.state.is_pending() {
                debug!("Submission ignored: request already in flight");
                return None;
            }

            let query = inner.draft.trim().to_string();
            if query.is_empty() {
                debug!("Submission ignored: empty query");
                return None;
            }

            inner.sequence += 1;
            let ticket = Ticket {
                sequence: inner.sequence,
                query: query.clone(),
            };
            Self::transition(&mut inner, SubmissionState::Pending { query });
            ticket
        };

        self.publish();
        Some(ticket)
    }

    /// Commit the outcome of a submission.
    ///
    /// Outcomes for anything but the most recent submission are dropped.
    /// Returns whether the outcome was committed.
    pub fn reconcile(&self, ticket: &Ticket, outcome: Result<Answer, ClientError>) -> bool {
        {
            let mut inner = self.lock();

            if ticket.sequence != inner.sequence || !inner.state.is_pending() {
                debug!(
                    "Discarding stale result for submission {} (current {})",
                    ticket.sequence, inner.sequence
                );
                return false;
            }

            let next = match outcome {
                Ok(answer) => {
                    info!(
                        "Submission {} answered with {} sources",
                        ticket.sequence,
                        answer.sources.len()
                    );
                    SubmissionState::succeeded(answer)
                }
                Err(err) => {
                    warn!("Submission {} failed: {}", ticket.sequence, err);
                    SubmissionState::Failed {
                        message: err.user_message(),
                    }
                }
            };
            Self::transition(&mut inner, next);
        }

        self.publish();
        true
    }

    /// Submit the current draft.
    ///
    /// Dispatches the query on the tokio runtime and returns the task handle,
    /// or `None` if the call was a no-op. Must be called from within a runtime.
    pub fn submit(&self) -> Option<JoinHandle<()>> {
        let ticket = self.begin()?;
        let controller = self.clone();

        Some(tokio::spawn(async move {
            let outcome = controller.service.execute(&ticket.query).await;
            controller.reconcile(&ticket, outcome);
        }))
    }

    /// Return to `Idle`. Any request still in flight becomes stale.
    pub fn reset(&self) {
        {
            let mut inner = self.lock();
            inner.sequence += 1;
            Self::transition(&mut inner, SubmissionState::Idle);
        }
        self.publish();
    }

    fn transition(inner: &mut Inner, next: SubmissionState) {
        inner.state = next;
        inner.revision += 1;
    }

    /// Push the latest committed state to subscribers.
    ///
    /// Always copies the newest revision, so concurrent publishers can
    /// never move the channel back to an older state.
    fn publish(&self) {
        let shared = &self.shared;
        shared.publisher.send_if_modified(|slot| {
            let inner = shared.lock();
            if inner.revision == shared.published.load(Ordering::Acquire) {
                return false;
            }
            *slot = inner.state.clone();
            shared.published.store(inner.revision, Ordering::Release);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    type Outcome = Result<Answer, ClientError>;

    /// Service whose responses are released by the test, one per query
    #[derive(Default)]
    struct GatedService {
        gates: Mutex<HashMap<String, oneshot::Receiver<Outcome>>>,
        calls: AtomicUsize,
    }

    impl GatedService {
        fn gate(&self, query: &str) -> oneshot::Sender<Outcome> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(query.to_string(), rx);
            tx
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SearchService for GatedService {
        async fn execute(&self, query: &str) -> Outcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rx = self.gates.lock().unwrap().remove(query);
            match rx {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ClientError::Transport("gate dropped".into()))),
                None => Err(ClientError::Transport("no gate".into())),
            }
        }
    }

    /// Service that answers immediately by echoing the query
    #[derive(Default)]
    struct EchoService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SearchService for EchoService {
        async fn execute(&self, query: &str) -> Outcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query == "fail" {
                return Err(ClientError::Service("nope".into()));
            }
            Ok(Answer::new(
                format!("answer to {query}"),
                vec![Source::new(1, query, "https://example.org", "")],
            ))
        }
    }

    fn answer(text: &str) -> Outcome {
        Ok(Answer::new(text, vec![]))
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let service = Arc::new(GatedService::default());
        let controller = QueryController::new(service.clone());
        let gate = service.gate("capital of France");

        controller.set_query_text("capital of France");
        let handle = controller.submit().unwrap();
        assert_eq!(
            controller.state(),
            SubmissionState::Pending {
                query: "capital of France".into()
            }
        );
        assert!(controller.presentation().is_loading);

        let sources = vec![Source::new(1, "France", "https://x", "...").with_date("2023")];
        gate.send(Ok(Answer::new("Paris", sources.clone()))).unwrap();
        handle.await.unwrap();

        assert_eq!(
            controller.state(),
            SubmissionState::Succeeded {
                answer: "Paris".into(),
                sources
            }
        );
    }

    #[tokio::test]
    async fn test_blank_draft_is_noop() {
        let service = Arc::new(EchoService::default());
        let controller = QueryController::new(service.clone());

        for draft in ["", "   ", "\n\t"] {
            controller.set_query_text(draft);
            assert!(controller.submit().is_none());
            assert_eq!(controller.state(), SubmissionState::Idle);
        }
        assert_eq!(controller.sequence(), 0);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_draft_keeps_previous_result() {
        let service = Arc::new(EchoService::default());
        let controller = QueryController::new(service.clone());

        controller.set_query_text("rust");
        controller.submit().unwrap().await.unwrap();
        let before = controller.state();

        controller.set_query_text(" ");
        assert!(controller.submit().is_none());
        assert_eq!(controller.state(), before);
    }

    #[tokio::test]
    async fn test_submit_while_pending_is_noop() {
        let service = Arc::new(GatedService::default());
        let controller = QueryController::new(service.clone());
        let gate = service.gate("first");

        controller.set_query_text("first");
        let handle = controller.submit().unwrap();

        controller.set_query_text("second");
        assert!(controller.submit().is_none());
        assert_eq!(
            controller.state(),
            SubmissionState::Pending {
                query: "first".into()
            }
        );
        assert_eq!(controller.sequence(), 1);

        gate.send(answer("one")).unwrap();
        handle.await.unwrap();
        assert_eq!(service.calls(), 1);
        assert!(matches!(
            controller.state(),
            SubmissionState::Succeeded { ref answer, .. } if answer == "one"
        ));
    }

    #[tokio::test]
    async fn test_stale_result_is_discarded() {
        let service = Arc::new(GatedService::default());
        let controller = QueryController::new(service.clone());
        let gate_y = service.gate("y");
        let gate_z = service.gate("z");

        controller.set_query_text("y");
        let handle_y = controller.submit().unwrap();
        controller.reset();
        controller.set_query_text("z");
        let handle_z = controller.submit().unwrap();

        gate_z.send(answer("z answer")).unwrap();
        handle_z.await.unwrap();
        gate_y.send(answer("y answer")).unwrap();
        handle_y.await.unwrap();

        assert_eq!(
            controller.state(),
            SubmissionState::Succeeded {
                answer: "z answer".into(),
                sources: vec![]
            }
        );
    }

    #[tokio::test]
    async fn test_stale_result_does_not_resolve_newer_pending() {
        let service = Arc::new(GatedService::default());
        let controller = QueryController::new(service.clone());
        let gate_y = service.gate("y");
        let gate_z = service.gate("z");

        controller.set_query_text("y");
        let handle_y = controller.submit().unwrap();
        controller.reset();
        controller.set_query_text("z");
        let handle_z = controller.submit().unwrap();

        gate_y
            .send(Err(ClientError::Service("y failed".into())))
            .unwrap();
        handle_y.await.unwrap();
        assert_eq!(controller.state(), SubmissionState::Pending { query: "z".into() });

        gate_z.send(answer("z answer")).unwrap();
        handle_z.await.unwrap();
        assert!(matches!(
            controller.state(),
            SubmissionState::Succeeded { ref answer, .. } if answer == "z answer"
        ));
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_result() {
        let service = Arc::new(GatedService::default());
        let controller = QueryController::new(service.clone());
        let gate = service.gate("q");

        controller.set_query_text("q");
        let handle = controller.submit().unwrap();
        controller.reset();

        gate.send(answer("too late")).unwrap();
        handle.await.unwrap();
        assert!(controller.state().is_idle());
        assert!(controller.subscribe().borrow().is_idle());
    }

    #[test]
    fn test_reconcile_checks_sequence() {
        let controller = QueryController::new(Arc::new(EchoService::default()));

        controller.set_query_text("a");
        let first = controller.begin().unwrap();
        assert!(controller.reconcile(&first, answer("a")));
        // A second outcome for the same ticket is no longer pending.
        assert!(!controller.reconcile(&first, answer("again")));

        controller.set_query_text("b");
        let second = controller.begin().unwrap();
        assert_eq!(second.sequence, first.sequence + 1);
        assert!(!controller.reconcile(&first, answer("stale")));
        assert!(controller.reconcile(
            &second,
            Err(ClientError::MalformedResponse("missing field `answer`".into()))
        ));
        assert_eq!(
            controller.state(),
            SubmissionState::Failed {
                message: crate::network::MALFORMED_MESSAGE.into()
            }
        );
    }

    #[test]
    fn test_query_is_trimmed() {
        let controller = QueryController::new(Arc::new(EchoService::default()));
        controller.set_query_text("  spaced out  ");
        let ticket = controller.begin().unwrap();
        assert_eq!(ticket.query, "spaced out");
        assert_eq!(controller.query_text(), "  spaced out  ");
    }

    #[tokio::test]
    async fn test_every_submission_settles() {
        let service = Arc::new(EchoService::default());
        let controller = QueryController::new(service.clone());

        for query in ["alpha", "fail", "beta", "fail", "gamma"] {
            controller.set_query_text(query);
            controller.submit().unwrap().await.unwrap();

            let state = controller.state();
            assert!(!state.is_pending());
            match state {
                SubmissionState::Succeeded { answer, sources } => {
                    assert_eq!(answer, format!("answer to {query}"));
                    assert_eq!(sources[0].title, query);
                }
                SubmissionState::Failed { message } => {
                    assert_eq!(query, "fail");
                    assert_eq!(message, "nope");
                }
                other => panic!("unexpected state {other:?}"),
            }
        }
        assert_eq!(service.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let service = Arc::new(GatedService::default());
        let controller = QueryController::new(service.clone());
        let mut updates = controller.subscribe();
        let gate = service.gate("q");

        controller.set_query_text("q");
        let handle = controller.submit().unwrap();
        assert!(updates.has_changed().unwrap());
        assert!(updates.borrow_and_update().is_pending());

        gate.send(Err(ClientError::Transport("reset by peer".into())))
            .unwrap();
        handle.await.unwrap();
        updates.changed().await.unwrap();
        assert_eq!(
            *updates.borrow(),
            SubmissionState::Failed {
                message: crate::network::TRANSPORT_MESSAGE.into()
            }
        );
    }

    #[test]
    fn test_reset_while_renderer_holds_borrow() {
        let controller = QueryController::new(Arc::new(EchoService::default()));
        controller.set_query_text("q");
        controller.begin().unwrap();

        let rx = controller.subscribe();
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        let renderer = {
            let controller = controller.clone();
            let done_tx = done_tx.clone();
            std::thread::spawn(move || {
                let current = rx.borrow();
                std::thread::sleep(Duration::from_millis(100));
                let view = controller.presentation();
                drop(current);
                done_tx.send("renderer").unwrap();
                view
            })
        };
        let resetter = {
            let controller = controller.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                controller.reset();
                done_tx.send("reset").unwrap();
            })
        };

        for _ in 0..2 {
            done_rx
                .recv_timeout(Duration::from_secs(3))
                .expect("renderer and reset both finish");
        }
        renderer.join().unwrap();
        resetter.join().unwrap();

        assert!(controller.state().is_idle());
        assert!(controller.subscribe().borrow().is_idle());
    }

    #[test]
    fn test_channel_matches_state_after_concurrent_transitions() {
        let controller = QueryController::new(Arc::new(EchoService::default()));

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let controller = controller.clone();
                std::thread::spawn(move || {
                    for round in 0..200 {
                        controller.set_query_text(format!("q{worker}-{round}"));
                        if let Some(ticket) = controller.begin() {
                            controller.reconcile(&ticket, answer(&ticket.query));
                        }
                        if round % 7 == 0 {
                            controller.reset();
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(*controller.subscribe().borrow(), controller.state());
    }
}
