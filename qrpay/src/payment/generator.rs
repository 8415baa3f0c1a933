use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{GeneratorError, ValidationError};
use crate::payment::StatusSource;
use crate::payment::address::{AddressValidator, validator_for};
use crate::payment::config::PaymentConfig;
use crate::payment::encoder::{Artifact, Encoder};
use crate::payment::request::{BusinessContext, PaymentRequest, Reference, RequestInput};
use crate::payment::schedule::{IntervalScheduler, PollHandle, Scheduler};
use crate::payment::session::{Session, SessionState, SessionView};

/// Turns "request payment now" into a displayed payment code and tracks it
/// until the status endpoint reports a terminal outcome.
///
/// At most one session is active per generator. Creating a new request or
/// cancelling stops the previous poll loop before anything else happens, and
/// results that arrive for a reference that is no longer active are dropped.
///
/// Poll loops are spawned onto the current Tokio runtime, so
/// [`create_request`](Self::create_request) must be called from within one.
#[derive(Debug)]
pub struct PaymentRequestGenerator {
    config: PaymentConfig,
    status: Arc<dyn StatusSource>,
    encoder: Arc<dyn Encoder>,
    scheduler: Arc<dyn Scheduler>,
    validator: Arc<dyn AddressValidator>,
    context: RwLock<BusinessContext>,
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    slot: Mutex<Slot>,
    updates: watch::Sender<SessionView>,
}

#[derive(Debug)]
struct Slot {
    state: SessionState,
    session: Option<Session>,
    poller: Option<PollHandle>,
}

impl Slot {
    fn view(&self) -> SessionView {
        SessionView {
            state: self.state.clone(),
            request: self.session.as_ref().map(|s| (*s.request).clone()),
            payload: self
                .session
                .as_ref()
                .map(|s| s.artifact.payload().to_string()),
        }
    }

    fn stop_poller(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }
}

impl Shared {
    fn publish(&self, slot: &Slot) {
        self.updates.send_replace(slot.view());
    }

    /// Applies a poll outcome if `reference` is still the active session.
    fn apply(&self, reference: &Reference, token: &CancellationToken, state: SessionState) -> bool {
        let mut slot = self.slot.lock();
        let active = !token.is_cancelled()
            && slot
                .session
                .as_ref()
                .is_some_and(|s| &s.request.reference == reference);
        if !active {
            return false;
        }
        if state.is_terminal() {
            slot.poller = None;
        }
        slot.state = state;
        self.publish(&slot);
        true
    }
}

impl PaymentRequestGenerator {
    pub fn new(
        config: PaymentConfig,
        status: Arc<dyn StatusSource>,
        encoder: Arc<dyn Encoder>,
    ) -> Self {
        let scheduler = Arc::new(IntervalScheduler::new(config.poll_interval()));
        let validator = validator_for(config.strict_address);
        let (updates, _) = watch::channel(SessionView::idle());
        Self {
            config,
            status,
            encoder,
            scheduler,
            validator,
            context: RwLock::new(BusinessContext::default()),
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    state: SessionState::Idle,
                    session: None,
                    poller: None,
                }),
                updates,
            }),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn AddressValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_business_context(self, context: BusinessContext) -> Self {
        self.set_business_context(context);
        self
    }

    pub fn business_context(&self) -> BusinessContext {
        self.context.read().clone()
    }

    /// Replaces the business details used for labels and the default
    /// recipient. Affects requests created afterwards only.
    pub fn set_business_context(&self, context: BusinessContext) {
        *self.context.write() = context;
    }

    /// Creates a new payment request and starts polling its status.
    ///
    /// Any previous session is stopped first, whether or not this call
    /// succeeds. On error the generator is left `Idle` with nothing polling.
    pub fn create_request(&self, input: RequestInput) -> Result<Session, GeneratorError> {
        let mut slot = self.shared.slot.lock();
        if slot.state.is_polling()
            && let Some(previous) = &slot.session
        {
            info!(
                "Abandoning payment session {} for a new request",
                previous.request.reference
            );
        }
        slot.stop_poller();
        slot.session = None;
        slot.state = SessionState::Generating;
        self.shared.publish(&slot);

        let (request, artifact) = match self.build(&input) {
            Ok(built) => built,
            Err(e) => {
                warn!("Payment request not created: {}", e);
                slot.state = SessionState::Idle;
                self.shared.publish(&slot);
                return Err(e);
            }
        };

        let token = CancellationToken::new();
        let poll_loop = PollLoop {
            shared: self.shared.clone(),
            status: self.status.clone(),
            scheduler: self.scheduler.clone(),
            request: request.clone(),
            token: token.clone(),
            enforce_expiry: self.config.enforce_expiry,
        };
        let task = tokio::spawn(poll_loop.run());

        let session = Session { request, artifact };
        slot.session = Some(session.clone());
        slot.state = SessionState::Polling;
        slot.poller = Some(PollHandle::new(token, task));
        self.shared.publish(&slot);

        info!(
            "Payment request {} created: {} {} to {} (expires {})",
            session.request.reference,
            session.request.amount,
            session.request.currency,
            session.request.recipient_address,
            session.request.expires_at
        );
        Ok(session)
    }

    /// Stops polling and discards the displayed request. No-op when nothing
    /// is displayed.
    pub fn cancel_request(&self) {
        let mut slot = self.shared.slot.lock();
        let next = match &slot.state {
            SessionState::Idle | SessionState::Cancelled => return,
            SessionState::Generating | SessionState::Polling => SessionState::Cancelled,
            // already resolved; just clear the display
            SessionState::Succeeded { .. }
            | SessionState::Failed { .. }
            | SessionState::Expired => SessionState::Idle,
        };
        slot.stop_poller();
        if let Some(session) = slot.session.take()
            && next == SessionState::Cancelled
        {
            info!("Payment session {} cancelled", session.request.reference);
        }
        slot.state = next;
        self.shared.publish(&slot);
    }

    pub fn snapshot(&self) -> SessionView {
        self.shared.slot.lock().view()
    }

    pub fn state(&self) -> SessionState {
        self.shared.slot.lock().state.clone()
    }

    /// Receives the latest [`SessionView`] after each transition.
    ///
    /// Only the most recent view is retained. A request that replaces a
    /// polling session cancels and discards it while holding the session
    /// lock, so subscribers observe the new `Polling` view (or `Idle` on
    /// error) directly. The abandoned reference never produces another
    /// update.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.shared.updates.subscribe()
    }

    pub fn current(&self) -> Option<Session> {
        self.shared.slot.lock().session.clone()
    }

    pub fn artifact(&self) -> Option<Arc<Artifact>> {
        self.current().map(|session| session.artifact)
    }

    fn build(
        &self,
        input: &RequestInput,
    ) -> Result<(Arc<PaymentRequest>, Arc<Artifact>), GeneratorError> {
        let context = self.business_context();
        let recipient = input
            .recipient
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .or(context.recipient.clone())
            .ok_or(ValidationError::MissingRecipient)?;
        self.validator.validate(&recipient)?;

        let request = PaymentRequest::assemble(
            recipient,
            input.memo.as_deref(),
            &context,
            &self.config,
            Utc::now(),
        )?;
        let descriptor = request.descriptor();
        debug!("Encoding payment descriptor: {:?}", descriptor);
        let artifact = self.encoder.encode_and_render(&descriptor)?;
        Ok((Arc::new(request), Arc::new(artifact)))
    }
}

impl Drop for PaymentRequestGenerator {
    fn drop(&mut self) {
        self.shared.slot.lock().stop_poller();
    }
}

struct PollLoop {
    shared: Arc<Shared>,
    status: Arc<dyn StatusSource>,
    scheduler: Arc<dyn Scheduler>,
    request: Arc<PaymentRequest>,
    token: CancellationToken,
    enforce_expiry: bool,
}

impl PollLoop {
    async fn run(self) {
        let reference = &self.request.reference;
        let mut tick: u64 = 0;
        loop {
            if self.enforce_expiry && self.request.is_expired(Utc::now()) {
                if self.shared.apply(reference, &self.token, SessionState::Expired) {
                    info!("Payment session {} expired unpaid", reference);
                }
                break;
            }

            tick += 1;
            let result = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                result = self.status.fetch_status(reference.as_str()) => result,
            };
            match result {
                Ok(status) => match SessionState::from_status(status) {
                    Some(terminal) => {
                        let summary = format!("{:?}", terminal);
                        if self.shared.apply(reference, &self.token, terminal) {
                            info!("Payment session {} resolved: {}", reference, summary);
                        } else {
                            warn!("Discarding status for stale payment reference {}", reference);
                        }
                        break;
                    }
                    None => debug!("Payment {} pending (tick {})", reference, tick),
                },
                Err(e) => warn!(
                    "Status check for {} failed on tick {}: {}; retrying on next tick",
                    reference, tick, e
                ),
            }

            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = self.scheduler.wait() => {}
            }
        }
        debug!("Poll loop for {} stopped after {} ticks", reference, tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendClientError, PaymentStatus};
    use crate::error::EncodingError;
    use crate::payment::address::BasicAddressValidator;
    use crate::payment::request::PaymentDescriptor;
    use crate::payment::schedule::StepScheduler;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Pending;

    #[async_trait]
    impl StatusSource for Pending {
        async fn fetch_status(&self, _: &str) -> Result<PaymentStatus, BackendClientError> {
            Ok(PaymentStatus::pending())
        }
    }

    #[derive(Debug)]
    struct PlainEncoder;

    impl Encoder for PlainEncoder {
        fn encode_and_render(&self, d: &PaymentDescriptor) -> Result<Artifact, EncodingError> {
            Ok(Artifact::new(format!("solana:{}", d.recipient), Vec::new()))
        }
    }

    fn generator() -> PaymentRequestGenerator {
        PaymentRequestGenerator::new(
            PaymentConfig::default(),
            Arc::new(Pending),
            Arc::new(PlainEncoder),
        )
        .with_scheduler(Arc::new(StepScheduler::new()))
        .with_validator(Arc::new(BasicAddressValidator))
    }

    fn create(generator: &PaymentRequestGenerator) -> Session {
        generator
            .create_request(RequestInput::for_recipient("ValidAddr123"))
            .unwrap()
    }

    #[tokio::test]
    async fn stale_reference_is_not_applied() {
        let generator = generator();
        let first = create(&generator);
        let second = create(&generator);

        let applied = generator.shared.apply(
            &first.request.reference,
            &CancellationToken::new(),
            SessionState::Succeeded {
                signature: Some("late".into()),
                amount: None,
            },
        );
        assert!(!applied);
        let view = generator.snapshot();
        assert_eq!(view.state, SessionState::Polling);
        assert_eq!(view.reference(), Some(second.request.reference.as_str()));
    }

    #[tokio::test]
    async fn cancelled_token_is_not_applied() {
        let generator = generator();
        let session = create(&generator);
        let token = CancellationToken::new();
        token.cancel();

        let applied = generator.shared.apply(
            &session.request.reference,
            &token,
            SessionState::Failed {
                error: "late".into(),
            },
        );
        assert!(!applied);
        assert_eq!(generator.state(), SessionState::Polling);
    }

    #[tokio::test]
    async fn replacement_is_observed_as_the_new_session() {
        let generator = generator();
        let first = create(&generator);
        let mut updates = generator.subscribe();
        updates.mark_unchanged();

        let second = create(&generator);
        assert!(updates.has_changed().unwrap());
        let view = updates.borrow_and_update().clone();
        assert_eq!(view.state, SessionState::Polling);
        assert_eq!(view.reference(), Some(second.request.reference.as_str()));
        assert_ne!(view.reference(), Some(first.request.reference.as_str()));

        assert!(!generator.shared.apply(
            &first.request.reference,
            &CancellationToken::new(),
            SessionState::Failed {
                error: "late".into()
            },
        ));
        assert!(!updates.has_changed().unwrap());
    }

    #[tokio::test]
    async fn terminal_outcome_releases_poller_and_cancel_clears_display() {
        let generator = generator();
        let session = create(&generator);
        let mut updates = generator.subscribe();

        let applied = generator.shared.apply(
            &session.request.reference,
            &CancellationToken::new(),
            SessionState::Succeeded {
                signature: Some("sig".into()),
                amount: Some(15.0),
            },
        );
        assert!(applied);
        assert!(generator.shared.slot.lock().poller.is_none());
        assert!(updates.has_changed().unwrap());
        assert!(updates.borrow_and_update().state.is_terminal());
        assert!(generator.artifact().is_some());

        generator.cancel_request();
        assert_eq!(generator.snapshot(), SessionView::idle());
    }
}
