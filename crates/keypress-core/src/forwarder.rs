#![forbid(unsafe_code)]

//! The key-down handler.
//!
//! [`Forwarder::on_key_down`] issues exactly one request per accepted key and
//! arranges exactly one reload, whatever the network does. The host supplies
//! the I/O through two seams:
//!
//! - [`Transport`] issues the GET and hands back a future for its completion.
//!   The payload is never exposed; only success or failure is observable.
//! - [`Reloader`] reloads the page.
//!
//! The returned [`KeyDispatch`] carries a `settle` future that the host must
//! drive (`spawn_local` in the browser, `block_on` natively). It logs the
//! outcome and, under [`ReloadPolicy::AfterSettle`], performs the reload.
//! Nothing in this module blocks or spawns.

use core::future::Future;
use core::pin::Pin;
use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{ForwarderConfig, ReloadPolicy};
use crate::error::{ForwardError, TransportError};
use crate::key::KeyDown;
use crate::request::KeypressRequest;

/// Completion of an issued request.
pub type Completion = Result<(), TransportError>;

/// Issues keypress requests.
pub trait Transport {
    type Pending: Future<Output = Completion> + 'static;

    /// Start the GET for `request`.
    ///
    /// The request must be in flight when this returns; awaiting the returned
    /// future only observes completion.
    fn issue(&self, request: &KeypressRequest) -> Self::Pending;
}

/// Reloads the hosting page.
pub trait Reloader {
    fn reload(&self);
}

/// How an issued request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Delivered,
    Failed(TransportError),
}

impl Settlement {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Snapshot of forwarder counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForwardStats {
    pub keys_seen: u64,
    pub keys_rejected: u64,
    pub requests_issued: u64,
    pub requests_failed: u64,
    pub reloads: u64,
}

#[derive(Debug, Default)]
struct Counters {
    keys_seen: Cell<u64>,
    keys_rejected: Cell<u64>,
    requests_issued: Cell<u64>,
    requests_failed: Cell<u64>,
    reloads: Cell<u64>,
}

impl Counters {
    fn bump(cell: &Cell<u64>) {
        cell.set(cell.get().saturating_add(1));
    }

    fn snapshot(&self) -> ForwardStats {
        ForwardStats {
            keys_seen: self.keys_seen.get(),
            keys_rejected: self.keys_rejected.get(),
            requests_issued: self.requests_issued.get(),
            requests_failed: self.requests_failed.get(),
            reloads: self.reloads.get(),
        }
    }
}

/// One handled key-down.
pub struct KeyDispatch {
    pub request: KeypressRequest,
    /// Whether the reload already happened inside `on_key_down`.
    pub reloaded: bool,
    /// Observes the request; reloads under [`ReloadPolicy::AfterSettle`].
    pub settle: Pin<Box<dyn Future<Output = Settlement>>>,
}

impl core::fmt::Debug for KeyDispatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyDispatch")
            .field("request", &self.request)
            .field("reloaded", &self.reloaded)
            .finish_non_exhaustive()
    }
}

pub struct Forwarder<T, R> {
    config: ForwarderConfig,
    transport: T,
    reloader: Rc<R>,
    counters: Rc<Counters>,
}

impl<T, R> Forwarder<T, R>
where
    T: Transport,
    R: Reloader + 'static,
{
    /// Create a forwarder. The config is validated (prefix normalized).
    pub fn new(config: ForwarderConfig, transport: T, reloader: R) -> Result<Self, ForwardError> {
        Ok(Self {
            config: config.validated()?,
            transport,
            reloader: Rc::new(reloader),
            counters: Rc::default(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn reloader(&self) -> &R {
        &self.reloader
    }

    #[must_use]
    pub fn stats(&self) -> ForwardStats {
        self.counters.snapshot()
    }

    /// Handle one key-down.
    ///
    /// Fails only for an empty key identifier, in which case nothing is sent
    /// and nothing is reloaded. Network failures are reported by the settle
    /// future and never change what happens here.
    pub fn on_key_down(&self, event: &KeyDown) -> Result<KeyDispatch, ForwardError> {
        Counters::bump(&self.counters.keys_seen);
        let request = match KeypressRequest::build(&self.config, &event.key) {
            Ok(request) => request,
            Err(err) => {
                Counters::bump(&self.counters.keys_rejected);
                warn!(key = %event.key, error = %err, "key-down ignored");
                return Err(err);
            }
        };

        let pending = self.transport.issue(&request);
        Counters::bump(&self.counters.requests_issued);
        debug!(
            path = %request.path,
            repeat = event.repeat,
            reload = self.config.reload.label(),
            "keypress issued"
        );

        let reload_now = self.config.reload == ReloadPolicy::Immediate;
        if reload_now {
            self.reload();
        }

        let deferred_reload = (!reload_now).then(|| Rc::clone(&self.reloader));
        let counters = Rc::clone(&self.counters);
        let path = request.path.clone();
        let settle = Box::pin(async move {
            let settlement = match pending.await {
                Ok(()) => {
                    debug!(path = %path, "keypress delivered");
                    Settlement::Delivered
                }
                Err(err) => {
                    Counters::bump(&counters.requests_failed);
                    warn!(path = %path, error = %err, "keypress request failed");
                    Settlement::Failed(err)
                }
            };
            if let Some(reloader) = deferred_reload {
                Counters::bump(&counters.reloads);
                reloader.reload();
            }
            settlement
        });

        Ok(KeyDispatch {
            request,
            reloaded: reload_now,
            settle,
        })
    }

    fn reload(&self) {
        Counters::bump(&self.counters.reloads);
        self.reloader.reload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::PathStyle;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::future::{Ready, ready};
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Ordered log of host-visible effects.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Effect {
        Get(String),
        Reload,
    }

    type Journal = Rc<RefCell<Vec<Effect>>>;

    struct ScriptedTransport {
        journal: Journal,
        outcome: Completion,
    }

    impl Transport for ScriptedTransport {
        type Pending = Ready<Completion>;

        fn issue(&self, request: &KeypressRequest) -> Self::Pending {
            self.journal
                .borrow_mut()
                .push(Effect::Get(request.path.clone()));
            ready(self.outcome.clone())
        }
    }

    struct JournalReloader(Journal);

    impl Reloader for JournalReloader {
        fn reload(&self) {
            self.0.borrow_mut().push(Effect::Reload);
        }
    }

    fn forwarder(
        style: PathStyle,
        reload: ReloadPolicy,
        outcome: Completion,
    ) -> (Forwarder<ScriptedTransport, JournalReloader>, Journal) {
        let journal = Journal::default();
        let config = ForwarderConfig::default()
            .with_style(style)
            .with_reload(reload);
        let transport = ScriptedTransport {
            journal: Rc::clone(&journal),
            outcome,
        };
        let fwd = Forwarder::new(config, transport, JournalReloader(Rc::clone(&journal)))
            .expect("default config is valid");
        (fwd, journal)
    }

    /// Records `(level, message)` for every event.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

    struct MessageVisitor<'a>(&'a mut String);

    impl Visit for MessageVisitor<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn core::fmt::Debug) {
            if field.name() == "message" {
                *self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: Subscriber> Layer<S> for CapturedLogs {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut message = String::new();
            event.record(&mut MessageVisitor(&mut message));
            self.0
                .lock()
                .expect("log capture lock")
                .push((*event.metadata().level(), message));
        }
    }

    fn count(journal: &Journal, pred: impl Fn(&Effect) -> bool) -> usize {
        journal.borrow().iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn immediate_reload_happens_before_settle() {
        let (fwd, journal) = forwarder(PathStyle::QueryEcho, ReloadPolicy::Immediate, Ok(()));
        let dispatch = fwd.on_key_down(&KeyDown::new("a")).unwrap();
        assert!(dispatch.reloaded);
        assert_eq!(
            *journal.borrow(),
            vec![Effect::Get("/keypress/A?key-A=".into()), Effect::Reload]
        );

        let settlement = pollster::block_on(dispatch.settle);
        assert_eq!(settlement, Settlement::Delivered);
        assert_eq!(count(&journal, |e| *e == Effect::Reload), 1);
    }

    #[test]
    fn after_settle_reload_waits_for_completion() {
        let (fwd, journal) = forwarder(PathStyle::Plain, ReloadPolicy::AfterSettle, Ok(()));
        let dispatch = fwd.on_key_down(&KeyDown::new("Backspace")).unwrap();
        assert!(!dispatch.reloaded);
        assert_eq!(*journal.borrow(), vec![Effect::Get("/keypress/Delete".into())]);

        pollster::block_on(dispatch.settle);
        assert_eq!(
            *journal.borrow(),
            vec![Effect::Get("/keypress/Delete".into()), Effect::Reload]
        );
    }

    #[test]
    fn rejection_is_contained_and_reload_still_happens() {
        for policy in [ReloadPolicy::Immediate, ReloadPolicy::AfterSettle] {
            let (fwd, journal) = forwarder(
                PathStyle::Plain,
                policy,
                Err(TransportError::Rejected("offline".into())),
            );
            let dispatch = fwd
                .on_key_down(&KeyDown::new("a"))
                .expect("network failure must not fail the handler");
            let settlement = pollster::block_on(dispatch.settle);

            assert_eq!(
                settlement,
                Settlement::Failed(TransportError::Rejected("offline".into()))
            );
            assert_eq!(count(&journal, |e| *e == Effect::Reload), 1, "{policy:?}");
            assert_eq!(fwd.stats().requests_failed, 1);
        }
    }

    #[test]
    fn failures_are_logged_as_warnings() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::registry().with(logs.clone());
        tracing::subscriber::with_default(subscriber, || {
            let (fwd, _journal) = forwarder(
                PathStyle::Plain,
                ReloadPolicy::Immediate,
                Err(TransportError::Rejected("connection refused".into())),
            );
            let dispatch = fwd.on_key_down(&KeyDown::new("a")).unwrap();
            pollster::block_on(dispatch.settle);
        });

        let logs = logs.0.lock().expect("log capture lock");
        let warnings: Vec<&str> = logs
            .iter()
            .filter(|(level, _)| *level == Level::WARN)
            .map(|(_, message)| message.as_str())
            .collect();
        assert_eq!(warnings, vec!["keypress request failed"]);
    }

    #[test]
    fn error_status_counts_as_failure() {
        let (fwd, _journal) = forwarder(
            PathStyle::QueryEcho,
            ReloadPolicy::AfterSettle,
            Err(TransportError::Status(500)),
        );
        let dispatch = fwd.on_key_down(&KeyDown::new("z")).unwrap();
        assert!(!pollster::block_on(dispatch.settle).is_delivered());
        assert_eq!(
            fwd.stats(),
            ForwardStats {
                keys_seen: 1,
                keys_rejected: 0,
                requests_issued: 1,
                requests_failed: 1,
                reloads: 1,
            }
        );
    }

    #[test]
    fn empty_key_sends_nothing_and_does_not_reload() {
        let (fwd, journal) = forwarder(PathStyle::Plain, ReloadPolicy::Immediate, Ok(()));
        let err = fwd.on_key_down(&KeyDown::new("")).unwrap_err();
        assert_eq!(err, ForwardError::EmptyKey);
        assert!(journal.borrow().is_empty());
        assert_eq!(fwd.stats().keys_rejected, 1);
        assert_eq!(fwd.stats().reloads, 0);
    }

    #[test]
    fn repeated_keys_are_forwarded() {
        let (fwd, journal) = forwarder(PathStyle::Plain, ReloadPolicy::Immediate, Ok(()));
        let dispatch = fwd.on_key_down(&KeyDown::new("x").repeated(true)).unwrap();
        pollster::block_on(dispatch.settle);
        assert_eq!(count(&journal, |e| matches!(e, Effect::Get(_))), 1);
    }

    #[test]
    fn invalid_prefix_is_rejected_at_construction() {
        let journal = Journal::default();
        let result = Forwarder::new(
            ForwarderConfig::default().with_prefix("/k?x"),
            ScriptedTransport {
                journal: Rc::clone(&journal),
                outcome: Ok(()),
            },
            JournalReloader(journal),
        );
        assert!(result.is_err());
    }

    #[test]
    fn dispatch_debug_omits_future() {
        let (fwd, _journal) = forwarder(PathStyle::Plain, ReloadPolicy::Immediate, Ok(()));
        let dispatch = fwd.on_key_down(&KeyDown::new("k")).unwrap();
        let text = format!("{dispatch:?}");
        assert!(text.contains("/keypress/k"));
        assert!(text.contains(".."));
    }

    proptest! {
        #[test]
        fn one_get_and_one_reload_per_key(
            keys in prop::collection::vec("[ -~]{1,4}", 1..16),
            after_settle in any::<bool>(),
            fail in any::<bool>(),
        ) {
            let policy = if after_settle { ReloadPolicy::AfterSettle } else { ReloadPolicy::Immediate };
            let outcome = if fail { Err(TransportError::Status(404)) } else { Ok(()) };
            let (fwd, journal) = forwarder(PathStyle::QueryEcho, policy, outcome);
            for key in &keys {
                let dispatch = fwd.on_key_down(&KeyDown::new(key.as_str())).unwrap();
                pollster::block_on(dispatch.settle);
            }
            let gets = count(&journal, |e| matches!(e, Effect::Get(p) if p.starts_with("/keypress/")));
            let reloads = count(&journal, |e| *e == Effect::Reload);
            prop_assert_eq!(gets, keys.len());
            prop_assert_eq!(reloads, keys.len());
            prop_assert_eq!(fwd.stats().reloads, keys.len() as u64);
        }
    }
}
