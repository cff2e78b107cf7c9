//! Single-fire termination signal shared by the two pumps of a session.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Why a session ended. Only the first trigger is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The agent stream ended without error.
    BackendEnded,
    /// The agent sent CLOSE.
    BackendClosed,
    BackendError,
    /// The client sent CLOSE.
    ClientClosed,
    ClientDisconnected,
    ClientSendFailed,
    BackendSendFailed,
    Timeout,
}

impl TerminationReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BackendEnded => "backend_ended",
            Self::BackendClosed => "backend_closed",
            Self::BackendError => "backend_error",
            Self::ClientClosed => "client_closed",
            Self::ClientDisconnected => "client_disconnected",
            Self::ClientSendFailed => "client_send_failed",
            Self::BackendSendFailed => "backend_send_failed",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broadcast-once event. Cloning shares the same underlying signal.
#[derive(Clone, Debug)]
pub struct Termination {
    tx: Arc<watch::Sender<Option<TerminationReason>>>,
}

impl Default for Termination {
    fn default() -> Self {
        Self::new()
    }
}

impl Termination {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal. Returns `true` only for the call that fired it.
    pub fn fire(&self, reason: TerminationReason) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(reason);
            true
        })
    }

    pub fn is_fired(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn reason(&self) -> Option<TerminationReason> {
        *self.tx.borrow()
    }

    /// Resolve once the signal has fired (immediately if it already has).
    pub async fn fired(&self) -> Option<TerminationReason> {
        let mut rx = self.tx.subscribe();
        rx.wait_for(Option::is_some).await.ok().and_then(|reason| *reason)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn first_trigger_wins() {
        let t = Termination::new();
        assert!(!t.is_fired());
        assert!(t.fire(TerminationReason::ClientClosed));
        assert!(!t.fire(TerminationReason::Timeout));
        assert!(!t.clone().fire(TerminationReason::BackendError));
        assert_eq!(t.reason(), Some(TerminationReason::ClientClosed));
    }

    #[tokio::test]
    async fn concurrent_triggers_fire_exactly_once() {
        let t = Termination::new();
        let mut handles = Vec::new();
        for i in 0..32 {
            let t = t.clone();
            handles.push(tokio::spawn(async move {
                let reason = if i % 2 == 0 {
                    TerminationReason::BackendEnded
                } else {
                    TerminationReason::ClientDisconnected
                };
                t.fire(reason)
            }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(t.is_fired());
    }

    #[tokio::test]
    async fn waiters_wake_on_fire() {
        let t = Termination::new();
        let waiter = {
            let t = t.clone();
            tokio::spawn(async move { t.fired().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        t.fire(TerminationReason::BackendClosed);

        let reason = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, Some(TerminationReason::BackendClosed));
    }

    #[tokio::test]
    async fn fired_resolves_immediately_when_already_fired() {
        let t = Termination::new();
        t.fire(TerminationReason::Timeout);
        assert_eq!(t.fired().await, Some(TerminationReason::Timeout));
    }
}
