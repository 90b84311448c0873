use std::sync::Arc;
use tokio::sync::RwLock;

/// Identifies one outstanding request issued by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Latest-request-wins bookkeeping.
///
/// Every request takes a ticket before it goes out; when its response arrives it may only be
/// applied if no newer ticket has been issued in the meantime. Lives inside the controller
/// state lock so issuing and checking are atomic with the state they guard.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}

/// Releases controller state held by an in-flight request if its future is dropped before the
/// response is applied.
///
/// `release` runs with the ticket the request was issued, so it can tell whether a newer
/// request has taken over in the meantime. Call [`InFlight::settle`] once the response has been
/// written back under the lock.
pub(crate) struct InFlight<S: Send + Sync + 'static> {
    state: Arc<RwLock<S>>,
    ticket: Ticket,
    release: fn(&mut S, Ticket),
    settled: bool,
}

impl<S: Send + Sync + 'static> InFlight<S> {
    pub(crate) fn new(state: Arc<RwLock<S>>, ticket: Ticket, release: fn(&mut S, Ticket)) -> Self {
        Self {
            state,
            ticket,
            release,
            settled: false,
        }
    }

    pub(crate) fn settle(mut self) {
        self.settled = true;
    }
}

impl<S: Send + Sync + 'static> Drop for InFlight<S> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let (ticket, release) = (self.ticket, self.release);
        tracing::warn!(ticket = ticket.value(), "Request dropped before its response was applied");
        match self.state.try_write() {
            Ok(mut state) => release(&mut state, ticket),
            // someone holds the lock; finish the release once it frees up
            Err(_) => {
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    let state = self.state.clone();
                    handle.spawn(async move { release(&mut *state.write().await, ticket) });
                }
            }
        }
    }
}
