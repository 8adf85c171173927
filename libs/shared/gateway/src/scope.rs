use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};

use futures::future::{AbortHandle, Abortable};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::GatewayError;

#[derive(Debug, Default)]
struct ScopeState {
    cancelled: bool,
    next_id: u64,
    handles: HashMap<u64, AbortHandle>,
}

/// Removes a request's handle from its scope once the request future is
/// finished or dropped.
struct Registration {
    state: Weak<Mutex<ScopeState>>,
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.lock().handles.remove(&self.id);
        }
    }
}

/// Owner of the requests started on behalf of one view.
///
/// Cancelling the scope, or dropping it, aborts every request it started;
/// those requests resolve to `GatewayError::Cancelled`. Only requests still
/// in flight are tracked.
#[derive(Debug, Default)]
pub struct RequestScope {
    state: Arc<Mutex<ScopeState>>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ties `request` to this scope. The returned future does not borrow the
    /// scope, so it can be spawned and outlive it.
    pub fn run<F, T>(&self, request: F) -> impl Future<Output = Result<T, GatewayError>>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        let (handle, abort_registration) = AbortHandle::new_pair();
        let registration = {
            let mut state = self.state.lock();
            if state.cancelled {
                handle.abort();
            }
            let id = state.next_id;
            state.next_id += 1;
            state.handles.insert(id, handle);
            Registration {
                state: Arc::downgrade(&self.state),
                id,
            }
        };

        async move {
            let _registration = registration;
            match Abortable::new(request, abort_registration).await {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Cancelled),
            }
        }
    }

    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.cancelled = true;
        let pending = state.handles.len();
        for (_, handle) in state.handles.drain() {
            handle.abort();
        }
        if pending > 0 {
            debug!("Cancelled {} request(s)", pending);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    /// Number of requests started through this scope that have not finished.
    pub fn in_flight(&self) -> usize {
        self.state.lock().handles.len()
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        self.cancel();
    }
}
