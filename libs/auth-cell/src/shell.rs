use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use shared_gateway::SessionEvent;
use shared_models::routes;
use shared_session::{QueryCache, SessionStore};

/// Where the application currently is, and how to move it elsewhere.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
}

/// Number of hops a `HistoryNavigator` remembers.
pub const HISTORY_LIMIT: usize = 32;

/// In-process navigator that records the most recent hops.
#[derive(Debug)]
pub struct HistoryNavigator {
    history: Mutex<VecDeque<String>>,
}

impl HistoryNavigator {
    pub fn new(initial_path: &str) -> Self {
        Self {
            history: Mutex::new(VecDeque::from([initial_path.to_string()])),
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().iter().cloned().collect()
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new(routes::ROOT)
    }
}

impl Navigator for HistoryNavigator {
    fn current_path(&self) -> String {
        self.history
            .lock()
            .back()
            .cloned()
            .unwrap_or_else(|| routes::ROOT.to_string())
    }

    fn navigate(&self, path: &str) {
        let mut history = self.history.lock();
        if history.back().map(String::as_str) == Some(path) {
            return;
        }
        debug!("Navigating to {}", path);
        history.push_back(path.to_string());
        while history.len() > HISTORY_LIMIT {
            history.pop_front();
        }
    }
}

/// Top-level reaction to session events raised by the gateway.
#[derive(Clone)]
pub struct AppShell {
    session: SessionStore,
    cache: QueryCache,
    navigator: Arc<dyn Navigator>,
}

impl AppShell {
    pub fn new(session: SessionStore, cache: QueryCache, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            session,
            cache,
            navigator,
        }
    }

    pub fn handle_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::TokenRotated => debug!("Session token refreshed"),
            SessionEvent::SessionInvalidated => {
                info!("Session invalidated by server, returning to login");
                self.session.logout();
                self.cache.clear();
                if !self.navigator.current_path().starts_with(routes::LOGIN) {
                    self.navigator.navigate(routes::LOGIN);
                }
            }
        }
    }

    /// Consumes gateway events until the gateway is dropped.
    pub fn spawn(self, mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => self.handle_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Shell missed {} session event(s)", skipped);
                        // A missed invalidation must still tear down.
                        if !self.session.is_authenticated() {
                            self.handle_event(&SessionEvent::SessionInvalidated);
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
