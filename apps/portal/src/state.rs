use std::sync::Arc;

use auth_cell::{AppShell, HistoryNavigator, SessionHooks};
use chat_cell::ChatHooks;
use guard_cell::RouteGuard;
use schedule_cell::{RoomService, ScheduleService};
use shared_config::ClientConfig;
use shared_gateway::{ApiClient, GatewayError};
use shared_session::{QueryCache, SessionStore};

/// Everything the section handlers share. One portal process serves one
/// session.
#[derive(Clone)]
pub struct PortalState {
    pub config: Arc<ClientConfig>,
    pub api: ApiClient,
    pub cache: QueryCache,
    pub navigator: Arc<HistoryNavigator>,
    pub session: SessionHooks,
    pub rooms: RoomService,
    pub schedules: ScheduleService,
    pub chat: ChatHooks,
    pub guard: Arc<RouteGuard>,
}

impl PortalState {
    pub fn new(config: ClientConfig, store: SessionStore) -> Result<Self, GatewayError> {
        let api = ApiClient::new(&config, store)?;
        let cache = QueryCache::new();
        let navigator = Arc::new(HistoryNavigator::default());

        Ok(Self {
            session: SessionHooks::new(api.clone(), cache.clone(), navigator.clone()),
            rooms: RoomService::new(api.clone()),
            schedules: ScheduleService::new(api.clone()),
            chat: ChatHooks::new(api.clone(), cache.clone()),
            guard: Arc::new(RouteGuard::new(config.client_id.clone())),
            config: Arc::new(config),
            api,
            cache,
            navigator,
        })
    }

    /// Shell bound to this state's session, cache and navigator.
    pub fn shell(&self) -> AppShell {
        AppShell::new(
            self.api.session().clone(),
            self.cache.clone(),
            self.navigator.clone(),
        )
    }
}
