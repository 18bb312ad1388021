use std::sync::Arc;

use crate::config::IdentitySettings;
use crate::domain::{
    models::{AuthenticatedUser, CachedIdentity, SessionIdentity},
    ports::outbound::{
        load, save, Clock, KeyValueStore, StoreError, SystemClock, TimeTrackingClient, IDENTITY_KEY,
    },
    TimeTrackingError,
};

#[derive(Debug, Clone, PartialEq)]
pub enum IdentityOutcome {
    /// Confirmed with the provider just now.
    Fresh(AuthenticatedUser),
    /// Trusted from the local cache without a network call.
    Cached(AuthenticatedUser),
    /// Validation failed; running on whatever was cached, possibly nothing.
    Degraded(Option<AuthenticatedUser>),
}

impl IdentityOutcome {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Self::Fresh(user) | Self::Cached(user) => Some(user),
            Self::Degraded(user) => user.as_ref(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Establishes who the session belongs to at startup.
///
/// Never fails: an offline start proceeds with the cached identity.
pub struct IdentityService<C, S> {
    client: Arc<C>,
    store: Arc<S>,
    identity: Arc<SessionIdentity>,
    clock: Arc<dyn Clock>,
    settings: IdentitySettings,
}

impl<C, S> IdentityService<C, S>
where
    C: TimeTrackingClient,
    S: KeyValueStore,
{
    pub fn new(
        client: Arc<C>,
        store: Arc<S>,
        identity: Arc<SessionIdentity>,
        settings: IdentitySettings,
    ) -> Self {
        Self {
            client,
            store,
            identity,
            clock: Arc::new(SystemClock),
            settings,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn validate(&self) -> IdentityOutcome {
        let cached = match load::<CachedIdentity, _>(&*self.store, IDENTITY_KEY).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached identity: {}", e);
                None
            }
        };

        let now = self.clock.now();
        if let Some(cached) = &cached {
            let age = now - cached.validated_at;
            if !age.is_negative() && age < self.settings.revalidate_after() {
                tracing::debug!("Using cached identity for user {}", cached.user.id);
                self.identity.set(Some(cached.user.clone()));
                return IdentityOutcome::Cached(cached.user.clone());
            }
        }

        match self.fetch_with_retry().await {
            Ok(user) => {
                tracing::info!("Authenticated as {} ({})", user.name, user.id);
                self.identity.set(Some(user.clone()));
                let record = CachedIdentity {
                    user: user.clone(),
                    validated_at: now,
                };
                if let Err(e) = save(&*self.store, IDENTITY_KEY, &record).await {
                    tracing::warn!("Failed to cache identity: {}", e);
                }
                IdentityOutcome::Fresh(user)
            }
            Err(e) => {
                let user = cached.map(|c| c.user);
                tracing::warn!(
                    "Identity validation failed, continuing in degraded mode (cached: {}): {}",
                    user.is_some(),
                    e
                );
                self.identity.set(user.clone());
                IdentityOutcome::Degraded(user)
            }
        }
    }

    /// Drop the cached identity and forget the session principal.
    pub async fn forget(&self) -> Result<(), StoreError> {
        self.identity.set(None);
        self.store.remove(&[IDENTITY_KEY]).await
    }

    async fn fetch_with_retry(&self) -> Result<AuthenticatedUser, TimeTrackingError> {
        let attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.client.get_authenticated_user().await {
                Ok(user) => return Ok(user),
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        "Identity check attempt {}/{} failed: {}",
                        attempt,
                        attempts,
                        e
                    );
                    attempt += 1;
                    tokio::time::sleep(self.settings.retry_delay()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::mock::{ManualClock, MemoryStore, MockOp, MockTimeTrackingClient};
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};

    const NOW: OffsetDateTime = datetime!(2025-09-18 09:00 UTC);

    struct Harness {
        client: Arc<MockTimeTrackingClient>,
        store: Arc<MemoryStore>,
        identity: Arc<SessionIdentity>,
        service: IdentityService<MockTimeTrackingClient, MemoryStore>,
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::new(NOW));
        let client = Arc::new(
            MockTimeTrackingClient::new(clock.clone()).with_user(AuthenticatedUser::new(7, "Ada")),
        );
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(SessionIdentity::default());
        let service = IdentityService::new(
            client.clone(),
            store.clone(),
            identity.clone(),
            IdentitySettings::default(),
        )
        .with_clock(clock);

        Harness {
            client,
            store,
            identity,
            service,
        }
    }

    async fn cache(store: &MemoryStore, user: AuthenticatedUser, validated_at: OffsetDateTime) {
        save(store, IDENTITY_KEY, &CachedIdentity { user, validated_at })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fresh_validation_sets_and_caches_identity() {
        let h = harness();

        let outcome = h.service.validate().await;

        assert_eq!(outcome, IdentityOutcome::Fresh(AuthenticatedUser::new(7, "Ada")));
        assert_eq!(h.identity.user_id().map(|id| id.as_u64()), Some(7));
        let cached: CachedIdentity = load(&*h.store, IDENTITY_KEY).await.unwrap().unwrap();
        assert_eq!(cached.validated_at, NOW);
    }

    #[tokio::test]
    async fn recent_cache_skips_the_network() {
        let h = harness();
        cache(&h.store, AuthenticatedUser::new(7, "Ada"), NOW - Duration::hours(2)).await;

        let outcome = h.service.validate().await;

        assert!(matches!(outcome, IdentityOutcome::Cached(_)));
        assert_eq!(h.client.count(MockOp::Me), 0);
        assert!(h.identity.user().is_some());
    }

    #[tokio::test]
    async fn expired_cache_is_revalidated() {
        let h = harness();
        cache(&h.store, AuthenticatedUser::new(7, "Ada"), NOW - Duration::hours(30)).await;

        let outcome = h.service.validate().await;

        assert!(matches!(outcome, IdentityOutcome::Fresh(_)));
        assert_eq!(h.client.count(MockOp::Me), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_once_then_degrades_to_cached_identity() {
        let h = harness();
        cache(&h.store, AuthenticatedUser::new(7, "Ada"), NOW - Duration::days(3)).await;
        h.client
            .fail_on(MockOp::Me, TimeTrackingError::Network("offline".into()));

        let outcome = h.service.validate().await;

        assert_eq!(h.client.count(MockOp::Me), 2);
        assert_eq!(
            outcome,
            IdentityOutcome::Degraded(Some(AuthenticatedUser::new(7, "Ada")))
        );
        assert!(outcome.is_degraded());
        assert_eq!(h.identity.user_id().map(|id| id.as_u64()), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn degraded_without_cache_leaves_identity_unknown() {
        let h = harness();
        h.identity.set(Some(AuthenticatedUser::new(1, "Stale")));
        h.client
            .fail_on(MockOp::Me, TimeTrackingError::Unauthorized("401".into()));

        let outcome = h.service.validate().await;

        assert_eq!(outcome, IdentityOutcome::Degraded(None));
        assert_eq!(outcome.user(), None);
        assert_eq!(h.identity.user(), None);
    }

    #[tokio::test]
    async fn forget_clears_cache_and_session() {
        let h = harness();
        h.service.validate().await;

        h.service.forget().await.unwrap();

        assert_eq!(h.identity.user(), None);
        assert!(!h.store.contains(IDENTITY_KEY));
    }
}
