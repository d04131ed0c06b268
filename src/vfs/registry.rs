/*!
 * Provider Registry
 * Maps each authority to exactly one provider
 */

use ahash::RandomState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

use super::disposable::Disposable;
use super::hub::{ChangeHub, Subscription, SubscriptionState};
use super::resource::Authority;
use super::traits::FileSystemProvider;
use super::types::{VfsError, VfsResult};
use crate::core::RcuCell;

type RegistrationMap = HashMap<Authority, Arc<Registration>, RandomState>;

/// One active binding of an authority to a provider
struct Registration {
    id: u64,
    provider: Arc<dyn FileSystemProvider>,
    subscription: Option<Subscription>,
}

struct RegistryInner {
    entries: RcuCell<RegistrationMap>,
    hub: ChangeHub,
    next_id: AtomicU64,
}

/// Authority → provider map
///
/// Registering an authority that is already bound fails with
/// `DuplicateAuthority`; the existing registration is left untouched.
///
/// Lookups read an immutable snapshot and never block. Register and
/// unregister publish a new snapshot with compare-and-swap, so a lookup sees
/// a registration either fully present or fully gone.
#[derive(Clone)]
pub struct ProviderRegistry {
    inner: Arc<RegistryInner>,
}

impl ProviderRegistry {
    /// Create an empty registry publishing changes on `hub`
    pub fn new(hub: ChangeHub) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: RcuCell::new(HashMap::with_hasher(RandomState::new())),
                hub,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Bind `authority` to `provider`
    ///
    /// On success the provider is routable and, if it exposes a change
    /// source, subscribed by the hub before this returns. The returned
    /// disposable removes exactly this registration; disposing it after a
    /// newer provider took the authority does nothing.
    pub fn register(
        &self,
        authority: &str,
        provider: Arc<dyn FileSystemProvider>,
    ) -> VfsResult<Disposable> {
        let authority = Authority::new(authority)?;

        if let Some(root) = provider.root() {
            if root.authority() != &authority {
                return Err(VfsError::MalformedAddress(format!(
                    "provider root {root} does not belong to authority '{authority}'"
                )));
            }
        }

        if self.contains(authority.as_str()) {
            return Err(VfsError::DuplicateAuthority(authority.to_string()));
        }

        let subscription = match provider.observable() {
            Some(source) => Some(self.inner.hub.attach(&authority, source)?),
            None => None,
        };

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let name = provider.name().to_string();
        let registration = Arc::new(Registration {
            id,
            provider,
            subscription,
        });

        // A losing race drops `registration` here, and with it the pending
        // subscription, so nothing it buffered is ever published
        self.inner.entries.try_update(|map| {
            if map.contains_key(&authority) {
                return Err(VfsError::DuplicateAuthority(authority.to_string()));
            }
            let mut next = map.clone();
            next.insert(authority.clone(), Arc::clone(&registration));
            Ok(next)
        })?;

        if let Some(subscription) = &registration.subscription {
            subscription.activate();
        }

        info!(
            authority = %authority,
            provider = %name,
            observable = registration.subscription.is_some(),
            "file system provider registered"
        );

        let registry: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        Ok(Disposable::new(move || {
            if let Some(inner) = registry.upgrade() {
                inner.unregister(&authority, id);
            }
        }))
    }

    /// Look up the provider bound to `authority`
    pub fn resolve(&self, authority: &Authority) -> Option<Arc<dyn FileSystemProvider>> {
        self.inner
            .entries
            .load()
            .get(authority)
            .map(|registration| Arc::clone(&registration.provider))
    }

    /// True if a provider is bound to `authority` (case-insensitive)
    pub fn contains(&self, authority: &str) -> bool {
        Authority::new(authority)
            .map(|a| self.inner.entries.load().contains_key(&a))
            .unwrap_or(false)
    }

    /// Snapshot of `(authority, provider name)`, sorted by authority
    pub fn list(&self) -> Vec<(Authority, String)> {
        let snapshot = self.inner.entries.load();
        let mut listed: Vec<_> = snapshot
            .iter()
            .map(|(authority, registration)| {
                (authority.clone(), registration.provider.name().to_string())
            })
            .collect();
        listed.sort_by(|a, b| a.0.cmp(&b.0));
        listed
    }

    pub fn len(&self) -> usize {
        self.inner.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Change subscription state for `authority`
    ///
    /// Providers without a change source, and unknown authorities, report
    /// `Unsubscribed`.
    pub fn subscription_state(&self, authority: &Authority) -> SubscriptionState {
        self.inner
            .entries
            .load()
            .get(authority)
            .and_then(|registration| registration.subscription.as_ref().map(Subscription::state))
            .unwrap_or(SubscriptionState::Unsubscribed)
    }

    /// The hub this registry publishes changes on
    pub fn hub(&self) -> &ChangeHub {
        &self.inner.hub
    }

    /// Remove every registration, returning how many were removed
    ///
    /// Outstanding disposables become no-ops.
    pub fn dispose_all(&self) -> usize {
        let previous = self
            .inner
            .entries
            .swap(HashMap::with_hasher(RandomState::new()));
        for (authority, registration) in previous.iter() {
            if let Some(subscription) = &registration.subscription {
                subscription.close();
            }
            debug!(authority = %authority, "file system provider disposed at teardown");
        }
        previous.len()
    }
}

impl RegistryInner {
    fn unregister(&self, authority: &Authority, id: u64) {
        let mut removed = None;
        let result = self.entries.try_update(|map| match map.get(authority) {
            Some(registration) if registration.id == id => {
                removed = Some(Arc::clone(registration));
                let mut next = map.clone();
                next.remove(authority);
                Ok(next)
            }
            _ => {
                removed = None;
                Err(())
            }
        });

        if result.is_err() {
            return;
        }
        if let Some(registration) = removed {
            if let Some(subscription) = &registration.subscription {
                subscription.close();
            }
            info!(authority = %authority, "file system provider unregistered");
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new(ChangeHub::default())
    }
}
