//! Subscription gate for the interpretation feature

use std::sync::atomic::{AtomicBool, Ordering};

pub trait EntitlementProvider: Send + Sync {
    fn is_subscribed(&self) -> bool;
}

/// Entitlement backed by a flag, toggled by whoever owns the purchase flow.
#[derive(Debug, Default)]
pub struct StaticEntitlement {
    subscribed: AtomicBool,
}

impl StaticEntitlement {
    pub fn new(subscribed: bool) -> Self {
        Self {
            subscribed: AtomicBool::new(subscribed),
        }
    }

    pub fn set_subscribed(&self, subscribed: bool) {
        self.subscribed.store(subscribed, Ordering::SeqCst);
    }
}

impl EntitlementProvider for StaticEntitlement {
    fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_entitlement_toggles() {
        let entitlement = StaticEntitlement::new(false);
        assert!(!entitlement.is_subscribed());
        entitlement.set_subscribed(true);
        assert!(entitlement.is_subscribed());
    }
}
