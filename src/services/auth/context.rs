/*
 * Responsibility
 * - Request-scoped security context (the "current principal" slot)
 * - Created per request by the negotiate middleware, handed to the delegator by
 *   `&mut`, then moved into request extensions for handlers
 *
 * Notes
 * - Never shared between requests; there is no global holder.
 */
use super::principal::Principal;

#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    principal: Option<Principal>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the principal for the rest of the request and return the stored value.
    pub fn publish(&mut self, principal: Principal) -> &Principal {
        self.principal.insert(principal)
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn into_principal(self) -> Option<Principal> {
        self.principal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_is_anonymous() {
        let ctx = SecurityContext::new();
        assert!(!ctx.is_authenticated());
        assert!(ctx.principal().is_none());
    }

    #[test]
    fn publish_replaces_slot() {
        let mut ctx = SecurityContext::new();
        assert_eq!(ctx.publish(Principal::new("alice")).name(), "alice");
        ctx.publish(Principal::new("bob"));

        assert_eq!(ctx.principal().map(Principal::name), Some("bob"));
        assert_eq!(ctx.into_principal(), Some(Principal::new("bob")));
    }
}
