//! Multi-listener change notification.
//!
//! A [`Delegate`] keeps an ordered list of listeners and invokes them
//! synchronously on [`Delegate::fire`]. Listeners may be tied to an
//! [`OwnerToken`] so everything one consumer attached can be dropped with a
//! single [`Delegate::unsubscribe_all`]. Registrations only hold the token
//! weakly; once every clone of a token is dropped its listeners stop firing
//! and are pruned.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::error::{ChartError, ChartResult};

/// Shared callback. Identity is the `Rc` allocation.
pub type Listener<A> = Rc<dyn Fn(&A)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug)]
struct OwnerMarker;

/// Identity of a consumer for bulk unsubscription. Clones share the identity.
#[derive(Debug, Clone)]
pub struct OwnerToken(Rc<OwnerMarker>);

impl OwnerToken {
    #[must_use]
    pub fn new() -> Self {
        Self(Rc::new(OwnerMarker))
    }

    fn downgrade(&self) -> Weak<OwnerMarker> {
        Rc::downgrade(&self.0)
    }

    fn owns(&self, owner: &Weak<OwnerMarker>) -> bool {
        Weak::ptr_eq(&self.downgrade(), owner)
    }
}

impl Default for OwnerToken {
    fn default() -> Self {
        Self::new()
    }
}

struct Registration<A> {
    id: SubscriptionId,
    listener: Listener<A>,
    owner: Option<Weak<OwnerMarker>>,
    single_shot: bool,
    active: Rc<Cell<bool>>,
}

impl<A> Clone for Registration<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Rc::clone(&self.listener),
            owner: self.owner.clone(),
            single_shot: self.single_shot,
            active: Rc::clone(&self.active),
        }
    }
}

impl<A> Registration<A> {
    fn owner_alive(&self) -> bool {
        self.owner
            .as_ref()
            .is_none_or(|owner| owner.strong_count() > 0)
    }

    fn is_live(&self) -> bool {
        self.active.get() && self.owner_alive()
    }

    fn same_owner(&self, owner: Option<&OwnerToken>) -> bool {
        match (&self.owner, owner) {
            (None, None) => true,
            (Some(registered), Some(token)) => token.owns(registered),
            _ => false,
        }
    }
}

pub struct Delegate<A> {
    registrations: RefCell<Vec<Registration<A>>>,
    next_id: Cell<u64>,
    destroyed: Cell<bool>,
}

impl<A> Default for Delegate<A> {
    fn default() -> Self {
        Self {
            registrations: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            destroyed: Cell::new(false),
        }
    }
}

impl<A> fmt::Debug for Delegate<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegate")
            .field("listeners", &self.listener_count())
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}

impl<A> Delegate<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`, optionally on behalf of `owner`.
    ///
    /// Registering the same listener again for the same owner is a no-op that
    /// returns the existing id, so one event reaches it once.
    pub fn subscribe(
        &self,
        listener: Listener<A>,
        owner: Option<&OwnerToken>,
    ) -> ChartResult<SubscriptionId> {
        self.register(listener, owner, false)
    }

    /// Like [`Delegate::subscribe`], but the listener is dropped after its first call.
    pub fn subscribe_once(
        &self,
        listener: Listener<A>,
        owner: Option<&OwnerToken>,
    ) -> ChartResult<SubscriptionId> {
        self.register(listener, owner, true)
    }

    /// Removes every registration of `listener`. Returns how many were removed.
    pub fn unsubscribe(&self, listener: &Listener<A>) -> usize {
        self.remove_where(|registration| Rc::ptr_eq(&registration.listener, listener))
    }

    pub fn unsubscribe_id(&self, id: SubscriptionId) -> bool {
        self.remove_where(|registration| registration.id == id) > 0
    }

    /// Removes every registration made on behalf of `owner`.
    pub fn unsubscribe_all(&self, owner: &OwnerToken) -> usize {
        self.remove_where(|registration| {
            registration
                .owner
                .as_ref()
                .is_some_and(|registered| owner.owns(registered))
        })
    }

    /// Invokes the registered listeners in subscription order.
    ///
    /// The listener list is captured before the first call: listeners added
    /// during the pass wait for the next one, listeners removed during the
    /// pass are skipped. A panicking listener aborts the rest of the pass.
    pub fn fire(&self, args: &A) {
        if self.destroyed.get() {
            return;
        }
        let snapshot: SmallVec<[Registration<A>; 4]> = {
            let mut registrations = self.registrations.borrow_mut();
            registrations.retain(Registration::owner_alive);
            registrations.iter().cloned().collect()
        };

        for registration in snapshot {
            if !registration.is_live() {
                continue;
            }
            if registration.single_shot {
                self.remove_where(|entry| entry.id == registration.id);
            }
            (registration.listener)(args);
        }
    }

    #[must_use]
    pub fn has_listeners(&self) -> bool {
        self.registrations.borrow().iter().any(Registration::is_live)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registrations
            .borrow()
            .iter()
            .filter(|registration| registration.is_live())
            .count()
    }

    /// Drops every registration and refuses new ones. Safe to call repeatedly.
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        let removed = self.remove_where(|_| true);
        debug!(removed, "delegate destroyed");
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn register(
        &self,
        listener: Listener<A>,
        owner: Option<&OwnerToken>,
        single_shot: bool,
    ) -> ChartResult<SubscriptionId> {
        if self.destroyed.get() {
            warn!("subscribe called on a destroyed delegate");
            return Err(ChartError::UseAfterDestroy);
        }

        let mut registrations = self.registrations.borrow_mut();
        registrations.retain(Registration::owner_alive);
        if let Some(existing) = registrations.iter().find(|registration| {
            Rc::ptr_eq(&registration.listener, &listener)
                && registration.same_owner(owner)
                && registration.single_shot == single_shot
        }) {
            return Ok(existing.id);
        }

        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        registrations.push(Registration {
            id,
            listener,
            owner: owner.map(OwnerToken::downgrade),
            single_shot,
            active: Rc::new(Cell::new(true)),
        });
        Ok(id)
    }

    fn remove_where(&self, mut predicate: impl FnMut(&Registration<A>) -> bool) -> usize {
        let mut registrations = self.registrations.borrow_mut();
        let before = registrations.len();
        registrations.retain(|registration| {
            if predicate(registration) {
                registration.active.set(false);
                false
            } else {
                true
            }
        });
        before - registrations.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{Delegate, Listener, OwnerToken};

    #[test]
    fn dropped_owner_silences_and_prunes_its_listeners() {
        let delegate = Delegate::<u32>::new();
        let calls = Rc::new(RefCell::new(0));
        let owner = OwnerToken::new();
        let counter = Rc::clone(&calls);
        let listener: Listener<u32> = Rc::new(move |_: &u32| *counter.borrow_mut() += 1);
        delegate
            .subscribe(listener, Some(&owner))
            .expect("subscribe");
        assert!(delegate.has_listeners());

        drop(owner);
        assert!(!delegate.has_listeners());
        delegate.fire(&1);
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(delegate.registrations.borrow().len(), 0);
    }

    #[test]
    fn same_listener_for_same_owner_is_registered_once() {
        let delegate = Delegate::<u32>::new();
        let owner = OwnerToken::new();
        let listener: Listener<u32> = Rc::new(|_: &u32| {});
        let first = delegate
            .subscribe(Rc::clone(&listener), Some(&owner))
            .expect("subscribe");
        let second = delegate
            .subscribe(Rc::clone(&listener), Some(&owner.clone()))
            .expect("subscribe");
        assert_eq!(first, second);
        assert_eq!(delegate.listener_count(), 1);

        delegate
            .subscribe(Rc::clone(&listener), None)
            .expect("subscribe without owner");
        assert_eq!(delegate.listener_count(), 2);
    }
}
