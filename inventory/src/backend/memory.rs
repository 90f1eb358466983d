//! In-process auth service and document store.
//!
//! Push-based like the hosted services: auth state and every collection live
//! in `watch` channels, so subscribers see the current value immediately and
//! then every change. Also the test double for the reducer and Store tests.

use crate::environment::{AuthProvider, InventoryStore};
use crate::error::{InventoryError, MutationOp};
use crate::types::{CollectionPath, Item, ItemId, NewItem, UserId};
use async_stream::stream;
use futures::Stream;
use larder_core::environment::{Clock, SystemClock};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// In-memory Firebase stand-in
#[derive(Clone)]
pub struct InMemoryFirebase {
    inner: Arc<Inner>,
}

struct Inner {
    clock: Arc<dyn Clock>,
    auth_state: watch::Sender<Option<UserId>>,
    next_anonymous: AtomicU64,
    collections: Mutex<HashMap<CollectionPath, watch::Sender<Vec<Item>>>>,
    pending_writes: AtomicBool,
    fail_next_create: AtomicBool,
    fail_next_delete: AtomicBool,
    fail_sign_in: AtomicBool,
    fail_subscription: AtomicBool,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    sign_in_calls: AtomicUsize,
}

impl std::fmt::Debug for InMemoryFirebase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryFirebase")
            .field("user", &*self.inner.auth_state.borrow())
            .field("create_calls", &self.create_calls())
            .field("delete_calls", &self.delete_calls())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryFirebase {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFirebase {
    /// Creates an empty backend stamping items with the system clock
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty backend stamping items with `clock`
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (auth_state, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                clock,
                auth_state,
                next_anonymous: AtomicU64::new(1),
                collections: Mutex::new(HashMap::new()),
                pending_writes: AtomicBool::new(false),
                fail_next_create: AtomicBool::new(false),
                fail_next_delete: AtomicBool::new(false),
                fail_sign_in: AtomicBool::new(false),
                fail_subscription: AtomicBool::new(false),
                create_calls: AtomicUsize::new(0),
                delete_calls: AtomicUsize::new(0),
                sign_in_calls: AtomicUsize::new(0),
            }),
        }
    }

    fn collection(&self, path: &CollectionPath) -> watch::Sender<Vec<Item>> {
        let mut collections = self
            .inner
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        collections
            .entry(path.clone())
            .or_insert_with(|| watch::channel(Vec::new()).0)
            .clone()
    }

    /// Current contents of a collection, in insertion order
    #[must_use]
    pub fn items(&self, path: &CollectionPath) -> Vec<Item> {
        self.collection(path).borrow().clone()
    }

    /// Puts an item straight into a collection, bypassing the counters
    pub fn seed(&self, path: &CollectionPath, item: Item) {
        self.collection(path).send_modify(|items| items.push(item));
    }

    /// The signed-in user, if any
    #[must_use]
    pub fn current_user(&self) -> Option<UserId> {
        self.inner.auth_state.borrow().clone()
    }

    /// Signs the current user out; auth listeners observe `None`
    pub fn sign_out(&self) {
        self.inner.auth_state.send_replace(None);
    }

    /// Makes the next create fail
    pub fn fail_next_create(&self) {
        self.inner.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Makes the next delete fail
    pub fn fail_next_delete(&self) {
        self.inner.fail_next_delete.store(true, Ordering::SeqCst);
    }

    /// Makes every sign-in fail until switched off
    pub fn fail_sign_in(&self, fail: bool) {
        self.inner.fail_sign_in.store(fail, Ordering::SeqCst);
    }

    /// Makes every new subscription fail until switched off
    pub fn fail_subscription(&self, fail: bool) {
        self.inner.fail_subscription.store(fail, Ordering::SeqCst);
    }

    /// Holds back server timestamps on new items until
    /// [`InMemoryFirebase::resolve_pending_writes`] is called
    pub fn set_pending_writes(&self, pending: bool) {
        self.inner.pending_writes.store(pending, Ordering::SeqCst);
    }

    /// Stamps every item still waiting for its server timestamp
    pub fn resolve_pending_writes(&self) {
        let now = self.inner.clock.now();
        let senders: Vec<_> = self
            .inner
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for sender in senders {
            sender.send_if_modified(|items| {
                let mut changed = false;
                for item in items.iter_mut().filter(|i| i.created_at.is_none()) {
                    item.created_at = Some(now);
                    changed = true;
                }
                changed
            });
        }
    }

    /// Number of create calls, including failed ones
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.inner.create_calls.load(Ordering::SeqCst)
    }

    /// Number of delete calls, including failed ones
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.inner.delete_calls.load(Ordering::SeqCst)
    }

    /// Number of sign-in calls, including failed ones
    #[must_use]
    pub fn sign_in_calls(&self) -> usize {
        self.inner.sign_in_calls.load(Ordering::SeqCst)
    }

    fn sign_in_as(&self, user_id: UserId) -> Result<UserId, InventoryError> {
        self.inner.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_sign_in.load(Ordering::SeqCst) {
            return Err(InventoryError::Auth("sign-in rejected".to_string()));
        }
        self.inner.auth_state.send_replace(Some(user_id.clone()));
        Ok(user_id)
    }
}

impl AuthProvider for InMemoryFirebase {
    fn auth_state(&self) -> impl Stream<Item = Option<UserId>> + Send {
        let mut changes = self.inner.auth_state.subscribe();
        stream! {
            loop {
                let user = changes.borrow_and_update().clone();
                yield user;
                if changes.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    fn sign_in_anonymously(&self) -> impl Future<Output = Result<UserId, InventoryError>> + Send {
        let n = self.inner.next_anonymous.fetch_add(1, Ordering::SeqCst);
        let result = self.sign_in_as(UserId::new(format!("anon-{n}")));
        async move { result }
    }

    fn sign_in_with_custom_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<UserId, InventoryError>> + Send {
        let result = self.sign_in_as(UserId::new(format!("custom-{token}")));
        async move { result }
    }
}

impl InventoryStore for InMemoryFirebase {
    fn subscribe(
        &self,
        path: &CollectionPath,
    ) -> impl Stream<Item = Result<Vec<Item>, InventoryError>> + Send {
        let failing = self.inner.fail_subscription.load(Ordering::SeqCst);
        let mut snapshots = self.collection(path).subscribe();
        let path = path.clone();
        stream! {
            if failing {
                yield Err(InventoryError::Subscription(format!("listen on {path} rejected")));
            } else {
                loop {
                    let items = snapshots.borrow_and_update().clone();
                    yield Ok(items);
                    if snapshots.changed().await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    fn create(
        &self,
        path: &CollectionPath,
        item: NewItem,
    ) -> impl Future<Output = Result<ItemId, InventoryError>> + Send {
        self.inner.create_calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.inner.fail_next_create.swap(false, Ordering::SeqCst) {
            Err(InventoryError::mutation(MutationOp::Add, "write rejected"))
        } else {
            let id = ItemId::new(larder_firebase::auto_id());
            let created_at = if self.inner.pending_writes.load(Ordering::SeqCst) {
                None
            } else {
                Some(self.inner.clock.now())
            };
            let stored = Item {
                id: id.clone(),
                name: item.name().to_string(),
                quantity: item.quantity(),
                created_at,
            };
            self.collection(path).send_modify(|items| items.push(stored));
            Ok(id)
        };
        async move { result }
    }

    fn delete(
        &self,
        path: &CollectionPath,
        id: &ItemId,
    ) -> impl Future<Output = Result<(), InventoryError>> + Send {
        self.inner.delete_calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.inner.fail_next_delete.swap(false, Ordering::SeqCst) {
            Err(InventoryError::mutation(MutationOp::Remove, "write rejected"))
        } else {
            // Deleting a missing document succeeds, as in Firestore
            self.collection(path).send_if_modified(|items| {
                let before = items.len();
                items.retain(|item| &item.id != id);
                items.len() != before
            });
            Ok(())
        };
        async move { result }
    }
}
