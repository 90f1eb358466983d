//! Reducer logic for the inventory client.
//!
//! One reducer covers the whole screen: the session bootstrapper, the live
//! subscription, the mutator and the feedback banner. Every collaborator call
//! leaves as an effect and comes back as an action.

use crate::environment::{AuthProvider, InventoryEnvironment, InventoryStore};
use crate::error::{InventoryError, MutationOp};
use crate::types::{
    AddItemForm, Feedback, FeedbackKind, InventoryAction, InventoryState, Item, ItemId, NewItem, Phase,
    Session, UserId, sort_newest_first,
};
use async_stream::stream;
use futures::StreamExt;
use larder_core::{
    SmallVec, async_effect, cancellable, delay,
    effect::{Effect, EffectId},
    reducer::Reducer,
    smallvec,
};
use std::marker::PhantomData;

/// The live snapshot subscription for the current user
pub const SUBSCRIPTION: EffectId = EffectId::new("inventory.subscription");

/// The auth-state listener started by `Bootstrap`
pub const AUTH_LISTENER: EffectId = EffectId::new("session.auth_listener");

/// The timer that clears transient feedback
pub const FEEDBACK_TIMER: EffectId = EffectId::new("feedback.timer");

/// Banner text after a successful create
pub const ITEM_ADDED: &str = "Item added successfully!";

/// Banner text after a successful delete
pub const ITEM_REMOVED: &str = "Item removed successfully!";

type Effects = SmallVec<[Effect<InventoryAction>; 4]>;

/// Reducer for the inventory screen
///
/// Generic over the auth service `A` and document store `S` it drives.
pub struct InventoryReducer<A, S> {
    collaborators: PhantomData<fn() -> (A, S)>,
}

impl<A, S> InventoryReducer<A, S> {
    /// Creates a new `InventoryReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            collaborators: PhantomData,
        }
    }
}

impl<A, S> Clone for InventoryReducer<A, S> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<A, S> std::fmt::Debug for InventoryReducer<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InventoryReducer")
    }
}

impl<A, S> Default for InventoryReducer<A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AuthProvider, S: InventoryStore> InventoryReducer<A, S> {
    /// Replaces the banner
    ///
    /// Any pending clear timer is cancelled; transient messages start a new one.
    fn show_feedback(
        state: &mut InventoryState,
        env: &InventoryEnvironment<A, S>,
        message: &str,
        kind: FeedbackKind,
        transient: bool,
    ) -> Effects {
        let generation = state.next_generation;
        state.next_generation += 1;
        state.feedback = Some(Feedback {
            message: message.to_string(),
            kind,
            generation,
            transient,
        });

        let mut effects: Effects = smallvec![Effect::Cancel(FEEDBACK_TIMER)];
        if transient {
            effects.push(cancellable! {
                id: FEEDBACK_TIMER,
                effect: delay! {
                    duration: env.feedback_ttl,
                    action: InventoryAction::ClearFeedback { generation }
                }
            });
        }
        effects
    }

    /// Shows an error that stays until replaced or dismissed
    fn show_error(
        state: &mut InventoryState,
        env: &InventoryEnvironment<A, S>,
        error: &InventoryError,
    ) -> Effects {
        Self::show_feedback(state, env, error.user_message(), FeedbackKind::Error, false)
    }

    /// Listens to the auth service for the lifetime of the screen
    fn auth_listener(env: &InventoryEnvironment<A, S>) -> Effect<InventoryAction> {
        let auth = env.auth.clone();
        Effect::Stream(Box::pin(stream! {
            let changes = auth.auth_state();
            futures::pin_mut!(changes);
            while let Some(user) = changes.next().await {
                yield InventoryAction::AuthStateChanged(user);
            }
        }))
        .cancellable(AUTH_LISTENER)
    }

    /// Issues a sign-in: custom token when configured, else anonymous
    fn sign_in(env: &InventoryEnvironment<A, S>) -> Effect<InventoryAction> {
        let auth = env.auth.clone();
        let token = env.initial_auth_token.clone();
        async_effect! {
            let result = match token {
                Some(token) => auth.sign_in_with_custom_token(&token).await,
                None => auth.sign_in_anonymously().await,
            };
            Some(match result {
                Ok(user_id) => InventoryAction::SignInSucceeded(user_id),
                Err(error @ InventoryError::Init(_)) => InventoryAction::InitFailed(error),
                Err(error) => InventoryAction::SignInFailed(error),
            })
        }
    }

    /// Opens the snapshot subscription for `user_id`, replacing any running one
    fn subscribe(
        env: &InventoryEnvironment<A, S>,
        user_id: UserId,
    ) -> Effect<InventoryAction> {
        let store = env.store.clone();
        let path = env.collection(&user_id);
        Effect::Stream(Box::pin(stream! {
            let snapshots = store.subscribe(&path);
            futures::pin_mut!(snapshots);
            while let Some(snapshot) = snapshots.next().await {
                match snapshot {
                    Ok(items) => {
                        yield InventoryAction::SnapshotReceived {
                            user_id: user_id.clone(),
                            items,
                        };
                    },
                    Err(error) => {
                        yield InventoryAction::SubscriptionFailed { user_id, error };
                        break;
                    },
                }
            }
        }))
        .cancellable(SUBSCRIPTION)
    }

    /// Makes `user_id` the session's ready user
    fn establish_session(
        state: &mut InventoryState,
        env: &InventoryEnvironment<A, S>,
        user_id: UserId,
    ) -> Effects {
        state.signing_in = false;

        if state.session.ready_user() == Some(&user_id) {
            return SmallVec::new();
        }

        tracing::info!(%user_id, "Session ready");
        if state.session.user_id.as_ref() != Some(&user_id) {
            state.items.clear();
        }
        state.session = Session::ready(user_id.clone());
        state.phase = Phase::Active;

        // Sign-in and init errors belong to the session we just replaced
        if state
            .feedback
            .as_ref()
            .is_some_and(|f| f.kind == FeedbackKind::Error && !f.transient)
        {
            state.feedback = None;
        }

        smallvec![Self::subscribe(env, user_id)]
    }

    /// Drops the session and everything scoped to it
    fn end_session(state: &mut InventoryState) -> Effects {
        if state.session.user_id.is_none() {
            return SmallVec::new();
        }

        tracing::info!("Signed out");
        state.session = Session::default();
        state.items.clear();
        state.phase = Phase::Loading;
        smallvec![Effect::Cancel(SUBSCRIPTION)]
    }

    fn add_item(
        state: &mut InventoryState,
        env: &InventoryEnvironment<A, S>,
        name: &str,
        quantity: i64,
    ) -> Effects {
        let item = match NewItem::parse(name, quantity) {
            Ok(item) => item,
            Err(error) => {
                tracing::debug!(%error, "Rejected add");
                return Self::show_error(state, env, &error.into());
            },
        };

        let Some(user_id) = state.session.ready_user() else {
            return Self::show_error(state, env, &InventoryError::NotReady);
        };

        tracing::debug!(name = item.name(), quantity = item.quantity(), "Adding item");
        let store = env.store.clone();
        let path = env.collection(user_id);
        smallvec![async_effect! {
            Some(match store.create(&path, item).await {
                Ok(id) => InventoryAction::ItemAdded { id },
                Err(error) => InventoryAction::AddFailed { error },
            })
        }]
    }

    fn delete_item(
        state: &mut InventoryState,
        env: &InventoryEnvironment<A, S>,
        id: ItemId,
    ) -> Effects {
        let Some(user_id) = state.session.ready_user() else {
            return Self::show_error(state, env, &InventoryError::NotReady);
        };

        tracing::debug!(%id, "Deleting item");
        let store = env.store.clone();
        let path = env.collection(user_id);
        smallvec![async_effect! {
            Some(match store.delete(&path, &id).await {
                Ok(()) => InventoryAction::ItemDeleted { id },
                Err(error) => InventoryAction::DeleteFailed { id, error },
            })
        }]
    }

    fn accept_snapshot(state: &mut InventoryState, user_id: &UserId, mut items: Vec<Item>) {
        if state.session.ready_user() != Some(user_id) {
            tracing::debug!(%user_id, "Discarding snapshot for another session");
            return;
        }

        sort_newest_first(&mut items);
        tracing::debug!(count = items.len(), "Snapshot applied");
        state.items = items;
    }
}

/// Mutation failures always read as the failed operation, whatever the store reported
fn as_mutation(op: MutationOp, error: InventoryError) -> InventoryError {
    match error {
        InventoryError::Mutation { op: reported, .. } if reported == op => error,
        other => InventoryError::mutation(op, other),
    }
}

impl<A: AuthProvider, S: InventoryStore> Reducer for InventoryReducer<A, S> {
    type State = InventoryState;
    type Action = InventoryAction;
    type Environment = InventoryEnvironment<A, S>;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Session ==========
            InventoryAction::Bootstrap => {
                if state.auth_listening {
                    return SmallVec::new();
                }
                state.auth_listening = true;
                smallvec![Self::auth_listener(env)]
            },

            InventoryAction::AuthStateChanged(Some(user_id))
            | InventoryAction::SignInSucceeded(user_id) => {
                Self::establish_session(state, env, user_id)
            },

            InventoryAction::AuthStateChanged(None) => {
                let mut effects = Self::end_session(state);
                if !state.signing_in {
                    state.signing_in = true;
                    effects.push(Self::sign_in(env));
                }
                effects
            },

            InventoryAction::SignInFailed(error) => {
                tracing::warn!(%error, "Sign-in failed");
                state.signing_in = false;
                Self::show_error(state, env, &error)
            },

            InventoryAction::RetrySignIn => {
                if state.session.ready || state.signing_in {
                    return SmallVec::new();
                }
                state.signing_in = true;
                smallvec![Self::sign_in(env)]
            },

            InventoryAction::InitFailed(error) => {
                tracing::error!(%error, "Initialization failed");
                state.signing_in = false;
                Self::show_error(state, env, &error)
            },

            // ========== Subscription ==========
            InventoryAction::SnapshotReceived { user_id, items } => {
                Self::accept_snapshot(state, &user_id, items);
                SmallVec::new()
            },

            InventoryAction::SubscriptionFailed { user_id, error } => {
                if state.session.ready_user() != Some(&user_id) {
                    return SmallVec::new();
                }
                tracing::warn!(%error, "Subscription failed");
                Self::show_error(state, env, &error)
            },

            InventoryAction::Refresh => match state.session.ready_user() {
                Some(user_id) => smallvec![Self::subscribe(env, user_id.clone())],
                None => SmallVec::new(),
            },

            // ========== Mutations ==========
            InventoryAction::AddItem { name, quantity } => {
                Self::add_item(state, env, &name, quantity)
            },

            InventoryAction::SubmitForm => {
                let name = state.form.name.clone();
                let quantity = state.form.quantity;
                Self::add_item(state, env, &name, quantity)
            },

            InventoryAction::ItemAdded { id } => {
                tracing::debug!(%id, "Item added");
                state.form = AddItemForm::default();
                Self::show_feedback(state, env, ITEM_ADDED, FeedbackKind::Success, true)
            },

            InventoryAction::AddFailed { error } => {
                tracing::warn!(%error, "Add failed");
                let error = as_mutation(MutationOp::Add, error);
                Self::show_feedback(state, env, error.user_message(), FeedbackKind::Error, true)
            },

            InventoryAction::DeleteItem { id } => Self::delete_item(state, env, id),

            InventoryAction::ItemDeleted { id } => {
                tracing::debug!(%id, "Item removed");
                Self::show_feedback(state, env, ITEM_REMOVED, FeedbackKind::Success, true)
            },

            InventoryAction::DeleteFailed { id, error } => {
                tracing::warn!(%id, %error, "Delete failed");
                let error = as_mutation(MutationOp::Remove, error);
                Self::show_feedback(state, env, error.user_message(), FeedbackKind::Error, true)
            },

            // ========== Form ==========
            InventoryAction::SetName(name) => {
                state.form.name = name;
                SmallVec::new()
            },

            InventoryAction::SetQuantity(quantity) => {
                state.form.quantity = quantity;
                SmallVec::new()
            },

            InventoryAction::SetQuantityText(text) => {
                state.form.set_quantity_text(&text);
                SmallVec::new()
            },

            // ========== Feedback ==========
            InventoryAction::ClearFeedback { generation } => {
                if state
                    .feedback
                    .as_ref()
                    .is_some_and(|f| f.generation == generation)
                {
                    state.feedback = None;
                }
                SmallVec::new()
            },

            InventoryAction::DismissFeedback => {
                state.feedback = None;
                smallvec![Effect::Cancel(FEEDBACK_TIMER)]
            },

            InventoryAction::Teardown => {
                tracing::debug!("Tearing down listeners");
                state.auth_listening = false;
                smallvec![
                    Effect::Cancel(SUBSCRIPTION),
                    Effect::Cancel(AUTH_LISTENER),
                    Effect::Cancel(FEEDBACK_TIMER),
                ]
            },
        }
    }
}
