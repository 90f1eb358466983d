//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when a reducer hands work to the runtime:
//! one-shot async calls, timers and cancellable registrations.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use larder_core::async_effect;
///
/// async_effect! {
///     match store.create(&path, item).await {
///         Ok(id) => Some(InventoryAction::ItemAdded { id }),
///         Err(error) => Some(InventoryAction::AddFailed { error }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use larder_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(3),
///     action: InventoryAction::ClearFeedback { generation }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Create an `Effect::Cancellable` around another effect
///
/// # Example
///
/// ```rust,ignore
/// use larder_core::cancellable;
///
/// cancellable! {
///     id: SUBSCRIPTION,
///     effect: Effect::Stream(snapshots)
/// }
/// ```
#[macro_export]
macro_rules! cancellable {
    (
        id: $id:expr,
        effect: $effect:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $id,
            effect: ::std::boxed::Box::new($effect),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::{Effect, EffectId};
    use std::time::Duration;

    #[derive(Clone, Debug)]
    enum TestAction {
        AsyncResult { value: i32 },
        TimeoutExpired,
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::AsyncResult { value: 42 })
        };

        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn test_delay_macro() {
        let effect = delay! {
            duration: Duration::from_secs(3),
            action: TestAction::TimeoutExpired
        };

        assert!(matches!(effect, Effect::Delay { duration, .. } if duration == Duration::from_secs(3)));
    }

    #[test]
    fn test_cancellable_macro() {
        const TIMER: EffectId = EffectId::new("timer");

        let effect = cancellable! {
            id: TIMER,
            effect: delay! {
                duration: Duration::from_secs(3),
                action: TestAction::TimeoutExpired
            }
        };

        assert_eq!(effect.cancellation_id(), Some(TIMER));
    }
}
