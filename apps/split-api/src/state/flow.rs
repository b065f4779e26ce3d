//! # Flow Sessions
//!
//! In-memory wizard state, one `FlowState` per user.
//!
//! ## Thread Safety
//! Every handler touching a flow goes through the same `Arc<Mutex<..>>`.
//! The reducer is pure and fast, so it runs under the lock; database
//! writes happen after the lock is released.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Flow Session Operations                              │
//! │                                                                         │
//! │  Request                  Handler                 Session Change        │
//! │  ───────                  ───────                 ──────────────        │
//! │                                                                         │
//! │  GET /api/flow ─────────► get() / snapshot ──────► (read only)         │
//! │                                                                         │
//! │  POST /api/flow/actions ► apply(reduce) ─────────► map[user] = next    │
//! │                                                                         │
//! │  DELETE /api/flow ──────► remove() ──────────────► map.remove(user)    │
//! │                                                                         │
//! │  POST /api/expenses ────► transition(finalize) ──► map[user] = Success │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Memory is a cache: the resume snapshot in SQLite is what survives a
//! restart or a switch of device.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use splitter_core::FlowState;

/// Shared per-user flow states.
#[derive(Debug, Clone, Default)]
pub struct FlowSessions {
    flows: Arc<Mutex<HashMap<String, FlowState>>>,
}

impl FlowSessions {
    pub fn new() -> Self {
        FlowSessions::default()
    }

    // A panic while holding the lock leaves whole FlowState values behind,
    // never a half-applied one, so a poisoned map is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, FlowState>> {
        self.flows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The user's flow, if one is cached.
    pub fn get(&self, user_id: &str) -> Option<FlowState> {
        self.lock().get(user_id).cloned()
    }

    /// Replaces the user's flow.
    pub fn put(&self, user_id: &str, state: FlowState) {
        self.lock().insert(user_id.to_string(), state);
    }

    /// Drops the user's flow. Returns whether one was cached.
    pub fn remove(&self, user_id: &str) -> bool {
        self.lock().remove(user_id).is_some()
    }

    /// Runs `f` on the user's current flow (or `fallback` if none is cached)
    /// and stores the result.
    ///
    /// On error the cached flow is left untouched.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let next = sessions.apply(&user, restored, |s| reduce(s, action, &ctx))?;
    /// ```
    pub fn apply<F, E>(&self, user_id: &str, fallback: FlowState, f: F) -> Result<FlowState, E>
    where
        F: FnOnce(FlowState) -> Result<FlowState, E>,
    {
        self.transition(user_id, fallback, |current| {
            let next = f(current)?;
            Ok((next.clone(), next))
        })
    }

    /// Like [`apply`](Self::apply), but `f` returns the next flow together
    /// with a value handed back to the caller.
    ///
    /// Read, change and store happen under one lock, so two requests can
    /// never both act on the same starting flow.
    pub fn transition<F, T, E>(&self, user_id: &str, fallback: FlowState, f: F) -> Result<T, E>
    where
        F: FnOnce(FlowState) -> Result<(FlowState, T), E>,
    {
        let mut flows = self.lock();
        let current = flows.get(user_id).cloned().unwrap_or(fallback);
        let (next, output) = f(current)?;
        flows.insert(user_id.to_string(), next);
        Ok(output)
    }

    /// Number of cached flows.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitter_core::{FlowStep, FlowType};

    fn on_step(index: usize) -> FlowState {
        FlowState {
            flow_type: Some(FlowType::Manual),
            step_index: index,
            ..FlowState::new()
        }
    }

    #[test]
    fn test_put_get_remove() {
        let sessions = FlowSessions::new();
        assert!(sessions.get("u1").is_none());

        sessions.put("u1", on_step(1));
        assert_eq!(sessions.get("u1").map(|s| s.step_index), Some(1));
        assert_eq!(sessions.len(), 1);

        assert!(sessions.remove("u1"));
        assert!(!sessions.remove("u1"));
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_apply_uses_fallback_only_when_absent() {
        let sessions = FlowSessions::new();

        let first = sessions
            .apply::<_, ()>("u1", on_step(2), Ok)
            .unwrap();
        assert_eq!(first.step_index, 2);

        let second = sessions
            .apply::<_, ()>("u1", on_step(0), Ok)
            .unwrap();
        assert_eq!(second.step_index, 2);
    }

    #[test]
    fn test_apply_error_keeps_previous_state() {
        let sessions = FlowSessions::new();
        sessions.put("u1", on_step(1));

        let result: Result<FlowState, &str> =
            sessions.apply("u1", FlowState::new(), |_| Err("rejected"));

        assert_eq!(result, Err("rejected"));
        let kept = sessions.get("u1").unwrap();
        assert_eq!(kept.current_step(), FlowStep::ExpenseDetails);
    }

    #[test]
    fn test_transition_returns_output_and_stores_next() {
        let sessions = FlowSessions::new();
        sessions.put("u1", on_step(1));

        let previous = sessions
            .transition::<_, _, ()>("u1", FlowState::new(), |s| {
                let step = s.step_index;
                Ok((on_step(step + 1), step))
            })
            .unwrap();

        assert_eq!(previous, 1);
        assert_eq!(sessions.get("u1").map(|s| s.step_index), Some(2));
    }

    #[test]
    fn test_clones_share_storage() {
        let sessions = FlowSessions::new();
        let other = sessions.clone();
        other.put("u1", on_step(1));
        assert!(sessions.get("u1").is_some());
    }
}
