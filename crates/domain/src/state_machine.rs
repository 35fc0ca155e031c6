//! Generic transition-table state machine contract.

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::error::{Result, StateMachineError};

/// A lifecycle status governed by a transition table.
pub trait Status: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static {
    /// Human-readable description used in diagnostics.
    fn description(&self) -> &'static str;
}

/// An event that drives a status transition.
pub trait Event: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static {}

/// Receives the audit fields of an accepted transition.
pub trait TransitionContext<S, E> {
    fn record_transition(&mut self, old_status: S, new_status: S, event: E);
}

/// The contract shared by the order, payment and refund machines.
pub trait StateMachine<S: Status, E: Event, C: TransitionContext<S, E>> {
    /// Applies `event` to `current` and returns the next status.
    ///
    /// On success the context's old/new status and event are filled in;
    /// nothing is persisted. Persisting the result is up to the caller and
    /// should be a conditional write (`... WHERE status = old_status`).
    fn send_event(&self, current: S, event: E, context: &mut C) -> Result<S>;

    /// Returns true if `target == current` or `target` is reachable from
    /// `current` by a single event. Multi-hop paths are not considered.
    fn can_transit(&self, current: S, target: S) -> bool;

    /// Returns the distinct statuses reachable from `current` by one event.
    fn possible_next_states(&self, current: S) -> Vec<S>;
}

/// Immutable `status -> (event -> status)` mapping.
///
/// Built once per machine and only read afterwards, so a `static` table can
/// be shared between threads without locking. Outgoing edges keep their
/// declaration order, which makes [`TransitionTable::possible_next_states`]
/// deterministic.
#[derive(Debug, Clone)]
pub struct TransitionTable<S: Status, E: Event> {
    machine: &'static str,
    transitions: HashMap<S, Vec<(E, S)>>,
}

impl<S: Status, E: Event> TransitionTable<S, E> {
    /// Starts building a table for the named machine.
    pub fn builder(machine: &'static str) -> TransitionTableBuilder<S, E> {
        TransitionTableBuilder {
            machine,
            transitions: HashMap::new(),
        }
    }

    /// Returns the machine name.
    pub fn machine(&self) -> &'static str {
        self.machine
    }

    /// Looks up the destination of `event` from `current`.
    pub fn next(&self, current: S, event: E) -> Option<S> {
        self.transitions
            .get(&current)?
            .iter()
            .find(|(e, _)| *e == event)
            .map(|(_, to)| *to)
    }

    /// Returns the events accepted in `current`.
    pub fn events(&self, current: S) -> Vec<E> {
        self.transitions
            .get(&current)
            .map(|edges| edges.iter().map(|(e, _)| *e).collect())
            .unwrap_or_default()
    }

    /// Returns true if `current` is declared with no outgoing transitions.
    pub fn is_terminal(&self, current: S) -> bool {
        self.transitions
            .get(&current)
            .is_some_and(|edges| edges.is_empty())
    }

    /// Evaluates one transition and fills in the context on success.
    pub fn send_event<C: TransitionContext<S, E>>(
        &self,
        current: S,
        event: E,
        context: &mut C,
    ) -> Result<S> {
        let Some(next) = self.next(current, event) else {
            metrics::counter!(
                "state_transitions_total",
                "machine" => self.machine,
                "outcome" => "rejected"
            )
            .increment(1);
            tracing::debug!(
                machine = self.machine,
                state = %current,
                event = %event,
                "state transition rejected"
            );
            return Err(StateMachineError::InvalidStateTransition {
                machine: self.machine,
                state: current.description().to_string(),
                event: event.to_string(),
            });
        };

        context.record_transition(current, next, event);

        metrics::counter!(
            "state_transitions_total",
            "machine" => self.machine,
            "outcome" => "accepted"
        )
        .increment(1);
        tracing::debug!(
            machine = self.machine,
            from = %current,
            to = %next,
            event = %event,
            "state transition accepted"
        );
        Ok(next)
    }

    /// Single-hop reachability check.
    pub fn can_transit(&self, current: S, target: S) -> bool {
        if current == target {
            return true;
        }
        self.transitions
            .get(&current)
            .is_some_and(|edges| edges.iter().any(|(_, to)| *to == target))
    }

    /// Distinct one-hop destinations in declaration order.
    pub fn possible_next_states(&self, current: S) -> Vec<S> {
        let mut states: Vec<S> = Vec::new();
        if let Some(edges) = self.transitions.get(&current) {
            for (_, to) in edges {
                if !states.contains(to) {
                    states.push(*to);
                }
            }
        }
        states
    }
}

/// Builder for [`TransitionTable`].
#[derive(Debug)]
pub struct TransitionTableBuilder<S: Status, E: Event> {
    machine: &'static str,
    transitions: HashMap<S, Vec<(E, S)>>,
}

impl<S: Status, E: Event> TransitionTableBuilder<S, E> {
    /// Declares the outgoing transitions of `from`.
    pub fn state(mut self, from: S, edges: impl IntoIterator<Item = (E, S)>) -> Self {
        self.transitions
            .entry(from)
            .or_default()
            .extend(edges);
        self
    }

    /// Declares `status` as terminal (no outgoing transitions).
    pub fn terminal(mut self, status: S) -> Self {
        self.transitions.entry(status).or_default();
        self
    }

    /// Finishes the table.
    pub fn build(self) -> TransitionTable<S, E> {
        TransitionTable {
            machine: self.machine,
            transitions: self.transitions,
        }
    }
}
