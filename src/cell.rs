//! Observable cells: single named values with change notification
//!
//! This module contains the fundamental reactive primitives that the
//! configuration blackboard is built from.
//!
//! # Main Types
//!
//! - [`Cell`] - A shared, observable value with keyed change callbacks
//! - [`CellList`] - An ordered, growable sequence of cells ("channel list")
//! - [`ResizePolicy`] - How a [`CellList`] fills appended slots
//!
//! # Notification contract
//!
//! A `set` that assigns a value equal to the current one is a no-op: no
//! callback fires. This de-duplication rule is what prevents feedback loops
//! between a UI control and the cell it is bound to. On an actual change,
//! every registered callback runs synchronously, in registration order, with
//! a reference to the new value.
//!
//! # Reentrancy
//!
//! A callback may call `set` on the cell it is observing. Such a nested
//! `set` does not recurse: it is queued and dispatched after the current
//! notification pass completes. An oscillating pair of callbacks therefore
//! loops inside the outermost `set` instead of overflowing the stack;
//! bindings should still avoid oscillation, but a single write-back settles.
//!
//! # Threading
//!
//! Cells are `Rc`-based shared handles; cloning a [`Cell`] clones the handle,
//! not the value. The whole model layer is single-threaded by construction
//! and none of these types are `Send`. Completion handlers running on worker
//! threads must marshal their `set` calls back onto the model's thread.

use crate::error::{AlignmentError, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct CellState<T> {
    value: T,
    /// Keyed callbacks. A map by contract (one callback per key), kept as a
    /// vector so notification order is registration order.
    callbacks: Vec<(String, Callback<T>)>,
    notifying: bool,
    pending: VecDeque<T>,
}

/// A single observable value in the blackboard, supplying standardized
/// getters and setters and a callback mechanism on value change.
pub struct Cell<T> {
    state: Rc<RefCell<CellState<T>>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Cell {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Cell")
            .field("value", &state.value)
            .field("subscribers", &state.callbacks.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Cell<T> {
    /// Create a cell holding `value`
    pub fn new(value: T) -> Self {
        Cell {
            state: Rc::new(RefCell::new(CellState {
                value,
                callbacks: Vec::new(),
                notifying: false,
                pending: VecDeque::new(),
            })),
        }
    }

    /// Return a clone of the current value. No side effects.
    pub fn get(&self) -> T {
        self.state.borrow().value.clone()
    }

    /// Replace the value and notify every subscriber with the new value.
    ///
    /// Setting a value equal to the current one returns immediately without
    /// notifying anyone. A `set` issued from inside a notification is queued
    /// and dispatched once the current pass finishes.
    pub fn set(&self, new_value: T) {
        {
            let mut state = self.state.borrow_mut();
            if state.value == new_value {
                return;
            }
            if state.notifying {
                state.pending.push_back(new_value);
                return;
            }
            state.value = new_value;
            state.notifying = true;
        }
        self.drain();
    }

    /// Run notification passes until the pending queue settles.
    fn drain(&self) {
        loop {
            // Snapshot the value and callback handles so no borrow is held
            // while user code runs. Callbacks registered mid-pass take
            // effect on the next pass.
            let (value, callbacks) = {
                let state = self.state.borrow();
                let callbacks: Vec<Callback<T>> =
                    state.callbacks.iter().map(|(_, cb)| Rc::clone(cb)).collect();
                (state.value.clone(), callbacks)
            };
            for callback in callbacks {
                (callback.borrow_mut())(&value);
            }
            let mut state = self.state.borrow_mut();
            let mut advanced = false;
            while let Some(next) = state.pending.pop_front() {
                if next != state.value {
                    state.value = next;
                    advanced = true;
                    break;
                }
            }
            if !advanced {
                state.notifying = false;
                return;
            }
        }
    }

    /// Associate `callback` with `key`, replacing any existing association
    /// for that key (the replacement keeps the original position in the
    /// notification order). The callback is not invoked here; use
    /// [`Cell::subscribe`] when the caller needs immediate synchronization.
    pub fn register_callback(&self, key: impl Into<String>, callback: impl FnMut(&T) + 'static) {
        let key = key.into();
        let callback: Callback<T> = Rc::new(RefCell::new(callback));
        let mut state = self.state.borrow_mut();
        if let Some(slot) = state.callbacks.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = callback;
        } else {
            state.callbacks.push((key, callback));
        }
    }

    /// Register `callback` under `key` and invoke it once, immediately, with
    /// the current value. This is what UI binding helpers use to initialize
    /// the dependent view at bind time.
    pub fn subscribe(&self, key: impl Into<String>, mut callback: impl FnMut(&T) + 'static) {
        callback(&self.get());
        self.register_callback(key, callback);
    }

    /// Remove the callback registered under `key`.
    ///
    /// Fails loudly when the key was never registered; a silent miss here
    /// usually means a widget unbind went to the wrong cell.
    pub fn unregister_callback(&self, key: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        match state.callbacks.iter().position(|(k, _)| k == key) {
            Some(index) => {
                state.callbacks.remove(index);
                Ok(())
            }
            None => Err(AlignmentError::UnknownSubscriber(key.to_string())),
        }
    }

    /// Drop every subscription. Used when a channel list discards trailing
    /// cells on shrink.
    pub fn clear_callbacks(&self) {
        self.state.borrow_mut().callbacks.clear();
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().callbacks.len()
    }
}

/// How a [`CellList`] fills slots appended by a grow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePolicy {
    /// Append `T::default()`; path-like fields start empty
    PadDefault,
    /// Append copies of the last element's current value, so numeric
    /// tunables carry the previous round's setting forward
    PropagateLast,
}

/// An ordered, shared sequence of cells tracking an independent count cell,
/// e.g. per-imaging-channel paths or per-refinement-round parameters.
pub struct CellList<T> {
    cells: Rc<RefCell<Vec<Cell<T>>>>,
}

impl<T> Clone for CellList<T> {
    fn clone(&self) -> Self {
        CellList {
            cells: Rc::clone(&self.cells),
        }
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for CellList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values()).finish()
    }
}

impl<T: Clone + PartialEq + 'static> CellList<T> {
    /// Create a list with one cell per initial value
    pub fn new(values: impl IntoIterator<Item = T>) -> Self {
        CellList {
            cells: Rc::new(RefCell::new(values.into_iter().map(Cell::new).collect())),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.borrow().is_empty()
    }

    /// Shared handle to the cell at `index`
    pub fn get(&self, index: usize) -> Option<Cell<T>> {
        self.cells.borrow().get(index).cloned()
    }

    /// Current value at `index`
    pub fn value(&self, index: usize) -> Option<T> {
        self.cells.borrow().get(index).map(Cell::get)
    }

    /// Snapshot of every element's current value, in order
    pub fn values(&self) -> Vec<T> {
        self.cells.borrow().iter().map(Cell::get).collect()
    }

    /// Snapshot of the element handles, in order
    pub fn cells(&self) -> Vec<Cell<T>> {
        self.cells.borrow().clone()
    }

    /// `set` on the cell at `index`
    pub fn set(&self, index: usize, value: T) -> Result<()> {
        let cell = self.get(index).ok_or(AlignmentError::IndexOutOfRange {
            index,
            len: self.len(),
        })?;
        cell.set(value);
        Ok(())
    }

    /// Append a cell holding `value`
    pub fn push(&self, value: T) {
        self.cells.borrow_mut().push(Cell::new(value));
    }
}

impl<T: Clone + PartialEq + Default + 'static> CellList<T> {
    /// Grow or shrink the list to `count` elements.
    ///
    /// Growing appends fresh cells per `policy`; shrinking drops trailing
    /// cells and releases their subscriptions. Retained cells keep their
    /// values and subscriptions untouched, and resizing to the current
    /// length is a no-op.
    pub fn resize(&self, count: usize, policy: ResizePolicy) {
        let mut cells = self.cells.borrow_mut();
        while cells.len() > count {
            if let Some(dropped) = cells.pop() {
                dropped.clear_callbacks();
            }
        }
        while cells.len() < count {
            let value = match policy {
                ResizePolicy::PadDefault => T::default(),
                ResizePolicy::PropagateLast => {
                    cells.last().map(Cell::get).unwrap_or_default()
                }
            };
            cells.push(Cell::new(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn recording_cell<T: Clone + PartialEq + 'static>(
        initial: T,
    ) -> (Cell<T>, Rc<RefCell<Vec<T>>>) {
        let cell = Cell::new(initial);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        cell.register_callback("log", move |v: &T| sink.borrow_mut().push(v.clone()));
        (cell, log)
    }

    #[test]
    fn set_equal_value_is_a_no_op() {
        let (cell, log) = recording_cell(42);
        cell.set(42);
        assert!(log.borrow().is_empty());
        assert_eq!(cell.get(), 42);
    }

    #[test]
    fn set_notifies_in_order_with_each_new_value() {
        let (cell, log) = recording_cell(0);
        cell.set(1);
        cell.set(2);
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn callbacks_run_in_registration_order() {
        let cell = Cell::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));
        for name in ["a", "b", "c"] {
            let sink = order.clone();
            cell.register_callback(name, move |_: &i32| sink.borrow_mut().push(name));
        }
        cell.set(1);
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn reregistering_a_key_replaces_the_callback() {
        let cell = Cell::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        cell.register_callback("k", move |v: &i32| sink.borrow_mut().push(("f", *v)));
        let sink = log.clone();
        cell.register_callback("k", move |v: &i32| sink.borrow_mut().push(("g", *v)));
        cell.set(7);
        assert_eq!(*log.borrow(), vec![("g", 7)]);
    }

    #[test]
    fn subscribe_invokes_immediately_with_current_value() {
        let cell = Cell::new("init".to_string());
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        cell.subscribe("view", move |v: &String| sink.borrow_mut().push(v.clone()));
        cell.set("next".to_string());
        assert_eq!(*log.borrow(), vec!["init".to_string(), "next".to_string()]);
    }

    #[test]
    fn unregister_unknown_key_fails() {
        let cell = Cell::new(0);
        assert!(matches!(
            cell.unregister_callback("ghost"),
            Err(AlignmentError::UnknownSubscriber(_))
        ));
    }

    #[test]
    fn unregister_stops_notifications() {
        let (cell, log) = recording_cell(0);
        cell.set(1);
        cell.unregister_callback("log").unwrap();
        cell.set(2);
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn nested_set_is_queued_not_recursive() {
        // A write-back callback: clamps the value to at most 10.
        let cell = Cell::new(0);
        let clamp = cell.clone();
        cell.register_callback("clamp", move |v: &i32| {
            if *v > 10 {
                clamp.set(10);
            }
        });
        let (seen, log) = {
            let log = Rc::new(RefCell::new(Vec::new()));
            let sink = log.clone();
            cell.register_callback("log", move |v: &i32| sink.borrow_mut().push(*v));
            (cell.clone(), log)
        };
        seen.set(25);
        // The overshoot value notifies once, then the queued clamp value.
        assert_eq!(*log.borrow(), vec![25, 10]);
        assert_eq!(seen.get(), 10);
    }

    #[test]
    fn nested_set_of_equal_value_is_dropped_from_queue() {
        let cell = Cell::new(0);
        let echo = cell.clone();
        cell.register_callback("echo", move |v: &i32| echo.set(*v));
        cell.set(5);
        assert_eq!(cell.get(), 5);
    }

    #[test]
    fn list_resize_pads_with_defaults() {
        let list: CellList<String> =
            CellList::new(["a".to_string(), "b".to_string(), "c".to_string()]);
        list.resize(5, ResizePolicy::PadDefault);
        assert_eq!(list.values(), vec!["a", "b", "c", "", ""]);
    }

    #[test]
    fn list_resize_propagates_last_value() {
        let list = CellList::new([150.0, 125.0, 100.0]);
        list.resize(5, ResizePolicy::PropagateLast);
        assert_eq!(list.values(), vec![150.0, 125.0, 100.0, 100.0, 100.0]);
    }

    #[test]
    fn list_resize_keeps_retained_subscriptions() {
        let list = CellList::new([1, 2, 3]);
        let (hits, kept) = {
            let hits = Rc::new(RefCell::new(0));
            let sink = hits.clone();
            let kept = list.get(0).unwrap();
            kept.register_callback("w", move |_: &i32| *sink.borrow_mut() += 1);
            (hits, kept)
        };
        list.resize(5, ResizePolicy::PropagateLast);
        list.resize(2, ResizePolicy::PropagateLast);
        kept.set(9);
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(list.values(), vec![9, 2]);
    }

    #[test]
    fn list_shrink_releases_dropped_subscriptions() {
        let list = CellList::new([1, 2, 3]);
        let dropped = list.get(2).unwrap();
        let hits = Rc::new(RefCell::new(0));
        let sink = hits.clone();
        dropped.register_callback("w", move |_: &i32| *sink.borrow_mut() += 1);
        list.resize(2, ResizePolicy::PadDefault);
        // The handle is still alive but its subscriptions are gone.
        dropped.set(99);
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(dropped.subscriber_count(), 0);
    }

    #[test]
    fn list_resize_to_current_length_is_idempotent() {
        let list = CellList::new([1, 2, 3]);
        list.resize(3, ResizePolicy::PadDefault);
        list.resize(3, ResizePolicy::PropagateLast);
        assert_eq!(list.values(), vec![1, 2, 3]);
    }

    proptest! {
        /// Exactly one notification per distinct consecutive value.
        #[test]
        fn one_notification_per_change(values in proptest::collection::vec(0i64..4, 0..40)) {
            let (cell, log) = recording_cell(0i64);
            let mut expected = Vec::new();
            let mut current = 0i64;
            for v in values {
                if v != current {
                    expected.push(v);
                    current = v;
                }
                cell.set(v);
            }
            prop_assert_eq!(log.borrow().clone(), expected);
        }
    }
}
