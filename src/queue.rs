use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::item::{Item, KindCounts};
use crate::observer::{NoopObserver, Observer};
use crate::{Cancelled, Error};

/* ---------- */

/// A fixed-capacity FIFO buffer shared by producer and consumer workers.
///
/// A single mutex guards the items and their per-kind counts. Every state change
/// wakes all waiters up, each of them re-checking its own condition before going
/// on: a push may unblock a pop and a pop may unblock a push, they wait on the
/// same condition variable.
///
/// Blocking calls never time out. They only return early once the queue is
/// [closed](BoundedQueue::close).
///
/// The observer is called outside the lock, so it may query the queue. Its
/// notifications are still delivered one at a time, in the order of the changes
/// they report. An observer must not push to or pop from the queue it observes.
///
/// # Examples
///
/// ```
/// # use pizzeria::{BoundedQueue, Item, Kind};
/// # use std::sync::Arc;
/// let queue = Arc::new(BoundedQueue::new(2).unwrap());
///
/// queue.push(Item::new(Kind::Pepperoni, 1)).unwrap();
/// queue.push(Item::new(Kind::Supreme, 2)).unwrap();
/// assert_eq!(queue.size(), 2);
///
/// let cons = queue.clone();
/// let thread = std::thread::spawn(move || cons.pop().unwrap());
///
/// // Blocks until the consumer thread makes some room.
/// queue.push(Item::new(Kind::Margherita, 3)).unwrap();
///
/// assert_eq!(thread.join().unwrap().kind(), Kind::Pepperoni);
/// assert_eq!(queue.size(), 2);
/// ```
pub struct BoundedQueue {
    capacity: usize,
    state: Mutex<State>,
    changed: Condvar,
    observer: Arc<dyn Observer>,
    turn: Mutex<u64>,
    next_turn: Condvar,
}

#[derive(Default)]
struct State {
    items: VecDeque<Item>,
    counts: KindCounts,
    closed: bool,
    tickets: u64,
}

impl BoundedQueue {
    /// Returns a new empty queue holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `capacity` is zero.
    #[inline]
    pub fn new(capacity: usize) -> Result<Self, Error> {
        Self::with_observer(capacity, Arc::new(NoopObserver))
    }

    /// Returns a new empty queue notifying `observer` of every push and pop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `capacity` is zero.
    pub fn with_observer(capacity: usize, observer: Arc<dyn Observer>) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::invalid("the buffer capacity must be at least 1"));
        }

        Ok(Self {
            capacity,
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                ..State::default()
            }),
            changed: Condvar::new(),
            observer,
            turn: Mutex::new(0),
            next_turn: Condvar::new(),
        })
    }

    /// Appends `item` at the back of the queue, blocking while the queue is full.
    ///
    /// Returns the number of items in the queue right after the push.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if the queue is closed, in which case `item` is dropped
    /// without ever being visible in the queue.
    pub fn push(&self, item: Item) -> Result<usize, Cancelled> {
        let kind = item.kind();

        let (ticket, occupancy, counts) = {
            let mut state = self.lock();
            while !state.closed && state.items.len() >= self.capacity {
                state = self.wait(state);
            }

            if state.closed {
                return Err(Cancelled);
            }

            state.items.push_back(item);
            state.counts.increment(kind);
            self.check_occupancy(&state);
            self.changed.notify_all();

            (state.take_ticket(), state.items.len(), state.counts)
        };

        self.notify(ticket, |observer| {
            observer.on_item_enqueued(kind, occupancy, &counts)
        });
        Ok(occupancy)
    }

    /// Removes the item at the front of the queue, blocking while the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if the queue is closed. Items still queued stay in place.
    pub fn pop(&self) -> Result<Item, Cancelled> {
        let (ticket, item, occupancy, counts) = {
            let mut state = self.lock();
            while !state.closed && state.items.is_empty() {
                state = self.wait(state);
            }

            if state.closed {
                return Err(Cancelled);
            }

            let Some(item) = state.items.pop_front() else {
                unreachable!("woke up on an empty buffer")
            };
            state.counts.decrement(item.kind());
            self.check_occupancy(&state);
            self.changed.notify_all();

            (state.take_ticket(), item, state.items.len(), state.counts)
        };

        let kind = item.kind();
        self.notify(ticket, |observer| {
            observer.on_item_dequeued(kind, occupancy, &counts)
        });
        Ok(item)
    }

    /// Returns the number of items currently in the queue.
    #[inline]
    pub fn size(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns the maximum number of items the queue can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of queued items of each kind.
    #[inline]
    pub fn counts(&self) -> KindCounts {
        self.lock().counts
    }

    /// Returns a copy of the queued items, front first.
    #[inline]
    pub fn contents(&self) -> Vec<Item> {
        self.lock().items.iter().cloned().collect()
    }

    /// Closes the queue, waking up every blocked caller.
    ///
    /// Pending and future [`push`](Self::push) and [`pop`](Self::pop) calls return [`Cancelled`].
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.changed.notify_all();
    }

    /// Returns whether or not the queue has been closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    // A poisoned lock means some thread panicked in the middle of an update: the
    // occupancy can't be trusted anymore.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("bounded queue lock poisoned"),
        }
    }

    #[inline]
    fn wait<'a>(&self, guard: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
        match self.changed.wait(guard) {
            Ok(guard) => guard,
            Err(_) => panic!("bounded queue lock poisoned"),
        }
    }

    // Tickets are taken under the state lock, so waiting for our turn delivers
    // notifications in the order the state changed.
    fn notify<F>(&self, ticket: u64, f: F)
    where
        F: FnOnce(&dyn Observer),
    {
        let mut turn = self.turn.lock().unwrap_or_else(PoisonError::into_inner);
        while *turn != ticket {
            turn = self
                .next_turn
                .wait(turn)
                .unwrap_or_else(PoisonError::into_inner);
        }
        drop(turn);

        let _next = NextTurn(self);
        f(self.observer.as_ref());
    }

    #[inline]
    fn check_occupancy(&self, state: &State) {
        let occupancy = state.items.len();
        assert!(
            occupancy <= self.capacity && occupancy == state.counts.total(),
            "buffer occupancy {occupancy} out of bounds (capacity {}, counted {})",
            self.capacity,
            state.counts.total(),
        );
    }
}

impl State {
    #[inline]
    fn take_ticket(&mut self) -> u64 {
        let ticket = self.tickets;
        self.tickets += 1;
        ticket
    }
}

// Hands the turn over even if the observer panics.
struct NextTurn<'a>(&'a BoundedQueue);

impl Drop for NextTurn<'_> {
    fn drop(&mut self) {
        let mut turn = self.0.turn.lock().unwrap_or_else(PoisonError::into_inner);
        *turn += 1;
        self.0.next_turn.notify_all();
    }
}

/* ---------- */
