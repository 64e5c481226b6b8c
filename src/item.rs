use std::fmt::{Display, Formatter, Result};

use rand::Rng;

/* ---------- */

/// The fixed set of things a producer can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    /// Pepperoni pizza.
    Pepperoni,
    /// Margherita pizza.
    Margherita,
    /// Ham and cheese pizza.
    HamAndCheese,
    /// Ham and mushrooms pizza.
    HamAndMushrooms,
    /// Supreme pizza.
    Supreme,
}

impl Kind {
    /// Number of kinds.
    pub const COUNT: usize = 5;

    /// Every kind, in declaration order.
    pub const ALL: [Kind; Kind::COUNT] = [
        Kind::Pepperoni,
        Kind::Margherita,
        Kind::HamAndCheese,
        Kind::HamAndMushrooms,
        Kind::Supreme,
    ];

    /// Returns a kind picked uniformly at random.
    #[inline]
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::COUNT)]
    }

    /// Returns the human readable name of the kind.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Kind::Pepperoni => "pepperoni",
            Kind::Margherita => "margherita",
            Kind::HamAndCheese => "ham and cheese",
            Kind::HamAndMushrooms => "ham and mushrooms",
            Kind::Supreme => "supreme",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl Display for Kind {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.name())
    }
}

/* ---------- */

/// A value moving through the [`BoundedQueue`].
///
/// Items are immutable once built. The serial is the producer's running count
/// at creation time and has no effect on how the item is queued.
///
/// [`BoundedQueue`]: crate::BoundedQueue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    kind: Kind,
    serial: u64,
}

impl Item {
    /// Returns a new item.
    #[inline]
    pub fn new(kind: Kind, serial: u64) -> Self {
        Self { kind, serial }
    }

    /// Returns the item's kind.
    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Returns the item's serial number.
    #[inline]
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

/* ---------- */

/// Number of items per [`Kind`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KindCounts([usize; Kind::COUNT]);

impl KindCounts {
    /// Returns the count for `kind`.
    #[inline]
    pub fn get(&self, kind: Kind) -> usize {
        self.0[kind.index()]
    }

    /// Returns the sum of all counts.
    #[inline]
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Iterates over every kind and its count, zeros included.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Kind, usize)> + '_ {
        Kind::ALL.iter().map(|kind| (*kind, self.get(*kind)))
    }

    #[inline]
    pub(crate) fn increment(&mut self, kind: Kind) {
        self.0[kind.index()] += 1;
    }

    #[inline]
    pub(crate) fn decrement(&mut self, kind: Kind) {
        let count = &mut self.0[kind.index()];
        assert!(*count > 0, "no {kind} left to remove from the counts");
        *count -= 1;
    }
}

impl Display for KindCounts {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let mut first = true;
        for (kind, count) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{kind}: {count}")?;
            first = false;
        }

        Ok(())
    }
}

/* ---------- */
