//! Common value types shared by resources, modules, people and events.

use serde::{Deserialize, Serialize};

/// A signed contribution to a named resource.
///
/// Lists of these are the universal effect currency: building costs and
/// output, person upkeep, event effects and training costs all use them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDelta {
    pub resource: String,
    pub amount: f64,
}

impl ResourceDelta {
    pub fn new(resource: impl Into<String>, amount: f64) -> Self {
        Self {
            resource: resource.into(),
            amount,
        }
    }
}

/// Direction in which a delta list is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn factor(self) -> f64 {
        match self {
            Sign::Plus => 1.0,
            Sign::Minus => -1.0,
        }
    }
}

/// Comparison operator used by resource and quest conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
}

impl Comparator {
    /// Evaluate `lhs <op> rhs`.
    pub fn compare(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Lt => lhs < rhs,
            Comparator::Lte => lhs <= rhs,
            Comparator::Gt => lhs > rhs,
            Comparator::Gte => lhs >= rhs,
            Comparator::Eq => lhs == rhs,
            Comparator::Neq => lhs != rhs,
        }
    }
}

/// Monotonic id allocator for `prefix_NNN` style identifiers.
///
/// Owned by the game state rather than living in a process-wide counter, so
/// a loaded save can resume numbering with [`IdSequence::sync_from`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSequence {
    prefix: &'static str,
    next: u32,
}

impl IdSequence {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, next: 1 }
    }

    /// Hand out the next id and advance.
    pub fn allocate(&mut self) -> String {
        let id = format!("{}{:03}", self.prefix, self.next);
        self.next += 1;
        id
    }

    /// Number the next allocation will use.
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Numeric suffix of an id carrying this sequence's prefix.
    pub fn parse(&self, id: &str) -> Option<u32> {
        id.strip_prefix(self.prefix)?.parse().ok()
    }

    /// Resume one past the highest suffix among `ids`. Never moves backwards.
    pub fn sync_from<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let highest = ids.into_iter().filter_map(|id| self.parse(id)).max();
        if let Some(highest) = highest {
            self.next = self.next.max(highest + 1);
        }
    }
}
