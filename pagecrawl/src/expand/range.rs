use regex::Regex;
use std::sync::LazyLock;

/// Maximum number of values a single range segment expands to.
pub const RANGE_LIMIT: usize = 1000;

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?[0-9]+)\s*-\s*(-?[0-9]+)$")
        .expect("Failed to compile integer range regex")
});

/// Inclusive integer range with `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    lo: i64,
    hi: i64,
}

impl IntRange {
    /// Ends are swapped when given high-to-low.
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            lo: a.min(b),
            hi: a.max(b),
        }
    }

    /// Recognizes `a-b`, `a - b`, `-40--30`. Returns `None` for anything
    /// else, including integers that overflow `i64`.
    pub fn parse(token: &str) -> Option<Self> {
        let captures = RANGE_RE.captures(token.trim())?;
        let a = captures.get(1)?.as_str().parse::<i64>().ok()?;
        let b = captures.get(2)?.as_str().parse::<i64>().ok()?;
        Some(Self::new(a, b))
    }

    pub fn lo(&self) -> i64 {
        self.lo
    }

    pub fn hi(&self) -> i64 {
        self.hi
    }

    /// Number of integers the range spans before capping.
    pub fn span(&self) -> u128 {
        (i128::from(self.hi) - i128::from(self.lo)) as u128 + 1
    }

    pub fn is_truncated(&self) -> bool {
        self.span() > RANGE_LIMIT as u128
    }

    /// Ascending values, silently capped at [`RANGE_LIMIT`].
    pub fn values(&self) -> impl Iterator<Item = i64> {
        (self.lo..=self.hi).take(RANGE_LIMIT)
    }
}
