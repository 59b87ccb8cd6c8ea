use crate::util::log;
use rand::Rng;
use std::fmt::Display;

/// How a plan step chooses among the matches of its rule.
///
/// `K` below is the policy's modifier (clamped to the number of matches `N`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "String", into = "String")
)]
pub enum PolicyKind {
    /// Every match, in order.
    All,
    /// `matches[0]`.
    First,
    /// `matches[0..K)`.
    FirstX,
    /// `matches[K]`.
    XFromFirst,
    /// `matches[N-1]`.
    Last,
    /// `matches[N-K..N)`.
    LastX,
    /// `matches[N-K]`.
    XFromLast,
    /// `matches[0]`, `matches[K]`, `matches[2K]`, ...
    EveryX,
    /// One uniformly chosen match.
    Random,
    /// `K` distinct uniformly chosen matches.
    XRandom,
    /// `matches[N/2]`.
    Middle,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 11] = [
        PolicyKind::All,
        PolicyKind::First,
        PolicyKind::FirstX,
        PolicyKind::XFromFirst,
        PolicyKind::Last,
        PolicyKind::LastX,
        PolicyKind::XFromLast,
        PolicyKind::EveryX,
        PolicyKind::Random,
        PolicyKind::XRandom,
        PolicyKind::Middle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::All => "All",
            PolicyKind::First => "First",
            PolicyKind::FirstX => "First_x",
            PolicyKind::XFromFirst => "x_from_First",
            PolicyKind::Last => "Last",
            PolicyKind::LastX => "Last_x",
            PolicyKind::XFromLast => "x_from_Last",
            PolicyKind::EveryX => "Every_x",
            PolicyKind::Random => "Random",
            PolicyKind::XRandom => "x_Random",
            PolicyKind::Middle => "Middle",
        }
    }

    /// Looks a policy up by name. Unknown names fall back to [`PolicyKind::Random`].
    pub fn from_name(name: &str) -> PolicyKind {
        PolicyKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .unwrap_or_else(|| {
                log::warn!("unknown policy {name:?}, falling back to Random");
                PolicyKind::Random
            })
    }
}

impl Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for PolicyKind {
    fn from(name: String) -> Self {
        PolicyKind::from_name(&name)
    }
}

impl From<PolicyKind> for String {
    fn from(kind: PolicyKind) -> Self {
        kind.name().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Policy {
    pub kind: PolicyKind,
    pub modifier: usize,
}

impl Policy {
    pub fn new(kind: PolicyKind, modifier: usize) -> Self {
        Policy { kind, modifier }
    }

    /// Indices (into a list of `match_count` matches) of the matches to rewrite, in application
    /// order.
    ///
    /// Never fails: with no matches, or when the chosen index is out of range, nothing is
    /// selected.
    pub fn select<R: Rng>(&self, match_count: usize, rng: &mut R) -> Vec<usize> {
        let n = match_count;
        if n == 0 {
            return Vec::new();
        }
        let k = self.modifier.min(n);
        match self.kind {
            PolicyKind::All => (0..n).collect(),
            PolicyKind::First => vec![0],
            PolicyKind::FirstX => (0..k).collect(),
            PolicyKind::XFromFirst if k < n => vec![k],
            PolicyKind::XFromFirst => Vec::new(),
            PolicyKind::Last => vec![n - 1],
            PolicyKind::LastX => (n - k..n).collect(),
            PolicyKind::XFromLast if k > 0 => vec![n - k],
            PolicyKind::XFromLast => Vec::new(),
            PolicyKind::EveryX if k > 0 => (0..n).step_by(k).collect(),
            PolicyKind::EveryX => Vec::new(),
            PolicyKind::Random => vec![rng.random_range(0..n)],
            PolicyKind::XRandom => sample_distinct(k, n, rng),
            PolicyKind::Middle => vec![n / 2],
        }
    }
}

impl From<PolicyKind> for Policy {
    fn from(kind: PolicyKind) -> Self {
        Policy::new(kind, 0)
    }
}

/// Draws up to `k` distinct indices below `n`, giving up after `100 * n` repeated draws.
fn sample_distinct<R: Rng>(k: usize, n: usize, rng: &mut R) -> Vec<usize> {
    let mut picked = Vec::with_capacity(k);
    let mut retries_left = 100 * n;
    while picked.len() < k && retries_left > 0 {
        let index = rng.random_range(0..n);
        if picked.contains(&index) {
            retries_left -= 1;
        } else {
            picked.push(index);
        }
    }
    picked
}
