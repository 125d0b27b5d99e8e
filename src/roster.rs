//! Roster snapshots and login/logout detection
//!
//! A `RosterSnapshot` is the result of exactly one successful player query.
//! `diff` compares two of them and yields the transitions in between.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Player account name as reported by the server
pub type Identity = String;

/// One row of a player listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: Identity,
    pub online: bool,
}

impl Player {
    pub fn new(name: impl Into<Identity>, online: bool) -> Self {
        Self {
            name: name.into(),
            online,
        }
    }
}

/// Immutable identity -> online mapping captured at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterSnapshot {
    players: BTreeMap<Identity, bool>,
}

impl RosterSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from a complete player listing. A name listed more
    /// than once keeps its last reported state.
    pub fn from_players<I>(players: I) -> Self
    where
        I: IntoIterator<Item = Player>,
    {
        Self {
            players: players.into_iter().map(|p| (p.name, p.online)).collect(),
        }
    }

    pub fn get(&self, identity: &str) -> Option<bool> {
        self.players.get(identity).copied()
    }

    /// Absent identities count as offline
    pub fn is_online(&self, identity: &str) -> bool {
        self.get(identity).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn online_count(&self) -> usize {
        self.players.values().filter(|online| **online).count()
    }
}

impl<S: Into<Identity>> FromIterator<(S, bool)> for RosterSnapshot {
    fn from_iter<T: IntoIterator<Item = (S, bool)>>(iter: T) -> Self {
        Self {
            players: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A detected change of one player's online state
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Transition {
    LoggedIn(Identity),
    LoggedOut(Identity),
}

impl Transition {
    pub fn identity(&self) -> &str {
        match self {
            Self::LoggedIn(id) | Self::LoggedOut(id) => id,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggedIn(id) => write!(f, "{} logged in", id),
            Self::LoggedOut(id) => write!(f, "{} logged off", id),
        }
    }
}

/// Compare two snapshots. Output is sorted by identity.
pub fn diff(previous: &RosterSnapshot, current: &RosterSnapshot) -> Vec<Transition> {
    let identities: BTreeSet<&Identity> = previous
        .players
        .keys()
        .chain(current.players.keys())
        .collect();

    identities
        .into_iter()
        .filter_map(|id| {
            match (previous.is_online(id), current.is_online(id)) {
                (false, true) => Some(Transition::LoggedIn(id.clone())),
                (true, false) => Some(Transition::LoggedOut(id.clone())),
                _ => None,
            }
        })
        .collect()
}
