// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Segments: positions in the chain with a finite set of candidate placements.
//!
//! A [`Segment`] owns the bodies it can place and one [`Connection`] per
//! discrete configuration. A configuration says which body is used, which
//! connection sites it enters and exits through, and where the body origin and
//! the exit frame sit relative to the entry frame.
//!
//! Segments are built by the caller and are read-only during a search.

pub mod payload;

pub use payload::{Payload, PayloadGuard};

use crate::error::{GrowError, Result};
use crate::geometry::{hinv, Xform};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::ops::Deref;
use strum_macros::{Display, EnumString};

/// Polarity of a connection site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum Polarity {
    N,
    C,
}

impl Polarity {
    fn slot(self) -> usize {
        match self {
            Polarity::N => 0,
            Polarity::C => 1,
        }
    }
}

/// Global body identifier, comparable across segments.
pub type BodyId = usize;

/// A building block that configurations place.
#[derive(Clone)]
pub struct Body {
    pub id: BodyId,
    pub name: String,
    /// Available connection sites, indexed `[N, C]`.
    pub sites: [usize; 2],
    payload: Option<Payload>,
}

impl Body {
    pub fn new(id: BodyId, name: &str, sites: [usize; 2]) -> Self {
        Self {
            id,
            name: String::from(name),
            sites,
            payload: None,
        }
    }

    /// Attach caller-owned data (structure, annotations...).
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn n_sites(&self, pol: Polarity) -> usize {
        self.sites[pol.slot()]
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("sites", &self.sites)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

/// One discrete configuration of a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Entry frame to exit frame.
    pub x2exit: Xform,
    /// Entry frame to body origin.
    pub x2orgn: Xform,
    /// Index into the owning segment's bodies.
    pub body: usize,
    pub entry_site: Option<usize>,
    pub exit_site: Option<usize>,
}

impl Connection {
    pub fn new(x2exit: Xform, x2orgn: Xform, body: usize) -> Self {
        Self {
            x2exit,
            x2orgn,
            body,
            entry_site: None,
            exit_site: None,
        }
    }

    pub fn with_sites(mut self, entry_site: Option<usize>, exit_site: Option<usize>) -> Self {
        self.entry_site = entry_site;
        self.exit_site = exit_site;
        self
    }
}

/// True when both sites exist and are the same site.
pub fn sites_collide(a: Option<usize>, b: Option<usize>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

/// A position in the chain.
#[derive(Debug, Clone)]
pub struct Segment {
    entry_pol: Option<Polarity>,
    exit_pol: Option<Polarity>,
    bodies: Vec<Body>,
    configs: Vec<Connection>,
}

impl Segment {
    /// Create a segment. Every configuration must refer to one of `bodies`.
    pub fn new(
        entry_pol: Option<Polarity>,
        exit_pol: Option<Polarity>,
        bodies: Vec<Body>,
        configs: Vec<Connection>,
    ) -> Result<Self> {
        if let Some(bad) = configs.iter().find(|c| c.body >= bodies.len()) {
            return Err(GrowError::Config(format!(
                "configuration refers to body {} but segment has {} bodies",
                bad.body,
                bodies.len()
            )));
        }
        Ok(Self {
            entry_pol,
            exit_pol,
            bodies,
            configs,
        })
    }

    /// Number of configurations.
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn entry_pol(&self) -> Option<Polarity> {
        self.entry_pol
    }

    pub fn exit_pol(&self) -> Option<Polarity> {
        self.exit_pol
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn configs(&self) -> &[Connection] {
        &self.configs
    }

    pub fn x2exit(&self, i: usize) -> &Xform {
        &self.configs[i].x2exit
    }

    pub fn x2orgn(&self, i: usize) -> &Xform {
        &self.configs[i].x2orgn
    }

    /// Global body id placed by configuration `i`.
    pub fn body_id(&self, i: usize) -> BodyId {
        self.bodies[self.configs[i].body].id
    }

    pub fn entry_site(&self, i: usize) -> Option<usize> {
        self.configs[i].entry_site
    }

    pub fn exit_site(&self, i: usize) -> Option<usize> {
        self.configs[i].exit_site
    }

    /// Fewest sites of polarity `pol` on any body of this segment.
    pub fn min_sites(&self, pol: Polarity) -> usize {
        self.bodies.iter().map(|b| b.n_sites(pol)).min().unwrap_or(0)
    }

    /// Most sites of polarity `pol` on any body of this segment.
    pub fn max_sites(&self, pol: Polarity) -> usize {
        self.bodies.iter().map(|b| b.n_sites(pol)).max().unwrap_or(0)
    }

    /// Set of global body ids.
    pub fn body_ids(&self) -> BTreeSet<BodyId> {
        self.bodies.iter().map(|b| b.id).collect()
    }

    /// True if both segments draw from the same set of bodies.
    pub fn same_bodies_as(&self, other: &Segment) -> bool {
        self.body_ids() == other.body_ids()
    }

    /// Split into an entry half (no exit) and an exit half (no entry).
    ///
    /// The entry half keeps one configuration per distinct (body, entry site)
    /// and its original body placement. The exit half keeps one configuration
    /// per distinct (body, exit site), re-expressed from the body origin.
    pub fn split(&self) -> (Segment, Segment) {
        let mut seen = BTreeSet::new();
        let entry_configs = self
            .configs
            .iter()
            .filter(|c| seen.insert((c.body, c.entry_site)))
            .map(|c| Connection {
                x2exit: Xform::identity(),
                x2orgn: c.x2orgn,
                body: c.body,
                entry_site: c.entry_site,
                exit_site: None,
            })
            .collect();
        let mut seen = BTreeSet::new();
        let exit_configs = self
            .configs
            .iter()
            .filter(|c| seen.insert((c.body, c.exit_site)))
            .map(|c| Connection {
                x2exit: hinv(&c.x2orgn) * c.x2exit,
                x2orgn: Xform::identity(),
                body: c.body,
                entry_site: None,
                exit_site: c.exit_site,
            })
            .collect();
        let entry_half = Segment {
            entry_pol: self.entry_pol,
            exit_pol: None,
            bodies: self.bodies.clone(),
            configs: entry_configs,
        };
        let exit_half = Segment {
            entry_pol: None,
            exit_pol: self.exit_pol,
            bodies: self.bodies.clone(),
            configs: exit_configs,
        };
        (entry_half, exit_half)
    }

    /// Rejoin a configuration of this segment's entry half (`tail`,
    /// `tail_idx`) with one of its exit half (`head`, `head_idx`).
    ///
    /// Returns the configuration of `self` using the same body, entering
    /// through the tail's entry site and leaving through the head's exit site,
    /// or `None` if the two halves disagree or no such configuration exists.
    pub fn merge_idx(
        &self,
        tail: &Segment,
        tail_idx: usize,
        head: &Segment,
        head_idx: usize,
    ) -> Option<usize> {
        let body = tail.body_id(tail_idx);
        if body != head.body_id(head_idx) {
            return None;
        }
        let entry = tail.entry_site(tail_idx);
        let exit = head.exit_site(head_idx);
        (0..self.len())
            .find(|&i| self.body_id(i) == body && self.entry_site(i) == entry && self.exit_site(i) == exit)
    }

    /// Batched [`merge_idx`](Self::merge_idx), building the junction lookup once.
    pub fn merge_indices(
        &self,
        tail: &Segment,
        tail_idx: &[usize],
        head: &Segment,
        head_idx: &[usize],
    ) -> Vec<Option<usize>> {
        let mut junction = HashMap::with_capacity(self.len());
        for i in (0..self.len()).rev() {
            junction.insert((self.body_id(i), self.entry_site(i), self.exit_site(i)), i);
        }
        tail_idx
            .iter()
            .zip(head_idx)
            .map(|(&t, &h)| {
                let body = tail.body_id(t);
                if body != head.body_id(h) {
                    return None;
                }
                junction
                    .get(&(body, tail.entry_site(t), head.exit_site(h)))
                    .copied()
            })
            .collect()
    }
}

/// An ordered chain of segments.
#[derive(Debug, Clone, Default)]
pub struct Segments(Vec<Segment>);

impl Segments {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Configuration count of each segment.
    pub fn sizes(&self) -> Vec<usize> {
        self.0.iter().map(Segment::len).collect()
    }

    /// Split the chain at segment `i`.
    ///
    /// The tail is `self[..i]` followed by the entry half of segment `i`; the
    /// head is the exit half of segment `i` followed by `self[i+1..]`.
    pub fn split_at(&self, i: usize) -> (Segments, Segments) {
        let (entry_half, exit_half) = self.0[i].split();
        let mut tail = self.0[..i].to_vec();
        tail.push(entry_half);
        let mut head = vec![exit_half];
        head.extend_from_slice(&self.0[i + 1..]);
        (Segments(tail), Segments(head))
    }

    pub fn as_mut_slice(&mut self) -> &mut [Segment] {
        &mut self.0
    }

    pub fn into_inner(self) -> Vec<Segment> {
        self.0
    }
}

impl Deref for Segments {
    type Target = [Segment];

    fn deref(&self) -> &[Segment] {
        &self.0
    }
}

impl From<Vec<Segment>> for Segments {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}
