//! Query surface of the simulation model.
//!
//! The view never owns or mutates simulation state. It reads tiles and entities
//! through [`WorldModel`], sends tile-interact intents back, and learns about
//! changes from a [`Subscription`] registered once when the view is built.

use std::fmt::Display;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::geometry::{TileCoord, WorldPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Grid step for this direction. The grid grows upward, so north is `+y`.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Terrain {
    #[default]
    None,
    Grass,
    Dirt,
    Sand,
    Water,
}

/// Lightweight handle to one tile as seen by the model at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRef {
    pub x: i32,
    pub y: i32,
    pub terrain: Terrain,
    dummy: bool,
}

impl TileRef {
    pub const fn new(x: i32, y: i32, terrain: Terrain) -> Self {
        Self {
            x,
            y,
            terrain,
            dummy: false,
        }
    }

    /// Sentinel handed out for neighbour queries that step off the grid.
    pub const fn dummy() -> Self {
        Self {
            x: -1,
            y: -1,
            terrain: Terrain::None,
            dummy: true,
        }
    }

    pub const fn is_dummy(&self) -> bool {
        self.dummy
    }

    pub fn coord(&self) -> Option<TileCoord> {
        if self.dummy || self.x < 0 || self.y < 0 {
            return None;
        }
        Some(TileCoord::new(self.x as u32, self.y as u32))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Per-frame facts about an entity that the view needs to draw and hit-test it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityView<'a> {
    /// Bottom-left corner of the entity in tile units.
    pub position: WorldPoint,
    pub sprite_key: &'a str,
}

/// Ordered key/value pairs describing an entity. Iteration follows first
/// insertion; re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Display) {
        let key = key.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChange {
    /// Something about the simulation changed; the entity set may differ.
    StateChanged,
    /// The simulation itself rewrote a tile outside of a view intent.
    TileChanged(TileCoord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Receiving end of a model change channel.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: Receiver<ModelChange>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Takes every notification queued since the previous drain, in delivery order.
    pub fn drain(&self) -> Vec<ModelChange> {
        self.receiver.try_iter().collect()
    }
}

/// Sending side for model implementations: hands out subscriptions and fans
/// notifications out to all of them on the calling thread.
#[derive(Debug, Default)]
pub struct ChangeFeed {
    next_id: u64,
    senders: Vec<(SubscriptionId, Sender<ModelChange>)>,
}

impl ChangeFeed {
    pub fn subscribe(&mut self) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let (sender, receiver) = mpsc::channel();
        self.senders.push((id, sender));
        Subscription { id, receiver }
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.senders.len();
        self.senders.retain(|(existing, _)| *existing != id);
        self.senders.len() != before
    }

    pub fn publish(&mut self, change: ModelChange) {
        // A dropped receiver means its view went away without detaching.
        self.senders.retain(|(_, sender)| sender.send(change).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}

/// Everything the view reads from, or sends to, the simulation.
pub trait WorldModel {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Tile at an in-bounds coordinate.
    fn tile(&self, coord: TileCoord) -> TileRef;
    /// Orthogonal neighbour, or [`TileRef::dummy`] past the grid edge.
    fn neighbour(&self, tile: TileRef, direction: Direction) -> TileRef;
    fn has_network_adjacency(&self, tile: TileRef) -> bool;
    /// Live entities. The order defines reconciliation and hit-test order.
    fn entities(&self) -> Vec<EntityId>;
    fn entity_count(&self) -> usize {
        self.entities().len()
    }
    fn entity(&self, id: EntityId) -> Option<EntityView<'_>>;
    fn metadata(&self, id: EntityId) -> Metadata;
    fn subscribe(&mut self) -> Subscription;
    fn unsubscribe(&mut self, id: SubscriptionId);
    /// Tile-interact intent raised by a primary click on `coord`.
    fn interact_tile(&mut self, coord: TileCoord);
    /// Advances the simulation by one fixed step. Driven by the host loop.
    fn tick(&mut self, _fixed_dt_seconds: f32) {}
}
