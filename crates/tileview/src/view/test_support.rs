//! Hand-written fakes for the model and camera seams.

use std::cell::RefCell;
use std::rc::Rc;

use crate::camera::{CameraController, Projection, Viewport};
use crate::geometry::{ScreenPoint, TileCoord, Vec2, WorldPoint};
use crate::model::{
    ChangeFeed, Direction, EntityId, EntityView, Metadata, ModelChange, Subscription,
    SubscriptionId, Terrain, TileRef, WorldModel,
};
use crate::view::PointerButton;

struct FakeEntity {
    id: EntityId,
    position: WorldPoint,
    sprite_key: String,
    metadata: Metadata,
}

pub(crate) struct FakeWorld {
    width: u32,
    height: u32,
    terrain: Vec<Terrain>,
    network: Vec<bool>,
    entities: Vec<FakeEntity>,
    next_entity: u64,
    feed: ChangeFeed,
    pub(crate) interactions: Vec<TileCoord>,
    pub(crate) unsubscribed: Vec<SubscriptionId>,
}

impl FakeWorld {
    pub(crate) fn new(width: u32, height: u32, terrain: Terrain) -> Self {
        let cells = width as usize * height as usize;
        Self {
            width,
            height,
            terrain: vec![terrain; cells],
            network: vec![false; cells],
            entities: Vec::new(),
            next_entity: 1,
            feed: ChangeFeed::default(),
            interactions: Vec::new(),
            unsubscribed: Vec::new(),
        }
    }

    pub(crate) fn fill_terrain(&mut self, terrain: Terrain) {
        self.terrain.iter_mut().for_each(|cell| *cell = terrain);
    }

    pub(crate) fn set_network(&mut self, coord: TileCoord, network: bool) {
        let index = self.index(coord);
        self.network[index] = network;
    }

    pub(crate) fn is_network(&self, coord: TileCoord) -> bool {
        self.network[self.index(coord)]
    }

    pub(crate) fn spawn(&mut self, position: WorldPoint, sprite_key: &str) -> EntityId {
        self.spawn_with(position, sprite_key, Metadata::new())
    }

    pub(crate) fn spawn_with(
        &mut self,
        position: WorldPoint,
        sprite_key: &str,
        metadata: Metadata,
    ) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        self.entities.push(FakeEntity {
            id,
            position,
            sprite_key: sprite_key.to_string(),
            metadata,
        });
        id
    }

    pub(crate) fn despawn(&mut self, id: EntityId) {
        self.entities.retain(|entity| entity.id != id);
    }

    pub(crate) fn move_entity(&mut self, id: EntityId, position: WorldPoint) {
        if let Some(entity) = self.entities.iter_mut().find(|entity| entity.id == id) {
            entity.position = position;
        }
    }

    pub(crate) fn publish(&mut self, change: ModelChange) {
        self.feed.publish(change);
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.feed.subscriber_count()
    }

    fn index(&self, coord: TileCoord) -> usize {
        coord.y as usize * self.width as usize + coord.x as usize
    }
}

impl WorldModel for FakeWorld {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn tile(&self, coord: TileCoord) -> TileRef {
        TileRef::new(coord.x as i32, coord.y as i32, self.terrain[self.index(coord)])
    }

    fn neighbour(&self, tile: TileRef, direction: Direction) -> TileRef {
        let (dx, dy) = direction.offset();
        let (x, y) = (tile.x + dx, tile.y + dy);
        if tile.is_dummy() || x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return TileRef::dummy();
        }
        self.tile(TileCoord::new(x as u32, y as u32))
    }

    fn has_network_adjacency(&self, tile: TileRef) -> bool {
        tile.coord().is_some_and(|coord| self.is_network(coord))
    }

    fn entities(&self) -> Vec<EntityId> {
        self.entities.iter().map(|entity| entity.id).collect()
    }

    fn entity(&self, id: EntityId) -> Option<EntityView<'_>> {
        self.entities
            .iter()
            .find(|entity| entity.id == id)
            .map(|entity| EntityView {
                position: entity.position,
                sprite_key: entity.sprite_key.as_str(),
            })
    }

    fn metadata(&self, id: EntityId) -> Metadata {
        self.entities
            .iter()
            .find(|entity| entity.id == id)
            .map(|entity| entity.metadata.clone())
            .unwrap_or_default()
    }

    fn subscribe(&mut self) -> Subscription {
        self.feed.subscribe()
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.unsubscribed.push(id);
        self.feed.unsubscribe(id);
    }

    /// Toggles a road on the clicked cell, like the sandbox world does.
    fn interact_tile(&mut self, coord: TileCoord) {
        self.interactions.push(coord);
        let network = self.is_network(coord);
        self.set_network(coord, !network);
        self.feed.publish(ModelChange::StateChanged);
    }
}

/// Screen pixel == world pixel shifted by `offset`. Claims every event of
/// `claim_button` when set.
#[derive(Debug, Default)]
pub(crate) struct FakeCamera {
    pub(crate) offset: Vec2,
    pub(crate) claim_button: Option<PointerButton>,
    pub(crate) pans: Vec<(f32, f32)>,
    pub(crate) zooms: Vec<i32>,
    /// Shared so tests can still read it after the camera is boxed into a view.
    pub(crate) resizes: Rc<RefCell<Vec<(u32, u32)>>>,
    pub(crate) drags: usize,
}

impl FakeCamera {
    pub(crate) fn claiming(button: PointerButton) -> Self {
        Self {
            claim_button: Some(button),
            ..Self::default()
        }
    }

    fn claims(&self, button: PointerButton) -> bool {
        self.claim_button == Some(button)
    }
}

impl CameraController for FakeCamera {
    fn try_claim_pointer_down(&mut self, _: ScreenPoint, button: PointerButton) -> bool {
        self.claims(button)
    }

    fn try_claim_pointer_up(&mut self, _: ScreenPoint, button: PointerButton) -> bool {
        self.claims(button)
    }

    fn try_claim_pointer_dragged(&mut self, _: ScreenPoint, button: PointerButton) -> bool {
        self.drags += 1;
        self.claims(button)
    }

    fn unproject(&self, point: ScreenPoint) -> Vec2 {
        Vec2::new(point.x + self.offset.x, point.y + self.offset.y)
    }

    fn pan(&mut self, dx: f32, dy: f32) {
        self.pans.push((dx, dy));
        self.offset.x += dx;
        self.offset.y += dy;
    }

    fn zoom(&mut self, steps: i32) {
        self.zooms.push(steps);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.resizes.borrow_mut().push((width, height));
    }

    fn projection(&self) -> Projection {
        Projection {
            center: self.offset,
            zoom: 1.0,
            viewport: Viewport {
                width: 0,
                height: 0,
            },
        }
    }
}
