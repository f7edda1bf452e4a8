use tracing::{debug, trace};

use crate::assets::{AssetProvider, DrawableId};
use crate::geometry::{WorldPoint, WorldRect};
use crate::model::{EntityId, WorldModel};

pub const SPRITE_FRAME_SECONDS: f32 = 0.2;
const MAX_ANIMATION_FRAMES: usize = 64;

/// Renderable stand-in for one model entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteProxy {
    entity: EntityId,
    selected: bool,
    frames: Vec<DrawableId>,
    /// Footprint in tile units.
    width: f32,
    height: f32,
    elapsed_seconds: f32,
}

impl SpriteProxy {
    fn build(
        entity: EntityId,
        sprite_key: &str,
        assets: &dyn AssetProvider,
        tile_length: f32,
    ) -> Self {
        let frames = resolve_frames(sprite_key, assets);
        let (width, height) = frames
            .first()
            .and_then(|id| assets.drawable(*id))
            .filter(|_| tile_length > 0.0)
            .map(|drawable| {
                (
                    drawable.width() as f32 / tile_length,
                    drawable.height() as f32 / tile_length,
                )
            })
            .unwrap_or((1.0, 1.0));
        Self {
            entity,
            selected: false,
            frames,
            width,
            height,
            elapsed_seconds: 0.0,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn select(&mut self) {
        self.selected = true;
    }

    pub fn deselect(&mut self) {
        self.selected = false;
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frame to show right now, or `None` for an entity without sprites.
    pub fn current_frame(&self) -> Option<DrawableId> {
        if self.frames.is_empty() {
            return None;
        }
        let index = (self.elapsed_seconds / SPRITE_FRAME_SECONDS) as usize % self.frames.len();
        self.frames.get(index).copied()
    }

    /// Footprint at the entity's current model position.
    pub fn rect(&self, model: &dyn WorldModel) -> Option<WorldRect> {
        let view = model.entity(self.entity)?;
        Some(WorldRect {
            origin: view.position,
            width: self.width,
            height: self.height,
        })
    }

    fn advance(&mut self, dt_seconds: f32) {
        if self.frames.len() < 2 || !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return;
        }
        let cycle = SPRITE_FRAME_SECONDS * self.frames.len() as f32;
        self.elapsed_seconds = (self.elapsed_seconds + dt_seconds) % cycle;
    }
}

/// Numbered frames `key/0`, `key/1`, ... when present, else the bare key.
fn resolve_frames(sprite_key: &str, assets: &dyn AssetProvider) -> Vec<DrawableId> {
    let numbered = (0..MAX_ANIMATION_FRAMES)
        .map_while(|index| assets.lookup(&format!("{sprite_key}/{index}")))
        .collect::<Vec<_>>();
    if !numbered.is_empty() {
        return numbered;
    }
    assets.lookup(sprite_key).into_iter().collect()
}

/// Owns every [`SpriteProxy`]. Proxies are only created or dropped by
/// [`SpriteRegistry::reconcile`].
#[derive(Debug, Clone)]
pub struct SpriteRegistry {
    proxies: Vec<SpriteProxy>,
    tile_length: f32,
}

impl SpriteRegistry {
    pub fn new(tile_length: f32) -> Self {
        Self {
            proxies: Vec::new(),
            tile_length,
        }
    }

    /// Rebuilds the whole proxy list in model order when the entity count
    /// changed; otherwise leaves every proxy untouched. Returns whether a
    /// rebuild happened.
    pub fn reconcile(&mut self, model: &dyn WorldModel, assets: &dyn AssetProvider) -> bool {
        let entities = model.entities();
        if entities.len() == self.proxies.len() {
            return false;
        }
        let previous = self.proxies.len();
        self.proxies = entities
            .into_iter()
            .map(|entity| {
                let sprite_key = model
                    .entity(entity)
                    .map(|view| view.sprite_key)
                    .unwrap_or_default();
                SpriteProxy::build(entity, sprite_key, assets, self.tile_length)
            })
            .collect();
        debug!(
            previous,
            current = self.proxies.len(),
            "sprite_registry_rebuilt"
        );
        true
    }

    /// Selects the first proxy in registry order whose footprint contains
    /// `point` and deselects every other one.
    pub fn select_first_at(
        &mut self,
        model: &dyn WorldModel,
        point: WorldPoint,
    ) -> Option<EntityId> {
        let mut found = None;
        for proxy in &mut self.proxies {
            let hit = found.is_none()
                && proxy
                    .rect(model)
                    .is_some_and(|rect| rect.contains(point));
            if hit {
                proxy.select();
                found = Some(proxy.entity);
            } else {
                proxy.deselect();
            }
        }
        if let Some(entity) = found {
            debug!(entity = entity.0, x = point.x, y = point.y, "sprite_selected");
        }
        found
    }

    pub fn deselect_all(&mut self) {
        self.proxies.iter_mut().for_each(SpriteProxy::deselect);
        trace!(count = self.proxies.len(), "sprites_deselected");
    }

    /// First proxy in registry order whose footprint strictly contains `point`.
    /// Points on an edge miss, unlike [`SpriteRegistry::select_first_at`].
    pub fn hit_test(&self, model: &dyn WorldModel, point: WorldPoint) -> Option<EntityId> {
        self.proxies
            .iter()
            .find(|proxy| {
                proxy
                    .rect(model)
                    .is_some_and(|rect| rect.contains_interior(point))
            })
            .map(SpriteProxy::entity)
    }

    pub fn selected(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.proxies
            .iter()
            .filter(|proxy| proxy.selected)
            .map(SpriteProxy::entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpriteProxy> {
        self.proxies.iter()
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn advance_animations(&mut self, dt_seconds: f32) {
        for proxy in &mut self.proxies {
            proxy.advance(dt_seconds);
        }
    }
}
