//! Presentation and input layer over a [`WorldModel`].
//!
//! [`WorldView`] owns the coordinate transformer, tile image resolver, sprite
//! registry, interaction state and renderer. The model stays with the caller
//! and is lent to each call.

pub mod interaction;
pub mod render;
pub mod sprites;
pub mod text;
pub mod tiles;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_support;

use tracing::{debug, trace};

use crate::app::ViewConfig;
use crate::assets::AssetProvider;
use crate::camera::CameraController;
use crate::model::{ModelChange, Subscription, WorldModel};

pub use interaction::{
    ClickState, HoverState, HoverTint, InteractionContext, InteractionMode, InteractionState,
    PanKeys, PointerButton, PointerEvent,
};
pub use render::{FrameRenderer, RenderScene, Tint};
pub use sprites::{SpriteProxy, SpriteRegistry};
pub use tiles::{NetworkLinks, TileImageCache, TileImageResolver, TileVisual, TileVisualGrid};
pub use transform::CoordinateTransformer;

pub struct WorldView {
    camera: Box<dyn CameraController>,
    assets: Box<dyn AssetProvider>,
    transformer: CoordinateTransformer,
    tiles: TileImageResolver,
    sprites: SpriteRegistry,
    interaction: InteractionState,
    renderer: FrameRenderer,
    subscription: Option<Subscription>,
    key_pan_step_px: f32,
}

impl WorldView {
    /// Builds every component, subscribes to `model` and runs the first
    /// reconciliation so the view starts in sync.
    pub fn new(
        model: &mut dyn WorldModel,
        camera: Box<dyn CameraController>,
        assets: Box<dyn AssetProvider>,
        config: &ViewConfig,
    ) -> Self {
        let tile_length = config.tile_length_px;
        let transformer = CoordinateTransformer::new(tile_length, model.width(), model.height());
        let tiles = TileImageResolver::new(&*model, assets.as_ref());
        let mut sprites = SpriteRegistry::new(tile_length);
        sprites.reconcile(&*model, assets.as_ref());
        let subscription = model.subscribe();
        debug!(
            subscription = subscription.id().0,
            width = model.width(),
            height = model.height(),
            sprites = sprites.len(),
            "world_view_attached"
        );

        Self {
            camera,
            assets,
            transformer,
            tiles,
            sprites,
            interaction: InteractionState::new(),
            renderer: FrameRenderer::new(config.tooltip_offset_px, config.tooltip_line_height_px),
            subscription: Some(subscription),
            key_pan_step_px: config.key_pan_step_px,
        }
    }

    pub fn handle_pointer(&mut self, model: &mut dyn WorldModel, event: PointerEvent) -> bool {
        let mut ctx = InteractionContext {
            camera: self.camera.as_mut(),
            model,
            transformer: &self.transformer,
            sprites: &mut self.sprites,
            tiles: &mut self.tiles,
        };
        self.interaction.handle(&mut ctx, event)
    }

    pub fn poll_keyboard(&mut self, keys: PanKeys) -> bool {
        InteractionState::poll_keyboard(self.camera.as_mut(), keys, self.key_pan_step_px)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }

    /// Applies every queued model notification. Tile notifications refresh
    /// their cell; every notification reconciles the sprite registry. Returns
    /// how many notifications were handled.
    pub fn sync(&mut self, model: &dyn WorldModel) -> usize {
        let Some(subscription) = self.subscription.as_ref() else {
            return 0;
        };
        let changes = subscription.drain();
        for change in &changes {
            if let ModelChange::TileChanged(coord) = change {
                self.tiles.refresh_at(model, *coord);
            }
            self.sprites.reconcile(model, self.assets.as_ref());
        }
        if !changes.is_empty() {
            trace!(count = changes.len(), sprites = self.sprites.len(), "model_changes_applied");
        }
        changes.len()
    }

    pub fn advance(&mut self, dt_seconds: f32) {
        self.sprites.advance_animations(dt_seconds);
        self.camera.advance(dt_seconds);
    }

    pub fn render(&self, model: &dyn WorldModel, frame: &mut [u8], width: u32, height: u32) {
        let scene = RenderScene {
            model,
            assets: self.assets.as_ref(),
            projection: self.camera.projection(),
            transformer: &self.transformer,
            tiles: &self.tiles,
            sprites: &self.sprites,
            interaction: &self.interaction,
        };
        self.renderer.render(frame, width, height, &scene);
    }

    /// Removes the model subscription. Safe to call more than once.
    pub fn detach(&mut self, model: &mut dyn WorldModel) {
        if let Some(subscription) = self.subscription.take() {
            model.unsubscribe(subscription.id());
            debug!(subscription = subscription.id().0, "world_view_detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn sprites(&self) -> &SpriteRegistry {
        &self.sprites
    }

    pub fn tiles(&self) -> &TileImageResolver {
        &self.tiles
    }

    pub fn transformer(&self) -> &CoordinateTransformer {
        &self.transformer
    }

    pub fn camera(&self) -> &dyn CameraController {
        self.camera.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::assets::{Drawable, SpriteAtlas};
    use crate::geometry::{ScreenPoint, TileCoord, WorldPoint};
    use crate::model::Terrain;
    use super::test_support::{FakeCamera, FakeWorld};

    fn config() -> ViewConfig {
        ViewConfig {
            tile_length_px: 32.0,
            ..ViewConfig::default()
        }
    }

    fn atlas() -> Box<SpriteAtlas> {
        let mut atlas = SpriteAtlas::new();
        atlas
            .insert("entity/worker", Drawable::solid(32, 32, [255, 0, 0, 255]))
            .expect("insert");
        atlas
            .insert("tile/grass", Drawable::solid(32, 32, [0, 255, 0, 255]))
            .expect("insert");
        Box::new(atlas)
    }

    fn view_over(world: &mut FakeWorld) -> WorldView {
        WorldView::new(world, Box::new(FakeCamera::default()), atlas(), &config())
    }

    #[test]
    fn construction_subscribes_and_reconciles() {
        let mut world = FakeWorld::new(6, 6, Terrain::Grass);
        world.spawn(WorldPoint::new(1.0, 1.0), "entity/worker");
        let view = view_over(&mut world);
        assert!(view.is_attached());
        assert_eq!(world.subscriber_count(), 1);
        assert_eq!(view.sprites().len(), 1);
        assert_eq!(
            view.tiles().grid().get(TileCoord::new(5, 5)),
            Some(TileVisual::Ground(Terrain::Grass))
        );
    }

    #[test]
    fn sync_reconciles_after_state_changes() {
        let mut world = FakeWorld::new(6, 6, Terrain::Grass);
        let mut view = view_over(&mut world);
        world.spawn(WorldPoint::new(1.0, 1.0), "entity/worker");
        world.spawn(WorldPoint::new(2.0, 1.0), "entity/worker");
        assert_eq!(view.sprites().len(), 0);

        world.publish(ModelChange::StateChanged);
        assert_eq!(view.sync(&world), 1);
        assert_eq!(view.sprites().len(), world.entities().len());
        assert_eq!(view.sync(&world), 0);
    }

    #[test]
    fn tile_notifications_refresh_their_cell() {
        let mut world = FakeWorld::new(6, 6, Terrain::Grass);
        let mut view = view_over(&mut world);
        world.set_network(TileCoord::new(2, 2), true);
        world.publish(ModelChange::TileChanged(TileCoord::new(2, 2)));
        view.sync(&world);
        assert_eq!(
            view.tiles().grid().get(TileCoord::new(2, 2)),
            Some(TileVisual::Network(NetworkLinks::NONE))
        );
    }

    #[test]
    fn primary_click_round_trips_through_the_model() {
        let mut world = FakeWorld::new(6, 6, Terrain::Grass);
        let mut view = view_over(&mut world);
        let point = ScreenPoint::new(3.5 * 32.0, 4.5 * 32.0);
        view.handle_pointer(
            &mut world,
            PointerEvent::Down {
                point,
                button: PointerButton::Primary,
            },
        );
        assert!(view.handle_pointer(
            &mut world,
            PointerEvent::Up {
                point,
                button: PointerButton::Primary,
            },
        ));
        assert_eq!(world.interactions, vec![TileCoord::new(3, 4)]);
        assert_eq!(view.sync(&world), 1);
    }

    #[test]
    fn detach_stops_notifications_and_is_idempotent() {
        let mut world = FakeWorld::new(4, 4, Terrain::Grass);
        let mut view = view_over(&mut world);
        view.detach(&mut world);
        view.detach(&mut world);
        assert!(!view.is_attached());
        assert_eq!(world.unsubscribed.len(), 1);
        assert_eq!(world.subscriber_count(), 0);

        world.spawn(WorldPoint::new(0.0, 0.0), "entity/worker");
        world.publish(ModelChange::StateChanged);
        assert_eq!(view.sync(&world), 0);
        assert_eq!(view.sprites().len(), 0);
    }

    #[test]
    fn render_fills_the_frame() {
        let mut world = FakeWorld::new(2, 2, Terrain::Grass);
        let view = view_over(&mut world);
        let mut frame = vec![0u8; 64 * 64 * 4];
        view.render(&world, &mut frame, 64, 64);
        assert_eq!(&frame[0..4], &[0, 255, 0, 255]);
    }

    #[test]
    fn keyboard_and_resize_reach_the_camera() {
        let mut world = FakeWorld::new(2, 2, Terrain::Grass);
        let camera = FakeCamera::default();
        let resizes = Rc::clone(&camera.resizes);
        let mut view = WorldView::new(&mut world, Box::new(camera), atlas(), &config());
        assert!(view.poll_keyboard(PanKeys {
            left: true,
            ..PanKeys::default()
        }));
        view.resize(640, 480);
        let center = view.camera().projection().center;
        assert_eq!((center.x, center.y), (-config().key_pan_step_px, 0.0));
        assert_eq!(*resizes.borrow(), vec![(640, 480)]);
    }
}
