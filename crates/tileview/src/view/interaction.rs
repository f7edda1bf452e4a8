//! Pointer/keyboard state machine sitting between raw input and the model.

use serde::Deserialize;
use tracing::{debug, trace};

use crate::camera::CameraController;
use crate::geometry::{ScreenPoint, TileCoord, WorldPoint};
use crate::model::WorldModel;
use crate::view::render::Tint;
use crate::view::sprites::SpriteRegistry;
use crate::view::tiles::TileImageResolver;
use crate::view::transform::CoordinateTransformer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractionMode {
    #[default]
    Idle,
    /// A camera gesture owns the pointer until the button is released.
    Panning,
    Hovering,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverState {
    pub active: bool,
    /// Only meaningful while `active`.
    pub cell: TileCoord,
}

/// Last accepted click per button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickState {
    pub primary: Option<TileCoord>,
    pub secondary: Option<TileCoord>,
}

/// Highlight for the hovered tile: `Query` at rest, `Build` while a primary
/// press is pending over it, `Block` while a camera gesture owns the pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HoverTint {
    #[default]
    Query,
    Build,
    Block,
}

impl HoverTint {
    pub const fn tint(self) -> Tint {
        match self {
            HoverTint::Query => Tint::new(0.8, 0.8, 1.0, 1.0),
            HoverTint::Build => Tint::new(0.8, 1.0, 0.8, 0.8),
            HoverTint::Block => Tint::new(1.0, 0.7, 0.7, 0.6),
        }
    }
}

/// Pointer input after the host converted it to bottom-left screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down {
        point: ScreenPoint,
        button: PointerButton,
    },
    Up {
        point: ScreenPoint,
        button: PointerButton,
    },
    /// Movement while a button is held.
    Dragged { point: ScreenPoint },
    Moved { point: ScreenPoint },
    Scrolled { steps: i32 },
}

/// Directional keys held during the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl PanKeys {
    /// Opposite keys cancel per axis; the other axis is unaffected.
    pub fn pan_delta(self, step: f32) -> (f32, f32) {
        let axis = |positive: bool, negative: bool| match (positive, negative) {
            (true, false) => step,
            (false, true) => -step,
            _ => 0.0,
        };
        (axis(self.right, self.left), axis(self.up, self.down))
    }
}

/// Collaborators a pointer event may touch. Borrowed for one event only.
pub struct InteractionContext<'a> {
    pub camera: &'a mut dyn CameraController,
    pub model: &'a mut dyn WorldModel,
    pub transformer: &'a CoordinateTransformer,
    pub sprites: &'a mut SpriteRegistry,
    pub tiles: &'a mut TileImageResolver,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    mode: InteractionMode,
    hover: HoverState,
    clicks: ClickState,
    active_button: Option<PointerButton>,
    /// Button whose pointer-down the camera claimed. Only its release ends the
    /// gesture.
    gesture_button: Option<PointerButton>,
    tooltip_anchor: Option<WorldPoint>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn hover(&self) -> HoverState {
        self.hover
    }

    /// Hovered cell, if any.
    pub fn hovered_cell(&self) -> Option<TileCoord> {
        self.hover.active.then_some(self.hover.cell)
    }

    pub fn hover_tint(&self) -> HoverTint {
        if self.gesture_button.is_some() {
            HoverTint::Block
        } else if self.active_button == Some(PointerButton::Primary) {
            HoverTint::Build
        } else {
            HoverTint::Query
        }
    }

    pub fn clicks(&self) -> ClickState {
        self.clicks
    }

    pub fn active_button(&self) -> Option<PointerButton> {
        self.active_button
    }

    pub fn gesture_button(&self) -> Option<PointerButton> {
        self.gesture_button
    }

    pub fn tooltip_anchor(&self) -> Option<WorldPoint> {
        self.tooltip_anchor
    }

    /// Returns `true` when the event was consumed.
    pub fn handle(&mut self, ctx: &mut InteractionContext<'_>, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down { point, button } => self.pointer_down(ctx, point, button),
            PointerEvent::Up { point, button } => self.pointer_up(ctx, point, button),
            PointerEvent::Dragged { point } => self.pointer_dragged(ctx, point),
            PointerEvent::Moved { point } => self.pointer_moved(ctx, point),
            PointerEvent::Scrolled { steps } => {
                if steps == 0 {
                    return false;
                }
                ctx.camera.zoom(steps);
                true
            }
        }
    }

    pub fn pointer_down(
        &mut self,
        ctx: &mut InteractionContext<'_>,
        point: ScreenPoint,
        button: PointerButton,
    ) -> bool {
        if self.gesture_button.is_some() {
            trace!(button = ?button, "pointer_down_during_gesture");
            return true;
        }
        self.active_button = Some(button);
        if ctx.camera.try_claim_pointer_down(point, button) {
            self.gesture_button = Some(button);
            self.mode = InteractionMode::Panning;
            trace!(button = ?button, "pointer_gesture_claimed");
            return true;
        }
        false
    }

    pub fn pointer_dragged(
        &mut self,
        ctx: &mut InteractionContext<'_>,
        point: ScreenPoint,
    ) -> bool {
        let Some(button) = self.gesture_button.or(self.active_button) else {
            return false;
        };
        ctx.camera.try_claim_pointer_dragged(point, button)
    }

    pub fn pointer_up(
        &mut self,
        ctx: &mut InteractionContext<'_>,
        point: ScreenPoint,
        button: PointerButton,
    ) -> bool {
        if let Some(owner) = self.gesture_button {
            if button != owner {
                return true;
            }
            ctx.camera.try_claim_pointer_up(point, button);
            self.gesture_button = None;
            self.end_press();
            trace!(button = ?button, "pointer_gesture_finished");
            return true;
        }
        let claimed = ctx.camera.try_claim_pointer_up(point, button);
        self.end_press();
        if claimed {
            return true;
        }

        match button {
            PointerButton::Primary => self.primary_click(ctx, point),
            PointerButton::Secondary => self.secondary_click(ctx, point),
            PointerButton::Middle | PointerButton::Other => false,
        }
    }

    pub fn pointer_moved(&mut self, ctx: &mut InteractionContext<'_>, point: ScreenPoint) -> bool {
        match ctx.transformer.to_tile(&*ctx.camera, point) {
            Some(cell) => {
                self.hover = HoverState { active: true, cell };
                if self.mode != InteractionMode::Panning {
                    self.mode = InteractionMode::Hovering;
                }
            }
            None => {
                self.hover.active = false;
                if self.mode != InteractionMode::Panning {
                    self.mode = InteractionMode::Idle;
                }
            }
        }
        self.tooltip_anchor = Some(ctx.transformer.to_world(&*ctx.camera, point));
        true
    }

    /// Issues one keyboard pan for this frame. Returns whether the camera moved.
    pub fn poll_keyboard(camera: &mut dyn CameraController, keys: PanKeys, step: f32) -> bool {
        let (dx, dy) = keys.pan_delta(step);
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        camera.pan(dx, dy);
        true
    }

    fn end_press(&mut self) {
        self.active_button = None;
        self.mode = if self.hover.active {
            InteractionMode::Hovering
        } else {
            InteractionMode::Idle
        };
    }

    fn primary_click(&mut self, ctx: &mut InteractionContext<'_>, point: ScreenPoint) -> bool {
        let Some(cell) = ctx.transformer.to_tile(&*ctx.camera, point) else {
            return false;
        };
        self.clicks.primary = Some(cell);
        let world = ctx.transformer.to_world(&*ctx.camera, point);
        ctx.sprites.select_first_at(&*ctx.model, world);

        ctx.model.interact_tile(cell);
        debug!(x = cell.x, y = cell.y, "tile_interact_dispatched");
        ctx.tiles.refresh_at(&*ctx.model, cell);
        true
    }

    fn secondary_click(&mut self, ctx: &mut InteractionContext<'_>, point: ScreenPoint) -> bool {
        let Some(cell) = ctx.transformer.to_tile(&*ctx.camera, point) else {
            return false;
        };
        self.clicks.secondary = Some(cell);
        ctx.sprites.deselect_all();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Drawable, SpriteAtlas};
    use crate::model::{EntityId, Terrain};
    use crate::view::test_support::{FakeCamera, FakeWorld};
    use crate::view::tiles::{NetworkLinks, TileVisual};

    const TILE: f32 = 32.0;

    struct Harness {
        world: FakeWorld,
        camera: FakeCamera,
        transformer: CoordinateTransformer,
        sprites: SpriteRegistry,
        tiles: TileImageResolver,
        state: InteractionState,
    }

    impl Harness {
        fn new(camera: FakeCamera) -> Self {
            let world = FakeWorld::new(10, 10, Terrain::Grass);
            let tiles = TileImageResolver::new(&world, &SpriteAtlas::new());
            Self {
                world,
                camera,
                transformer: CoordinateTransformer::new(TILE, 10, 10),
                sprites: SpriteRegistry::new(TILE),
                tiles,
                state: InteractionState::new(),
            }
        }

        fn spawn(&mut self, x: f32, y: f32) -> EntityId {
            let id = self.world.spawn(WorldPoint::new(x, y), "entity/worker");
            let mut atlas = SpriteAtlas::new();
            atlas
                .insert("entity/worker", Drawable::solid(32, 32, [255; 4]))
                .expect("insert");
            self.sprites.reconcile(&self.world, &atlas);
            id
        }

        fn send(&mut self, event: PointerEvent) -> bool {
            let mut ctx = InteractionContext {
                camera: &mut self.camera,
                model: &mut self.world,
                transformer: &self.transformer,
                sprites: &mut self.sprites,
                tiles: &mut self.tiles,
            };
            self.state.handle(&mut ctx, event)
        }

        fn click(&mut self, world_x: f32, world_y: f32, button: PointerButton) -> bool {
            let point = at(world_x, world_y);
            self.send(PointerEvent::Down { point, button });
            self.send(PointerEvent::Up { point, button })
        }
    }

    /// Screen point over a world position, with the fake camera at rest.
    fn at(world_x: f32, world_y: f32) -> ScreenPoint {
        ScreenPoint::new(world_x * TILE, world_y * TILE)
    }

    #[test]
    fn hover_follows_pointer_and_clears_off_grid() {
        let mut harness = Harness::new(FakeCamera::default());
        harness.send(PointerEvent::Moved { point: at(-1.0, 5.0) });
        assert!(!harness.state.hover().active);
        assert_eq!(harness.state.mode(), InteractionMode::Idle);

        harness.send(PointerEvent::Moved { point: at(4.5, 4.5) });
        assert_eq!(harness.state.hovered_cell(), Some(TileCoord::new(4, 4)));
        assert_eq!(harness.state.hover_tint(), HoverTint::Query);
        assert_eq!(harness.state.hover_tint().tint(), Tint::new(0.8, 0.8, 1.0, 1.0));
        assert_eq!(harness.state.mode(), InteractionMode::Hovering);

        harness.send(PointerEvent::Moved { point: at(10.0, 4.5) });
        assert_eq!(harness.state.hovered_cell(), None);
        assert_eq!(harness.state.mode(), InteractionMode::Idle);
    }

    #[test]
    fn tooltip_anchor_tracks_every_move_even_off_grid() {
        let mut harness = Harness::new(FakeCamera::default());
        assert_eq!(harness.state.tooltip_anchor(), None);
        harness.send(PointerEvent::Moved { point: at(2.25, 3.5) });
        assert_eq!(harness.state.tooltip_anchor(), Some(WorldPoint::new(2.25, 3.5)));
        harness.send(PointerEvent::Moved { point: at(-3.0, 1.0) });
        assert_eq!(harness.state.tooltip_anchor(), Some(WorldPoint::new(-3.0, 1.0)));
    }

    #[test]
    fn primary_click_dispatches_one_intent_and_refreshes_neighbours() {
        let mut harness = Harness::new(FakeCamera::default());
        assert!(harness.click(3.5, 3.5, PointerButton::Primary));

        assert_eq!(harness.world.interactions, vec![TileCoord::new(3, 3)]);
        assert_eq!(harness.state.clicks().primary, Some(TileCoord::new(3, 3)));
        // The fake toggles a road; the refresh after the intent must already see it.
        assert_eq!(
            harness.tiles.grid().get(TileCoord::new(3, 3)),
            Some(TileVisual::Network(NetworkLinks::NONE))
        );
    }

    #[test]
    fn clicks_outside_the_grid_are_ignored() {
        let mut harness = Harness::new(FakeCamera::default());
        assert!(!harness.click(-0.5, 2.0, PointerButton::Primary));
        assert!(!harness.click(11.0, 2.0, PointerButton::Secondary));
        assert!(harness.world.interactions.is_empty());
        assert_eq!(harness.state.clicks(), ClickState::default());
    }

    #[test]
    fn primary_click_selects_only_the_sprite_under_the_pointer() {
        let mut harness = Harness::new(FakeCamera::default());
        let a = harness.spawn(1.0, 1.0);
        let b = harness.spawn(5.0, 5.0);

        harness.click(1.5, 1.5, PointerButton::Primary);
        assert_eq!(harness.sprites.selected().collect::<Vec<_>>(), vec![a]);

        harness.click(5.2, 5.9, PointerButton::Primary);
        assert_eq!(harness.sprites.selected().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn secondary_click_deselects_everything_without_an_intent() {
        let mut harness = Harness::new(FakeCamera::default());
        harness.spawn(1.0, 1.0);
        harness.click(1.5, 1.5, PointerButton::Primary);
        harness.world.interactions.clear();

        assert!(harness.click(8.0, 8.0, PointerButton::Secondary));
        assert_eq!(harness.sprites.selected().count(), 0);
        assert_eq!(harness.state.clicks().secondary, Some(TileCoord::new(8, 8)));
        assert_eq!(harness.state.clicks().primary, Some(TileCoord::new(1, 1)));
        assert!(harness.world.interactions.is_empty());
    }

    #[test]
    fn claimed_pointer_down_suppresses_the_tile_interaction() {
        let mut harness = Harness::new(FakeCamera::claiming(PointerButton::Primary));
        let point = at(2.5, 2.5);
        assert!(harness.send(PointerEvent::Down {
            point,
            button: PointerButton::Primary
        }));
        assert_eq!(harness.state.mode(), InteractionMode::Panning);
        assert!(harness.send(PointerEvent::Dragged { point: at(3.5, 2.5) }));
        assert!(harness.send(PointerEvent::Up {
            point,
            button: PointerButton::Primary
        }));

        assert!(harness.world.interactions.is_empty());
        assert_eq!(harness.state.clicks().primary, None);
        assert_eq!(harness.state.mode(), InteractionMode::Idle);
        assert_eq!(harness.state.active_button(), None);
    }

    #[test]
    fn panning_gesture_suppresses_release_even_if_camera_declines_it() {
        let mut harness = Harness::new(FakeCamera::claiming(PointerButton::Primary));
        harness.send(PointerEvent::Moved { point: at(2.5, 2.5) });
        harness.send(PointerEvent::Down {
            point: at(2.5, 2.5),
            button: PointerButton::Primary,
        });
        harness.camera.claim_button = None;
        harness.send(PointerEvent::Up {
            point: at(2.5, 2.5),
            button: PointerButton::Primary,
        });

        assert!(harness.world.interactions.is_empty());
        assert_eq!(harness.state.mode(), InteractionMode::Hovering);

        // The next unclaimed click goes through normally.
        harness.click(2.5, 2.5, PointerButton::Primary);
        assert_eq!(harness.world.interactions, vec![TileCoord::new(2, 2)]);
    }

    #[test]
    fn drags_are_offered_to_the_camera_with_the_active_button() {
        let mut harness = Harness::new(FakeCamera::default());
        assert!(!harness.send(PointerEvent::Dragged { point: at(1.0, 1.0) }));
        assert_eq!(harness.camera.drags, 0);

        harness.send(PointerEvent::Down {
            point: at(1.0, 1.0),
            button: PointerButton::Primary,
        });
        assert!(!harness.send(PointerEvent::Dragged { point: at(2.0, 1.0) }));
        assert_eq!(harness.camera.drags, 1);
        assert!(harness.world.interactions.is_empty());
    }

    #[test]
    fn other_buttons_do_nothing() {
        let mut harness = Harness::new(FakeCamera::default());
        assert!(!harness.click(2.5, 2.5, PointerButton::Middle));
        assert!(!harness.click(2.5, 2.5, PointerButton::Other));
        assert!(harness.world.interactions.is_empty());
        assert_eq!(harness.state.clicks(), ClickState::default());
    }

    #[test]
    fn scroll_forwards_zoom_steps() {
        let mut harness = Harness::new(FakeCamera::default());
        assert!(harness.send(PointerEvent::Scrolled { steps: 2 }));
        assert!(!harness.send(PointerEvent::Scrolled { steps: 0 }));
        assert_eq!(harness.camera.zooms, vec![2]);
    }

    #[test]
    fn opposite_keys_cancel_per_axis() {
        let keys = PanKeys {
            up: true,
            down: true,
            left: true,
            right: false,
        };
        assert_eq!(keys.pan_delta(8.0), (-8.0, 0.0));

        let mut camera = FakeCamera::default();
        assert!(InteractionState::poll_keyboard(&mut camera, keys, 8.0));
        assert!(!InteractionState::poll_keyboard(
            &mut camera,
            PanKeys {
                up: true,
                down: true,
                ..PanKeys::default()
            },
            8.0
        ));
        assert_eq!(camera.pans, vec![(-8.0, 0.0)]);
    }

    #[test]
    fn single_keys_pan_in_their_direction() {
        let up_right = PanKeys {
            up: true,
            right: true,
            ..PanKeys::default()
        };
        assert_eq!(up_right.pan_delta(4.0), (4.0, 4.0));
        let down = PanKeys {
            down: true,
            ..PanKeys::default()
        };
        assert_eq!(down.pan_delta(4.0), (0.0, -4.0));
        assert_eq!(PanKeys::default().pan_delta(4.0), (0.0, 0.0));
    }

    #[test]
    fn taps_of_other_buttons_do_not_break_a_camera_gesture() {
        let mut harness = Harness::new(FakeCamera::claiming(PointerButton::Middle));
        harness.send(PointerEvent::Moved { point: at(3.5, 3.5) });
        assert!(harness.send(PointerEvent::Down {
            point: at(3.5, 3.5),
            button: PointerButton::Middle,
        }));

        harness.click(3.5, 3.5, PointerButton::Primary);
        assert_eq!(harness.state.mode(), InteractionMode::Panning);
        assert_eq!(harness.state.gesture_button(), Some(PointerButton::Middle));
        assert!(harness.send(PointerEvent::Dragged { point: at(4.5, 3.5) }));
        assert_eq!(harness.camera.drags, 1);

        harness.click(3.5, 3.5, PointerButton::Primary);
        harness.click(3.5, 3.5, PointerButton::Secondary);
        assert!(harness.world.interactions.is_empty());
        assert_eq!(harness.state.clicks(), ClickState::default());

        assert!(harness.send(PointerEvent::Up {
            point: at(4.5, 3.5),
            button: PointerButton::Middle,
        }));
        assert_eq!(harness.state.gesture_button(), None);
        assert_eq!(harness.state.mode(), InteractionMode::Hovering);

        harness.click(3.5, 3.5, PointerButton::Primary);
        assert_eq!(harness.world.interactions, vec![TileCoord::new(3, 3)]);
    }

    #[test]
    fn hover_tint_follows_the_pointer_state() {
        let mut harness = Harness::new(FakeCamera::claiming(PointerButton::Middle));
        harness.send(PointerEvent::Moved { point: at(1.5, 1.5) });
        assert_eq!(harness.state.hover_tint(), HoverTint::Query);

        harness.send(PointerEvent::Down {
            point: at(1.5, 1.5),
            button: PointerButton::Primary,
        });
        assert_eq!(harness.state.hover_tint(), HoverTint::Build);
        harness.send(PointerEvent::Up {
            point: at(1.5, 1.5),
            button: PointerButton::Primary,
        });
        assert_eq!(harness.state.hover_tint(), HoverTint::Query);

        harness.send(PointerEvent::Down {
            point: at(1.5, 1.5),
            button: PointerButton::Middle,
        });
        assert_eq!(harness.state.hover_tint(), HoverTint::Block);
    }

    #[test]
    fn hover_tints_match_their_palette() {
        assert_eq!(HoverTint::Build.tint(), Tint::new(0.8, 1.0, 0.8, 0.8));
        assert_eq!(HoverTint::Block.tint(), Tint::new(1.0, 0.7, 0.7, 0.6));
    }
}
