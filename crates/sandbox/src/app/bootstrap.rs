use std::path::Path;

use tileview::{
    load_view_config, resolve_app_paths, AppError, LoopConfig, PanBounds, PanCamera, SpriteAtlas,
    ViewConfig, Viewport, WorldModel, WorldView,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::sprites::procedural_atlas;
use super::world::GridWorld;

const WORLD_WIDTH: u32 = 48;
const WORLD_HEIGHT: u32 = 32;
const WORLD_SEED: u64 = 0x5eed;

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) view_config: ViewConfig,
    pub(crate) world: GridWorld,
    pub(crate) atlas: SpriteAtlas,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== tileview sandbox startup ===");

    let view_config = load_view_config()?;
    let paths = resolve_app_paths()?;
    let atlas = load_atlas(&paths.sprites_dir, view_config.tile_length_px)?;
    let world = GridWorld::new(WORLD_WIDTH, WORLD_HEIGHT, WORLD_SEED);
    info!(
        root = %paths.root.display(),
        sprites = atlas.len(),
        tile_length_px = view_config.tile_length_px,
        "sandbox_ready"
    );

    Ok(AppWiring {
        loop_config: LoopConfig {
            window_title: "tileview sandbox".to_string(),
            ..LoopConfig::default()
        },
        view_config,
        world,
        atlas,
    })
}

/// Builds the view once the window size is known.
pub(crate) fn build_view(
    model: &mut dyn WorldModel,
    viewport: Viewport,
    config: &ViewConfig,
    atlas: SpriteAtlas,
) -> WorldView {
    let bounds = PanBounds::around_grid(
        model.width(),
        model.height(),
        config.tile_length_px,
        config.pan_margin_tiles,
    );
    let camera = PanCamera::new(viewport, bounds, config.pan_button);
    WorldView::new(model, Box::new(camera), Box::new(atlas), config)
}

fn load_atlas(sprites_dir: &Path, tile_length_px: f32) -> Result<SpriteAtlas, AppError> {
    if sprites_dir.is_dir() {
        let atlas = SpriteAtlas::load_dir(sprites_dir)?;
        if !atlas.is_empty() {
            info!(path = %sprites_dir.display(), sprites = atlas.len(), "sprite_atlas_loaded");
            return Ok(atlas);
        }
    }
    let tile_px = tile_length_px.round().max(1.0) as u32;
    let atlas = procedural_atlas(tile_px)?;
    info!(
        path = %sprites_dir.display(),
        sprites = atlas.len(),
        tile_px,
        "procedural_sprites_generated"
    );
    Ok(atlas)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
