use std::collections::HashMap;

use tracing::{debug, trace};

use crate::assets::{AssetProvider, DrawableId};
use crate::geometry::TileCoord;
use crate::model::{Direction, Terrain, TileRef, WorldModel};

const GROUND_TERRAINS: [Terrain; 4] =
    [Terrain::Grass, Terrain::Dirt, Terrain::Sand, Terrain::Water];

/// Which orthogonal neighbours of a network tile are network tiles too.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NetworkLinks(u8);

impl NetworkLinks {
    pub const NONE: NetworkLinks = NetworkLinks(0);

    pub fn with(self, direction: Direction) -> Self {
        Self(self.0 | Self::bit(direction))
    }

    pub fn contains(self, direction: Direction) -> bool {
        self.0 & Self::bit(direction) != 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    fn bit(direction: Direction) -> u8 {
        match direction {
            Direction::North => 0b0001,
            Direction::East => 0b0010,
            Direction::South => 0b0100,
            Direction::West => 0b1000,
        }
    }

    fn all() -> impl Iterator<Item = NetworkLinks> {
        (0u8..16).map(NetworkLinks)
    }

    /// `nesw` letters of the linked sides, or `x` for an isolated segment.
    fn suffix(self) -> String {
        let suffix = Direction::ALL
            .iter()
            .filter(|direction| self.contains(**direction))
            .map(|direction| match direction {
                Direction::North => 'n',
                Direction::East => 'e',
                Direction::South => 's',
                Direction::West => 'w',
            })
            .collect::<String>();
        if suffix.is_empty() {
            "x".to_string()
        } else {
            suffix
        }
    }
}

/// What a grid cell currently draws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TileVisual {
    #[default]
    Unset,
    Ground(Terrain),
    Network(NetworkLinks),
}

impl TileVisual {
    /// Derives the variant from the model. Pure: the same model state always
    /// yields the same variant.
    pub fn from_tile(model: &dyn WorldModel, tile: TileRef) -> TileVisual {
        if tile.is_dummy() {
            return TileVisual::Unset;
        }
        if model.has_network_adjacency(tile) {
            let links = Direction::ALL
                .iter()
                .fold(NetworkLinks::NONE, |links, direction| {
                    let neighbour = model.neighbour(tile, *direction);
                    if !neighbour.is_dummy() && model.has_network_adjacency(neighbour) {
                        links.with(*direction)
                    } else {
                        links
                    }
                });
            return TileVisual::Network(links);
        }
        match tile.terrain {
            Terrain::None => TileVisual::Unset,
            terrain => TileVisual::Ground(terrain),
        }
    }

    /// Every variant that can carry a drawable.
    pub fn all() -> impl Iterator<Item = TileVisual> {
        GROUND_TERRAINS
            .into_iter()
            .map(TileVisual::Ground)
            .chain(NetworkLinks::all().map(TileVisual::Network))
    }

    pub fn sprite_key(self) -> Option<String> {
        match self {
            TileVisual::Unset => None,
            TileVisual::Ground(Terrain::None) => None,
            TileVisual::Ground(Terrain::Grass) => Some("tile/grass".to_string()),
            TileVisual::Ground(Terrain::Dirt) => Some("tile/dirt".to_string()),
            TileVisual::Ground(Terrain::Sand) => Some("tile/sand".to_string()),
            TileVisual::Ground(Terrain::Water) => Some("tile/water".to_string()),
            TileVisual::Network(links) => Some(format!("tile/road_{}", links.suffix())),
        }
    }
}

/// Dense `width × height` table of variants, fixed in size for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileVisualGrid {
    width: u32,
    height: u32,
    cells: Vec<TileVisual>,
}

impl TileVisualGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![TileVisual::Unset; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, coord: TileCoord) -> Option<TileVisual> {
        self.index_of(coord).map(|index| self.cells[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, TileVisual)> + '_ {
        let width = self.width.max(1);
        self.cells.iter().enumerate().map(move |(index, visual)| {
            let index = index as u32;
            (TileCoord::new(index % width, index / width), *visual)
        })
    }

    fn set(&mut self, coord: TileCoord, visual: TileVisual) -> bool {
        match self.index_of(coord) {
            Some(index) => {
                self.cells[index] = visual;
                true
            }
            None => false,
        }
    }

    fn index_of(&self, coord: TileCoord) -> Option<usize> {
        if coord.x >= self.width || coord.y >= self.height {
            return None;
        }
        Some(coord.y as usize * self.width as usize + coord.x as usize)
    }
}

/// Variant -> drawable table, filled once from the asset provider.
#[derive(Debug, Clone, Default)]
pub struct TileImageCache {
    drawables: HashMap<TileVisual, DrawableId>,
}

impl TileImageCache {
    pub fn new(assets: &dyn AssetProvider) -> Self {
        let drawables = TileVisual::all()
            .filter_map(|visual| {
                let key = visual.sprite_key()?;
                assets.lookup(&key).map(|id| (visual, id))
            })
            .collect::<HashMap<_, _>>();
        Self { drawables }
    }

    pub fn get(&self, visual: TileVisual) -> Option<DrawableId> {
        self.drawables.get(&visual).copied()
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }
}

/// Keeps [`TileVisualGrid`] in step with the model, touching only the cells an
/// event can have affected.
#[derive(Debug, Clone)]
pub struct TileImageResolver {
    grid: TileVisualGrid,
    cache: TileImageCache,
}

impl TileImageResolver {
    pub fn new(model: &dyn WorldModel, assets: &dyn AssetProvider) -> Self {
        let cache = TileImageCache::new(assets);
        let mut resolver = Self {
            grid: TileVisualGrid::new(model.width(), model.height()),
            cache,
        };
        resolver.refresh_all(model);
        debug!(
            width = resolver.grid.width(),
            height = resolver.grid.height(),
            cached_variants = resolver.cache.len(),
            "tile_visuals_initialized"
        );
        resolver
    }

    pub fn grid(&self) -> &TileVisualGrid {
        &self.grid
    }

    pub fn cache(&self) -> &TileImageCache {
        &self.cache
    }

    /// Drawable for the cell, if its variant has one.
    pub fn drawable_at(&self, coord: TileCoord) -> Option<DrawableId> {
        self.grid.get(coord).and_then(|visual| self.cache.get(visual))
    }

    /// Recomputes one cell. Network tiles also recompute their four orthogonal
    /// neighbours, whose variant depends on this tile. Returns how many cells
    /// were written.
    pub fn refresh(&mut self, model: &dyn WorldModel, tile: TileRef) -> usize {
        if tile.is_dummy() {
            return 0;
        }
        let mut written = usize::from(self.store(model, tile));
        if model.has_network_adjacency(tile) {
            for direction in Direction::ALL {
                written += usize::from(self.store(model, model.neighbour(tile, direction)));
            }
        }
        trace!(x = tile.x, y = tile.y, written, "tile_refreshed");
        written
    }

    pub fn refresh_at(&mut self, model: &dyn WorldModel, coord: TileCoord) -> usize {
        if coord.x >= self.grid.width() || coord.y >= self.grid.height() {
            return 0;
        }
        self.refresh(model, model.tile(coord))
    }

    pub fn refresh_all(&mut self, model: &dyn WorldModel) {
        for x in 0..self.grid.width() {
            for y in 0..self.grid.height() {
                let tile = model.tile(TileCoord::new(x, y));
                self.store(model, tile);
            }
        }
    }

    fn store(&mut self, model: &dyn WorldModel, tile: TileRef) -> bool {
        let Some(coord) = tile.coord() else {
            return false;
        };
        self.grid.set(coord, TileVisual::from_tile(model, tile))
    }
}
