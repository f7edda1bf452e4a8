use tileview::{
    ChangeFeed, Direction, EntityId, EntityView, Metadata, ModelChange, Subscription,
    SubscriptionId, Terrain, TileCoord, TileRef, WorldModel, WorldPoint,
};
use tracing::{debug, info};

pub(crate) const WORKER_SPRITE_KEY: &str = "entity/worker";

const TERRAIN_BLOCK_TILES: u32 = 4;
const INITIAL_WORKERS: usize = 4;
const MIN_WORKERS: usize = 2;
const MAX_WORKERS: usize = 12;
const POPULATION_INTERVAL_TICKS: u64 = 180;
const WORKER_SPEED_TILES_PER_SECOND: f32 = 1.5;
const ARRIVAL_THRESHOLD: f32 = 0.05;
const JOBS: [&str; 4] = ["hauling", "building", "idle", "surveying"];
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone)]
struct Worker {
    id: EntityId,
    position: WorldPoint,
    target: WorldPoint,
    job: &'static str,
    age_seconds: f32,
}

/// Small deterministic grid simulation: hashed terrain, toggleable roads and a
/// population of workers that wander and come and go over time.
#[derive(Debug)]
pub(crate) struct GridWorld {
    width: u32,
    height: u32,
    seed: u64,
    terrain: Vec<Terrain>,
    roads: Vec<bool>,
    workers: Vec<Worker>,
    next_entity_id: u64,
    tick_count: u64,
    feed: ChangeFeed,
}

impl GridWorld {
    pub(crate) fn new(width: u32, height: u32, seed: u64) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let terrain = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| {
                terrain_from_hash(fnv1a(
                    seed,
                    &[
                        u64::from(x / TERRAIN_BLOCK_TILES),
                        u64::from(y / TERRAIN_BLOCK_TILES),
                    ],
                ))
            })
            .collect::<Vec<_>>();
        let cell_count = terrain.len();

        let mut world = Self {
            width,
            height,
            seed,
            terrain,
            roads: vec![false; cell_count],
            workers: Vec::new(),
            next_entity_id: 1,
            tick_count: 0,
            feed: ChangeFeed::default(),
        };
        for _ in 0..INITIAL_WORKERS {
            world.spawn_worker();
        }
        info!(
            width,
            height,
            seed,
            workers = world.workers.len(),
            "grid_world_created"
        );
        world
    }

    pub(crate) fn is_road(&self, coord: TileCoord) -> bool {
        self.index(coord)
            .and_then(|index| self.roads.get(index).copied())
            .unwrap_or(false)
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        if coord.x >= self.width || coord.y >= self.height {
            return None;
        }
        Some(coord.y as usize * self.width as usize + coord.x as usize)
    }

    fn hash(&self, parts: &[u64]) -> u64 {
        fnv1a(self.seed, parts)
    }

    fn random_point(&self, salt: u64) -> WorldPoint {
        let x = self.hash(&[salt, 0]) % u64::from(self.width);
        let y = self.hash(&[salt, 1]) % u64::from(self.height);
        WorldPoint::new(x as f32, y as f32)
    }

    fn spawn_worker(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.saturating_add(1);
        let position = self.random_point(id.0.wrapping_mul(2));
        let target = self.random_point(id.0.wrapping_mul(2).wrapping_add(1));
        let job = JOBS[(self.hash(&[id.0, 7]) % JOBS.len() as u64) as usize];
        self.workers.push(Worker {
            id,
            position,
            target,
            job,
            age_seconds: 0.0,
        });
        debug!(entity = id.0, x = position.x, y = position.y, job, "worker_spawned");
        id
    }

    fn despawn_worker(&mut self, index: usize) {
        if index < self.workers.len() {
            let worker = self.workers.remove(index);
            debug!(entity = worker.id.0, "worker_despawned");
        }
    }

    fn update_population(&mut self) -> bool {
        let roll = self.hash(&[self.tick_count, 99]);
        let count = self.workers.len();
        let grow = count < MIN_WORKERS || (count < MAX_WORKERS && roll % 3 != 0);
        if grow {
            self.spawn_worker();
        } else if count > 0 {
            let index = (roll as usize / 3) % count;
            self.despawn_worker(index);
        }
        self.workers.len() != count
    }

    fn move_workers(&mut self, dt_seconds: f32) {
        let step = WORKER_SPEED_TILES_PER_SECOND * dt_seconds;
        let mut arrivals = Vec::new();
        for (index, worker) in self.workers.iter_mut().enumerate() {
            worker.age_seconds += dt_seconds;
            let dx = worker.target.x - worker.position.x;
            let dy = worker.target.y - worker.position.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance <= ARRIVAL_THRESHOLD.max(step) {
                worker.position = worker.target;
                arrivals.push(index);
            } else {
                worker.position.x += dx / distance * step;
                worker.position.y += dy / distance * step;
            }
        }
        for index in arrivals {
            let salt = self.hash(&[self.tick_count, index as u64]);
            let target = self.random_point(salt);
            if let Some(worker) = self.workers.get_mut(index) {
                worker.target = target;
            }
        }
    }
}

impl WorldModel for GridWorld {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn tile(&self, coord: TileCoord) -> TileRef {
        match self.index(coord) {
            Some(index) => TileRef::new(coord.x as i32, coord.y as i32, self.terrain[index]),
            None => TileRef::dummy(),
        }
    }

    fn neighbour(&self, tile: TileRef, direction: Direction) -> TileRef {
        if tile.is_dummy() {
            return TileRef::dummy();
        }
        let (dx, dy) = direction.offset();
        let x = tile.x + dx;
        let y = tile.y + dy;
        if x < 0 || y < 0 {
            return TileRef::dummy();
        }
        self.tile(TileCoord::new(x as u32, y as u32))
    }

    fn has_network_adjacency(&self, tile: TileRef) -> bool {
        tile.coord().is_some_and(|coord| self.is_road(coord))
    }

    fn entities(&self) -> Vec<EntityId> {
        self.workers.iter().map(|worker| worker.id).collect()
    }

    fn entity_count(&self) -> usize {
        self.workers.len()
    }

    fn entity(&self, id: EntityId) -> Option<EntityView<'_>> {
        self.workers
            .iter()
            .find(|worker| worker.id == id)
            .map(|worker| EntityView {
                position: worker.position,
                sprite_key: WORKER_SPRITE_KEY,
            })
    }

    fn metadata(&self, id: EntityId) -> Metadata {
        let Some(worker) = self.workers.iter().find(|worker| worker.id == id) else {
            return Metadata::new();
        };
        Metadata::new()
            .with("name", format!("worker {}", worker.id.0))
            .with("job", worker.job)
            .with("age", format!("{:.0}s", worker.age_seconds))
            .with(
                "pos",
                format!("{:.1},{:.1}", worker.position.x, worker.position.y),
            )
    }

    fn subscribe(&mut self) -> Subscription {
        self.feed.subscribe()
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.feed.unsubscribe(id);
    }

    fn interact_tile(&mut self, coord: TileCoord) {
        let Some(index) = self.index(coord) else {
            return;
        };
        if self.terrain[index] == Terrain::Water {
            debug!(x = coord.x, y = coord.y, "road_blocked_by_water");
            return;
        }
        let is_road = !self.roads[index];
        self.roads[index] = is_road;
        info!(x = coord.x, y = coord.y, is_road, "road_toggled");
        if !is_road {
            // The removed segment no longer cascades, so its road neighbours
            // have to be told their links changed.
            let tile = self.tile(coord);
            for direction in Direction::ALL {
                let neighbour = self.neighbour(tile, direction);
                if let Some(neighbour) = neighbour.coord().filter(|at| self.is_road(*at)) {
                    self.feed.publish(ModelChange::TileChanged(neighbour));
                }
            }
        }
        self.feed.publish(ModelChange::StateChanged);
    }

    fn tick(&mut self, fixed_dt_seconds: f32) {
        self.tick_count = self.tick_count.saturating_add(1);
        self.move_workers(fixed_dt_seconds);
        if self.tick_count % POPULATION_INTERVAL_TICKS == 0 && self.update_population() {
            self.feed.publish(ModelChange::StateChanged);
        }
    }
}

fn terrain_from_hash(hash: u64) -> Terrain {
    match hash % 10 {
        0..=5 => Terrain::Grass,
        6 | 7 => Terrain::Dirt,
        8 => Terrain::Sand,
        _ => Terrain::Water,
    }
}

fn fnv1a(seed: u64, parts: &[u64]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for value in std::iter::once(seed).chain(parts.iter().copied()) {
        for byte in value.to_le_bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}
