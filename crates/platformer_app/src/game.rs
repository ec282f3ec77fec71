//! One play session: the world, the level and the per-tick flow.
//!
//! ## Tick order
//!
//! 1. Player control (walk, jump, pull or throw a turnip, hunger).
//! 2. Plant growth.
//! 3. Enemy spawners.
//! 4. Enemy AI.
//! 5. Gravity, then movement of every body through [`Physics::move_body`].
//! 6. Particles and the carried turnip follow along.
//! 7. Temporary entities expire.
//! 8. Deletions queued during the tick are applied.

use std::path::Path;

use anyhow::{Context, Result, bail};
use engine_component::{Commands, Entity, World, WorldError};
use engine_level::{AssetLoader, Color, Level, Renderer, SpawnCallbacks};
use engine_math::{IVec2, Rect, Vec2};
use engine_physics::{Physics, Position, RigidBody};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::components::{
    Background, Carrot, Enemy, Foreground, Plant, Player, Spawner, Sprite, Turnip, Velocity,
};
use crate::config::{SessionConfig, Tuning};
use crate::services::{Audio, Input};

/// The built-in level.
pub const MEADOW: &str = include_str!("../levels/meadow.txt");

pub const PLAYER_SIZE: Vec2 = Vec2::new(10.0, 14.0);
pub const ENEMY_SIZE: Vec2 = Vec2::new(12.0, 12.0);
pub const TURNIP_SIZE: Vec2 = Vec2::new(8.0, 8.0);
pub const CARROT_SIZE: Vec2 = Vec2::new(6.0, 10.0);

/// Where a carried turnip sits relative to the player's center.
pub const CARRY_OFFSET: Vec2 = Vec2::new(0.0, 12.0);

const SKY: Color = Color::rgb(92, 148, 252);
const PLAYER_COLOR: Color = Color::rgb(240, 240, 240);
const ENEMY_COLOR: Color = Color::rgb(200, 40, 60);
pub(crate) const TURNIP_COLOR: Color = Color::rgb(230, 200, 230);
pub(crate) const CARROT_COLOR: Color = Color::rgb(250, 140, 20);
const PLANT_COLOR: Color = Color::rgb(60, 180, 60);
const HUNGER_BACK: Color = Color::rgb(40, 40, 40);
const HUNGER_FILL: Color = Color::rgb(220, 180, 40);

/// What a level marker places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Player,
    Enemy,
    Plant,
    Carrot,
    Spawner,
}

const MARKERS: [(char, Placement); 5] = [
    ('P', Placement::Player),
    ('E', Placement::Enemy),
    ('T', Placement::Plant),
    ('C', Placement::Carrot),
    ('S', Placement::Spawner),
];

/// Records every marker found while parsing.
fn marker_callbacks<'a>() -> SpawnCallbacks<'a, Vec<(Placement, IVec2)>> {
    let mut spawns = SpawnCallbacks::new();
    for (marker, placement) in MARKERS {
        spawns = spawns.on(marker, move |found: &mut Vec<(Placement, IVec2)>, cell| {
            found.push((placement, cell));
        });
    }
    spawns
}

/// A running session.
pub struct Game {
    pub(crate) world: World,
    pub(crate) level: Level,
    pub(crate) physics: Physics,
    pub(crate) rng: StdRng,
    pub(crate) tuning: Tuning,
    /// Seconds per tick.
    pub(crate) dt: f32,
    pub(crate) player: Entity,
    pub(crate) spawn_point: Vec2,
    /// Structural changes collected during the tick.
    pub(crate) pending: Commands,
    pub(crate) score: u32,
    pub(crate) starved: bool,
    tick: u64,
}

impl Game {
    /// Build a session from map text, loading the tileset through `assets`.
    pub fn new(config: &SessionConfig, text: &str, assets: &mut dyn AssetLoader) -> Result<Self> {
        let mut placements = Vec::new();
        let level = Level::new(text, assets, &mut placements, &mut marker_callbacks())
            .context("building level")?;
        Self::with_level(config, level, &placements)
    }

    /// Build a session from the map file at `path`.
    pub fn load(config: &SessionConfig, path: &Path, assets: &mut dyn AssetLoader) -> Result<Self> {
        let mut placements = Vec::new();
        let level = Level::load(path, assets, &mut placements, &mut marker_callbacks())
            .with_context(|| format!("loading level {}", path.display()))?;
        Self::with_level(config, level, &placements)
    }

    fn with_level(
        config: &SessionConfig,
        level: Level,
        placements: &[(Placement, IVec2)],
    ) -> Result<Self> {
        let mut game = Self {
            world: World::new(),
            level,
            physics: Physics::new(config.physics.clone()),
            rng: StdRng::seed_from_u64(config.seed()),
            tuning: config.tuning.clone(),
            dt: config.timestep,
            player: Entity::INVALID,
            spawn_point: Vec2::ZERO,
            pending: Commands::new(),
            score: 0,
            starved: false,
            tick: 0,
        };
        game.populate(placements)?;
        Ok(game)
    }

    fn populate(&mut self, placements: &[(Placement, IVec2)]) -> Result<()> {
        let bounds = self.level.map_bounds();
        self.world
            .spawn((Position::from(bounds.center), Background, Sprite::new(bounds.size, SKY)))?;

        for &(placement, cell) in placements {
            match placement {
                Placement::Player => {
                    if self.player != Entity::INVALID {
                        bail!("level has more than one player start");
                    }
                    self.spawn_point = standing_in(cell, PLAYER_SIZE);
                    self.player = spawn_player(&mut self.world, self.spawn_point)?;
                }
                Placement::Enemy => {
                    spawn_enemy(&mut self.world, standing_in(cell, ENEMY_SIZE), -1.0)?;
                }
                Placement::Plant => {
                    let jitter: f32 = self.rng.gen_range(0.8..1.2);
                    let rate = jitter / self.tuning.plant_growth_time.max(f32::EPSILON);
                    self.world.spawn((
                        Position::from(Level::cell_rect(cell).center),
                        Plant { growth: 0.0, rate },
                        Sprite::new(Vec2::new(10.0, 4.0), PLANT_COLOR),
                    ))?;
                }
                Placement::Carrot => {
                    let at = standing_in(cell, CARROT_SIZE);
                    let carrot = self.world.spawn((
                        Position::from(at),
                        Carrot,
                        Sprite::new(CARROT_SIZE, CARROT_COLOR),
                    ))?;
                    self.world
                        .insert_component(carrot, RigidBody::new(carrot, CARROT_SIZE))?;
                }
                Placement::Spawner => {
                    let timer = self.tuning.spawn_interval * self.rng.gen_range(0.5..1.0);
                    self.world.spawn((
                        Position::from(Level::cell_rect(cell).center),
                        Spawner { timer },
                    ))?;
                }
            }
        }

        if self.player == Entity::INVALID {
            bail!("level has no player start 'P'");
        }
        info!(
            width = self.level.width(),
            height = self.level.height(),
            entities = self.world.entity_count(),
            "session ready"
        );
        Ok(())
    }

    /// Advance the session by one tick. Does nothing once the player starved.
    pub fn update(&mut self, input: &dyn Input, audio: &mut dyn Audio) -> Result<()> {
        if self.starved {
            return Ok(());
        }
        self.tick += 1;

        self.player_control(input, audio)?;
        self.grow_plants()?;
        self.run_spawners()?;
        self.enemy_ai()?;
        self.apply_gravity()?;
        self.move_bodies(audio)?;
        self.move_particles()?;
        self.carry_turnip()?;
        self.expire_temporaries()?;

        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            debug!(tick = self.tick, commands = pending.len(), "end of tick");
        }
        self.world.apply(pending)?;
        Ok(())
    }

    /// Draw the frame: background, tiles, entities, foreground, hunger bar.
    pub fn draw(&self, renderer: &mut dyn Renderer) -> Result<()> {
        renderer.clear(Color::BLACK);

        let focus = self.world.get::<Position>(self.player)?.as_vec();
        let view = renderer.viewport();
        let camera = self.level.map_bounds().clamp_inside(focus, view);
        renderer.set_camera(camera);

        self.draw_sprites(renderer, |world, entity| world.has_component::<Background>(entity));
        self.level.draw(renderer);
        self.draw_sprites(renderer, |world, entity| {
            !world.has_component::<Background>(entity) && !world.has_component::<Foreground>(entity)
        });
        self.draw_sprites(renderer, |world, entity| world.has_component::<Foreground>(entity));

        let hunger = self.world.get::<Player>(self.player)?.displayed_hunger;
        let corner = camera + Vec2::new(-view.x, view.y) * 0.5;
        let bar = Rect::new(corner.x + 28.0, corner.y - 6.0, 48.0, 4.0);
        renderer.draw_rect(bar, HUNGER_BACK);
        let fill = bar.size.x * (1.0 - hunger.clamp(0.0, 1.0));
        renderer.draw_rect(
            Rect::new(bar.left() + fill * 0.5, bar.center.y, fill, bar.size.y),
            HUNGER_FILL,
        );
        Ok(())
    }

    fn draw_sprites(&self, renderer: &mut dyn Renderer, layer: impl Fn(&World, Entity) -> bool) {
        for (entity, sprite) in self.world.components::<Sprite>() {
            if !layer(&self.world, entity) {
                continue;
            }
            if let Ok(position) = self.world.get::<Position>(entity) {
                renderer.draw_rect(
                    Rect::from_center_size(position.as_vec(), sprite.size),
                    sprite.color,
                );
            }
        }
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[must_use]
    pub fn level(&self) -> &Level {
        &self.level
    }

    #[must_use]
    pub fn player(&self) -> Entity {
        self.player
    }

    /// Ticks simulated so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Enemies defeated.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// The player has starved.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.starved
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("tick", &self.tick)
            .field("player", &self.player)
            .field("score", &self.score)
            .field("entities", &self.world.entity_count())
            .finish_non_exhaustive()
    }
}

/// Center of a body of `size` resting on the floor of `cell`.
pub(crate) fn standing_in(cell: IVec2, size: Vec2) -> Vec2 {
    let tile = Level::cell_rect(cell);
    Vec2::new(tile.center.x, tile.bottom() + size.y * 0.5)
}

pub(crate) fn spawn_player(world: &mut World, at: Vec2) -> Result<Entity, WorldError> {
    let player = world.spawn((
        Position::from(at),
        Velocity::default(),
        Player::default(),
        Sprite::new(PLAYER_SIZE, PLAYER_COLOR),
    ))?;
    world.insert_component(player, RigidBody::new(player, PLAYER_SIZE))?;
    Ok(player)
}

pub(crate) fn spawn_enemy(world: &mut World, at: Vec2, direction: f32) -> Result<Entity, WorldError> {
    let enemy = world.spawn((
        Position::from(at),
        Velocity::default(),
        Enemy { direction },
        Sprite::new(ENEMY_SIZE, ENEMY_COLOR),
    ))?;
    world.insert_component(enemy, RigidBody::new(enemy, ENEMY_SIZE))?;
    Ok(enemy)
}

/// A turnip held by the player. It has no [`Velocity`] until thrown.
pub(crate) fn spawn_turnip(world: &mut World, at: Vec2) -> Result<Entity, WorldError> {
    let turnip = world.spawn((
        Position::from(at),
        Turnip { thrown: false },
        Sprite::new(TURNIP_SIZE, TURNIP_COLOR),
        Foreground,
    ))?;
    world.insert_component(turnip, RigidBody::new(turnip, TURNIP_SIZE))?;
    Ok(turnip)
}
