//! Per-tick gameplay systems, in the order [`Game::update`] runs them.

use std::f32::consts::TAU;

use anyhow::Result;
use engine_component::{Commands, Entity};
use engine_level::{Color, TILE_SIZE};
use engine_math::{Rect, Vec2};
use engine_physics::{MoveHooks, Position, RigidBody};
use rand::Rng;
use tracing::info;

use crate::components::{
    Carrot, Enemy, Foreground, Particle, Plant, Player, Spawner, Sprite, Temporary, Turnip,
    Velocity,
};
use crate::game::{
    CARROT_COLOR, CARRY_OFFSET, Game, PLAYER_SIZE, TURNIP_COLOR, spawn_enemy, spawn_turnip,
};
use crate::services::{Audio, Clip, Input, Key};

/// Movement shorter than requested by more than this counts as blocked.
const BLOCK_TOLERANCE: f32 = 1e-3;

/// Bodies this far below the map are gone for good.
const FALL_MARGIN: f32 = 64.0;

impl Game {
    pub(crate) fn player_control(&mut self, input: &dyn Input, audio: &mut dyn Audio) -> Result<()> {
        let dt = self.dt;
        let position = self.world.get::<Position>(self.player)?.as_vec();
        let body = *self.world.get::<RigidBody>(self.player)?;
        let grounded = self.physics.is_grounded(&self.level, position, &body);

        let walk = match (input.is_down(Key::Left), input.is_down(Key::Right)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };

        let velocity = self.world.get_component::<Velocity>(self.player)?;
        velocity.x = walk * self.tuning.walk_speed;
        if grounded && input.was_pressed(Key::Jump) {
            velocity.y = self.tuning.jump_speed;
            audio.play(Clip::Jump, false);
        }

        let player = self.world.get_component::<Player>(self.player)?;
        if walk == 0.0 {
            player.walking_part = 0.0;
        } else {
            player.look_direction = walk;
            player.walking_part = (player.walking_part + dt * 4.0).fract();
        }
        player.hunger = (player.hunger + self.tuning.hunger_rate * dt).min(1.0);
        player.displayed_hunger += (player.hunger - player.displayed_hunger) * (dt * 4.0).min(1.0);
        let starving = player.hunger >= 1.0;
        let look = player.look_direction;
        let bob = (player.walking_part * TAU).sin().abs();
        let carried = player.turnip;

        self.world.get_component::<Sprite>(self.player)?.size = PLAYER_SIZE - Vec2::new(0.0, bob);

        if input.was_pressed(Key::Action) {
            match carried.filter(|&turnip| self.world.is_alive(turnip)) {
                Some(turnip) => self.throw_turnip(turnip, look, audio)?,
                None => {
                    let reach =
                        Rect::from_center_size(position, body.size + Vec2::splat(TILE_SIZE));
                    self.pull_turnip(reach, audio)?;
                }
            }
        }

        if starving && !self.starved {
            self.starved = true;
            info!(tick = self.tick(), score = self.score, "player starved");
        }
        Ok(())
    }

    fn throw_turnip(&mut self, turnip: Entity, look: f32, audio: &mut dyn Audio) -> Result<()> {
        let speed = self.tuning.throw_speed;
        self.world.get_component::<Turnip>(turnip)?.thrown = true;
        self.world
            .insert_component(turnip, Velocity::new(look * speed, speed * 0.5))?;
        self.world.remove_component::<Foreground>(turnip)?;
        self.world.get_component::<Player>(self.player)?.turnip = None;
        audio.play(Clip::Throw, false);
        Ok(())
    }

    /// Pull a turnip from the first ripe plant within reach.
    fn pull_turnip(&mut self, reach: Rect, audio: &mut dyn Audio) -> Result<()> {
        let ripe = self.world.iter::<(Position, Plant)>()?.find(|(position, plant)| {
            plant.is_ripe()
                && reach.overlaps(&Rect::from_center_size(
                    position.as_vec(),
                    Vec2::splat(TILE_SIZE),
                ))
        });
        let Some((_, plant)) = ripe else {
            return Ok(());
        };
        plant.growth = 0.0;

        let at = reach.center + CARRY_OFFSET;
        let turnip = spawn_turnip(&mut self.world, at)?;
        self.world.get_component::<Player>(self.player)?.turnip = Some(turnip);
        audio.play(Clip::Pull, false);
        Ok(())
    }

    pub(crate) fn grow_plants(&mut self) -> Result<()> {
        let dt = self.dt;
        for (plant, sprite) in self.world.iter::<(Plant, Sprite)>()? {
            plant.growth = (plant.growth + plant.rate * dt).min(1.0);
            sprite.size.y = 4.0 + 8.0 * plant.growth;
        }
        Ok(())
    }

    pub(crate) fn run_spawners(&mut self) -> Result<()> {
        let dt = self.dt;
        let interval = self.tuning.spawn_interval;
        let rng = &mut self.rng;
        let mut budget = self
            .tuning
            .max_enemies
            .saturating_sub(self.world.count::<Enemy>());

        self.world.iterate_handle::<(Position, Spawner)>(
            |_, (position, spawner): (&mut Position, &mut Spawner), commands: &mut Commands| {
                spawner.timer -= dt;
                if spawner.timer > 0.0 {
                    return;
                }
                spawner.timer = interval * rng.gen_range(0.75..1.25);
                if budget == 0 {
                    return;
                }
                budget -= 1;
                let at = position.as_vec();
                let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                commands.push(move |world| spawn_enemy(world, at, direction).map(|_| ()));
            },
        )?;
        Ok(())
    }

    pub(crate) fn enemy_ai(&mut self) -> Result<()> {
        let hop_chance = f64::from((self.tuning.hop_rate * self.dt).clamp(0.0, 1.0));
        for (position, body, velocity, enemy) in
            self.world.iter::<(Position, RigidBody, Velocity, Enemy)>()?
        {
            velocity.x = enemy.direction * self.tuning.enemy_speed;
            if self.physics.is_grounded(&self.level, position.as_vec(), body)
                && self.rng.gen_bool(hop_chance)
            {
                velocity.y = self.tuning.hop_speed;
            }
        }
        Ok(())
    }

    pub(crate) fn apply_gravity(&mut self) -> Result<()> {
        let pull = self.tuning.gravity * self.dt;
        self.world
            .iterate_comps::<(Velocity,)>(|(velocity,): (&mut Velocity,)| velocity.y -= pull)?;
        Ok(())
    }

    /// Move every body with a velocity and react to what it ran into.
    pub(crate) fn move_bodies(&mut self, audio: &mut dyn Audio) -> Result<()> {
        let movers: Vec<(Entity, Vec2, RigidBody, Vec2)> = self
            .world
            .query::<(Position, RigidBody, Velocity)>()?
            .map(|(entity, (position, body, velocity))| {
                (entity, position.as_vec(), *body, velocity.as_vec())
            })
            .collect();
        let floor = self.level.map_bounds().bottom() - FALL_MARGIN;
        let mut defeated: Vec<Entity> = Vec::new();

        for (entity, start, body, velocity) in movers {
            let is_player = entity == self.player;
            let thrown = self
                .world
                .get::<Turnip>(entity)
                .is_ok_and(|turnip| turnip.thrown);
            let delta = velocity * self.dt;

            let mut hit_level = false;
            let mut touched: Vec<Entity> = Vec::new();
            let mut hooks = MoveHooks::new().on_level(|| hit_level = true);
            if is_player || thrown {
                hooks = hooks.on_body(|other: &RigidBody, _remaining| {
                    if !touched.contains(&other.entity) {
                        touched.push(other.entity);
                    }
                });
            }
            let end = self
                .physics
                .move_body(&self.world, &self.level, start, &body, delta, hooks);
            self.world.get_component::<Position>(entity)?.set(end);

            let moved = end - start;
            let blocked_x = moved.x.abs() + BLOCK_TOLERANCE < delta.x.abs();
            let blocked_y = moved.y.abs() + BLOCK_TOLERANCE < delta.y.abs();
            let velocity = self.world.get_component::<Velocity>(entity)?;
            if blocked_x {
                velocity.x = 0.0;
            }
            if blocked_y {
                velocity.y = 0.0;
            }
            if blocked_x && let Ok(enemy) = self.world.get_component::<Enemy>(entity) {
                enemy.direction = -enemy.direction;
            }

            if thrown {
                let victim = touched.iter().copied().find(|&other| {
                    self.world.has_component::<Enemy>(other) && !defeated.contains(&other)
                });
                if let Some(enemy) = victim {
                    defeated.push(enemy);
                    self.pending.delete(enemy);
                    self.score += 1;
                    audio.play(Clip::Hit, false);
                    info!(%enemy, score = self.score, "enemy defeated");
                }
                if victim.is_some() || hit_level {
                    self.pending.delete(entity);
                    self.burst(end, TURNIP_COLOR);
                    audio.play(Clip::Break, false);
                    continue;
                }
            }

            if is_player {
                for &other in &touched {
                    if self.world.has_component::<Carrot>(other) {
                        self.eat(other, audio)?;
                    }
                }
            }

            if end.y < floor {
                if is_player {
                    self.respawn()?;
                } else {
                    self.pending.delete(entity);
                }
            }
        }
        Ok(())
    }

    fn eat(&mut self, carrot: Entity, audio: &mut dyn Audio) -> Result<()> {
        let at = self.world.get::<Position>(carrot)?.as_vec();
        let value = self.tuning.carrot_value;
        let player = self.world.get_component::<Player>(self.player)?;
        player.hunger = (player.hunger - value).max(0.0);
        // The carrot stops being edible right away; the entity goes at end of tick.
        self.world.remove_component::<Carrot>(carrot)?;
        self.pending.delete(carrot);
        self.burst(at, CARROT_COLOR);
        audio.play(Clip::Eat, false);
        Ok(())
    }

    fn respawn(&mut self) -> Result<()> {
        info!(tick = self.tick(), "player fell out of the level");
        self.world
            .get_component::<Position>(self.player)?
            .set(self.spawn_point);
        *self.world.get_component::<Velocity>(self.player)? = Velocity::default();
        Ok(())
    }

    /// Queue a puff of particles at `at`.
    fn burst(&mut self, at: Vec2, color: Color) {
        for _ in 0..self.tuning.particle_count {
            let angle = self.rng.gen_range(0.0..TAU);
            let speed: f32 = self.rng.gen_range(40.0..90.0);
            let velocity = Vec2::from_angle(angle) * speed + Vec2::new(0.0, 40.0);
            self.pending.spawn((
                Position::from(at),
                Velocity::new(velocity.x, velocity.y),
                Particle,
                Temporary {
                    lifetime: self.tuning.particle_lifetime,
                },
                Sprite::new(Vec2::splat(2.0), color),
                Foreground,
            ));
        }
    }

    pub(crate) fn move_particles(&mut self) -> Result<()> {
        let dt = self.dt;
        for (position, velocity, _) in self.world.iter::<(Position, Velocity, Particle)>()? {
            position.set(position.as_vec() + velocity.as_vec() * dt);
        }
        Ok(())
    }

    /// Keep the carried turnip above the player's head, and forget it if it
    /// is gone.
    pub(crate) fn carry_turnip(&mut self) -> Result<()> {
        let Some(turnip) = self.world.get::<Player>(self.player)?.turnip else {
            return Ok(());
        };
        if !self.world.is_alive(turnip) {
            self.world.get_component::<Player>(self.player)?.turnip = None;
            return Ok(());
        }
        let at = self.world.get::<Position>(self.player)?.as_vec() + CARRY_OFFSET;
        self.world.get_component::<Position>(turnip)?.set(at);
        Ok(())
    }

    pub(crate) fn expire_temporaries(&mut self) -> Result<()> {
        let dt = self.dt;
        self.world.iterate_handle::<(Temporary,)>(
            |entity, (temporary,): (&mut Temporary,), commands: &mut Commands| {
                temporary.lifetime -= dt;
                if temporary.lifetime <= 0.0 {
                    commands.delete(entity);
                }
            },
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SessionConfig, Tuning};
    use crate::game::spawn_turnip;
    use crate::services::{HeadlessRenderer, LogAudio, MemoryAssets, ScriptedInput};

    fn session(text: &str, tuning: Tuning) -> Game {
        let config = SessionConfig {
            seed: Some(7),
            tuning,
            ..SessionConfig::default()
        };
        Game::new(&config, text, &mut MemoryAssets::headless()).unwrap()
    }

    /// Tuning with no randomness in enemy behaviour.
    fn calm() -> Tuning {
        Tuning {
            hop_rate: 0.0,
            ..Tuning::default()
        }
    }

    fn run(game: &mut Game, input: &mut ScriptedInput, audio: &mut LogAudio, ticks: u64) {
        for _ in 0..ticks {
            input.set_tick(game.tick());
            game.update(input, audio).unwrap();
        }
    }

    fn position(game: &Game, entity: Entity) -> Vec2 {
        game.world().get::<Position>(entity).unwrap().as_vec()
    }

    #[test]
    fn test_idle_player_rests_on_floor() {
        let mut game = session(".P..\n####\n", calm());
        let start = position(&game, game.player());
        run(&mut game, &mut ScriptedInput::new(), &mut LogAudio::new(), 30);
        assert_eq!(position(&game, game.player()), start);
        assert_eq!(start.y, 16.0 + PLAYER_SIZE.y * 0.5);
    }

    #[test]
    fn test_walk_and_face() {
        let mut game = session(".P..........\n############\n", calm());
        let mut input = ScriptedInput::new()
            .hold(Key::Right, 0..30)
            .hold(Key::Left, 30..35);
        let mut audio = LogAudio::new();

        run(&mut game, &mut input, &mut audio, 30);
        let walked = position(&game, game.player());
        assert!((walked.x - 54.0).abs() < 0.1, "{walked}");
        let player = game.world().get::<Player>(game.player()).unwrap();
        assert_eq!(player.look_direction, 1.0);

        run(&mut game, &mut input, &mut audio, 5);
        let player = game.world().get::<Player>(game.player()).unwrap();
        assert_eq!(player.look_direction, -1.0);
        assert!(position(&game, game.player()).x < walked.x);
    }

    #[test]
    fn test_jump_only_from_ground() {
        let mut game = session(".P..\n####\n", calm());
        let rest = position(&game, game.player()).y;
        let mut input = ScriptedInput::new()
            .hold(Key::Jump, 5..8)
            .hold(Key::Jump, 12..14);
        let mut audio = LogAudio::new();

        run(&mut game, &mut input, &mut audio, 16);
        assert!(position(&game, game.player()).y > rest + 10.0);
        assert_eq!(audio.count(Clip::Jump), 1);

        // Lands again.
        run(&mut game, &mut input, &mut audio, 120);
        assert_eq!(position(&game, game.player()).y, rest);
    }

    #[test]
    fn test_starvation_ends_session() {
        let mut game = session(
            ".P..\n####\n",
            Tuning {
                hunger_rate: 30.0,
                ..calm()
            },
        );
        run(&mut game, &mut ScriptedInput::new(), &mut LogAudio::new(), 5);
        assert!(game.is_over());
        assert_eq!(game.tick(), 2);
        let player = game.world().get::<Player>(game.player()).unwrap();
        assert_eq!(player.hunger, 1.0);
    }

    #[test]
    fn test_pull_carry_and_throw_turnip() {
        let mut game = session(
            ".PT.........\n############\n",
            Tuning {
                plant_growth_time: 0.05,
                ..calm()
            },
        );
        let mut input = ScriptedInput::new()
            .hold(Key::Action, 10..11)
            .hold(Key::Action, 20..21);
        let mut audio = LogAudio::new();

        run(&mut game, &mut input, &mut audio, 11);
        assert_eq!(audio.count(Clip::Pull), 1);
        let turnip = game
            .world()
            .get::<Player>(game.player())
            .unwrap()
            .turnip
            .unwrap();
        assert_eq!(
            position(&game, turnip),
            position(&game, game.player()) + CARRY_OFFSET
        );
        assert!(game.world().has_component::<Foreground>(turnip));

        run(&mut game, &mut input, &mut audio, 10);
        assert_eq!(audio.count(Clip::Throw), 1);
        assert_eq!(game.world().get::<Player>(game.player()).unwrap().turnip, None);
        assert!(game.world().get::<Turnip>(turnip).unwrap().thrown);
        assert!(game.world().has_component::<Velocity>(turnip));

        // It lands, breaks, and its particles fade.
        run(&mut game, &mut input, &mut audio, 120);
        assert!(!game.world().is_alive(turnip));
        assert_eq!(audio.count(Clip::Break), 1);
        assert_eq!(game.world().count::<Particle>(), 0);
        assert_eq!(game.world().count::<Temporary>(), 0);
    }

    #[test]
    fn test_thrown_turnip_defeats_enemy() {
        let mut game = session(
            ".P.....E....\n############\n",
            Tuning {
                gravity: 0.0,
                enemy_speed: 0.0,
                ..calm()
            },
        );
        let turnip = spawn_turnip(&mut game.world, Vec2::new(60.0, 23.0)).unwrap();
        game.world.get_component::<Turnip>(turnip).unwrap().thrown = true;
        game.world
            .insert_component(turnip, Velocity::new(160.0, 0.0))
            .unwrap();
        let mut audio = LogAudio::new();

        run(&mut game, &mut ScriptedInput::new(), &mut audio, 30);
        assert_eq!(game.world().count::<Enemy>(), 0);
        assert!(!game.world().is_alive(turnip));
        assert_eq!(game.score(), 1);
        assert_eq!(audio.count(Clip::Hit), 1);
        assert_eq!(audio.count(Clip::Break), 1);
    }

    #[test]
    fn test_player_eats_carrot() {
        let mut game = session(".PC.....\n########\n", calm());
        game.world
            .get_component::<Player>(game.player)
            .unwrap()
            .hunger = 0.6;
        let mut input = ScriptedInput::new().hold(Key::Right, 0..20);
        let mut audio = LogAudio::new();

        run(&mut game, &mut input, &mut audio, 20);
        assert_eq!(game.world().count::<Carrot>(), 0);
        assert_eq!(audio.count(Clip::Eat), 1);
        let hunger = game.world().get::<Player>(game.player()).unwrap().hunger;
        assert!((hunger - 0.1).abs() < 0.02, "{hunger}");
    }

    #[test]
    fn test_enemy_turns_at_wall() {
        let mut game = session("#E..P.#\n#######\n", calm());
        let enemy = game.world().components::<Enemy>().next().unwrap().0;
        assert_eq!(game.world().get::<Enemy>(enemy).unwrap().direction, -1.0);
        run(&mut game, &mut ScriptedInput::new(), &mut LogAudio::new(), 30);
        assert_eq!(game.world().get::<Enemy>(enemy).unwrap().direction, 1.0);
        let body = game.world().get::<RigidBody>(enemy).unwrap();
        assert!(body.rect_at(position(&game, enemy)).left() >= 16.0);
    }

    #[test]
    fn test_spawner_respects_enemy_cap() {
        let mut game = session(
            "S......\n.P.....\n#######\n",
            Tuning {
                spawn_interval: 0.1,
                max_enemies: 2,
                enemy_speed: 0.0,
                ..calm()
            },
        );
        run(&mut game, &mut ScriptedInput::new(), &mut LogAudio::new(), 60);
        assert_eq!(game.world().count::<Enemy>(), 2);
        run(&mut game, &mut ScriptedInput::new(), &mut LogAudio::new(), 60);
        assert_eq!(game.world().count::<Enemy>(), 2);
        // Spawned enemies carry a body pointing back at themselves.
        for (entity, body) in game.world().components::<RigidBody>() {
            assert_eq!(body.entity, entity);
        }
    }

    #[test]
    fn test_fall_out_respawns_player() {
        let mut game = session(".P.\n...\n", calm());
        let start = position(&game, game.player());
        let mut input = ScriptedInput::new();
        let mut audio = LogAudio::new();
        let mut respawned = false;
        let mut last = start.y;
        for _ in 0..60 {
            run(&mut game, &mut input, &mut audio, 1);
            let y = position(&game, game.player()).y;
            respawned |= y > last + 50.0;
            last = y;
        }
        assert!(respawned);
    }

    #[test]
    fn test_same_seed_same_session() {
        let play = || {
            let mut game = session(crate::game::MEADOW, Tuning::default());
            let mut input = ScriptedInput::demo();
            let mut audio = LogAudio::new();
            let mut renderer = HeadlessRenderer::default();
            for _ in 0..600 {
                input.set_tick(game.tick());
                game.update(&input, &mut audio).unwrap();
                game.draw(&mut renderer).unwrap();
            }
            (
                position(&game, game.player()),
                game.world().entity_count(),
                game.score(),
            )
        };
        assert_eq!(play(), play());
    }
}
