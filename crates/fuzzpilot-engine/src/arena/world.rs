use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64Mcg;

use crate::{
    arena::ArenaSettings,
    geometry::{MapSize, Vec2},
    scenario::{AsteroidField, Scenario, ShipSpawn},
    score::TeamScore,
    simulator::SimulationError,
    snapshot::{Action, AsteroidState, GameSnapshot, ShipState},
};

const MAX_ASTEROID_SIZE: u8 = 4;

#[derive(Debug, Clone)]
struct Ship {
    position: Vec2,
    heading: f64,
    speed: f64,
    lives: u32,
    fire_cooldown: f64,
    respawn_timer: f64,
}

#[derive(Debug, Clone)]
struct Asteroid {
    position: Vec2,
    velocity: Vec2,
    size: u8,
}

#[derive(Debug, Clone)]
struct Bullet {
    position: Vec2,
    velocity: Vec2,
    age: f64,
}

/// Mutable state of one arena run.
#[derive(Debug, Clone)]
pub(super) struct World<'a> {
    settings: &'a ArenaSettings,
    map: MapSize,
    spawn: ShipSpawn,
    ship: Ship,
    asteroids: Vec<Asteroid>,
    bullets: Vec<Bullet>,
    ammo: Option<u32>,
    score: TeamScore,
    frame: u64,
}

fn invalid(scenario: &Scenario, reason: impl Into<String>) -> SimulationError {
    SimulationError::InvalidScenario {
        name: scenario.name.clone(),
        reason: reason.into(),
    }
}

/// Hits needed to clear an asteroid of `size`, children included.
fn hits_to_clear(size: u8) -> u32 {
    (1 << size) - 1
}

fn random_field(
    settings: &ArenaSettings,
    map: MapSize,
    ship: Vec2,
    count: usize,
    seed: u64,
) -> Vec<Asteroid> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let (min_speed, max_speed) = settings.random_speed_range;
    (0..count)
        .map(|_| {
            let mut position = ship;
            for _ in 0..100 {
                position = Vec2::new(
                    rng.random_range(0.0..map.width),
                    rng.random_range(0.0..map.height),
                );
                if map.shortest_delta(ship, position).length() >= settings.spawn_clearance {
                    break;
                }
            }
            let angle = rng.random_range(0.0..360.0);
            let speed = rng.random_range(min_speed..=max_speed);
            Asteroid {
                position,
                velocity: Vec2::from_polar(angle, speed),
                size: rng.random_range(2..=MAX_ASTEROID_SIZE),
            }
        })
        .collect()
}

impl<'a> World<'a> {
    pub(super) fn new(
        settings: &'a ArenaSettings,
        scenario: &Scenario,
    ) -> Result<Self, SimulationError> {
        let map = scenario.map_size;
        if !(map.width.is_finite() && map.height.is_finite() && map.width > 0.0 && map.height > 0.0)
        {
            return Err(invalid(scenario, "map size must be positive"));
        }
        if !(scenario.time_limit.is_finite() && scenario.time_limit > 0.0) {
            return Err(invalid(scenario, "time limit must be positive and finite"));
        }
        if scenario.ship.lives == 0 {
            return Err(invalid(scenario, "ship needs at least one life"));
        }

        let spawn = ShipSpawn {
            position: map.wrap(scenario.ship.position),
            ..scenario.ship.clone()
        };
        let asteroids = match &scenario.asteroids {
            AsteroidField::Random { count, seed } => {
                random_field(settings, map, spawn.position, *count, *seed)
            }
            AsteroidField::Fixed(spawns) => spawns
                .iter()
                .map(|spawn| {
                    if !(1..=MAX_ASTEROID_SIZE).contains(&spawn.size) {
                        let reason = format!("asteroid size {} out of range", spawn.size);
                        return Err(invalid(scenario, reason));
                    }
                    Ok(Asteroid {
                        position: map.wrap(spawn.position),
                        velocity: Vec2::from_polar(spawn.angle, spawn.speed),
                        size: spawn.size,
                    })
                })
                .collect::<Result<_, _>>()?,
        };

        let ammo = (scenario.ammo_limit_multiplier > 0.0).then(|| {
            let needed: u32 = asteroids.iter().map(|a| hits_to_clear(a.size)).sum();
            #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let limit = (f64::from(needed) * scenario.ammo_limit_multiplier).ceil() as u32;
            limit.max(1)
        });

        Ok(Self {
            settings,
            map,
            ship: Ship {
                position: spawn.position,
                heading: spawn.heading.rem_euclid(360.0),
                speed: 0.0,
                lives: spawn.lives,
                fire_cooldown: 0.0,
                respawn_timer: 0.0,
            },
            spawn,
            asteroids,
            bullets: vec![],
            ammo,
            score: TeamScore {
                lives_remaining: scenario.ship.lives,
                ..TeamScore::default()
            },
            frame: 0,
        })
    }

    pub(super) fn frame(&self) -> u64 {
        self.frame
    }

    pub(super) fn has_asteroids(&self) -> bool {
        !self.asteroids.is_empty()
    }

    pub(super) fn has_lives(&self) -> bool {
        self.ship.lives > 0
    }

    /// No ammo left and nothing in flight that could still score.
    pub(super) fn is_out_of_ammo(&self) -> bool {
        self.ammo == Some(0) && self.bullets.is_empty()
    }

    pub(super) fn score(&self) -> &TeamScore {
        &self.score
    }

    pub(super) fn snapshot(&self, delta_time: f64) -> GameSnapshot {
        let ship = &self.ship;
        #[expect(clippy::cast_precision_loss)]
        let time = self.frame as f64 * delta_time;
        GameSnapshot {
            ship: ShipState {
                position: ship.position,
                velocity: Vec2::from_polar(ship.heading, ship.speed),
                heading: ship.heading,
                speed: ship.speed,
                radius: self.settings.ship_radius,
                lives: ship.lives,
                can_fire: ship.fire_cooldown <= 0.0 && self.ammo != Some(0),
                is_respawning: ship.respawn_timer > 0.0,
                thrust_range: self.settings.thrust_range,
                turn_rate_range: self.settings.turn_rate_range,
            },
            asteroids: self
                .asteroids
                .iter()
                .map(|a| AsteroidState {
                    position: a.position,
                    velocity: a.velocity,
                    size: a.size,
                    radius: self.settings.asteroid_radius(a.size),
                })
                .collect(),
            map_size: self.map,
            time,
            delta_time,
            frame: self.frame,
        }
    }

    /// Advances the world by one tick.
    pub(super) fn step(&mut self, action: &Action, dt: f64) {
        if self.ship.lives > 0 {
            self.control_ship(action, dt);
        }

        for asteroid in &mut self.asteroids {
            asteroid.position = self.map.wrap(asteroid.position + asteroid.velocity * dt);
        }
        let lifetime = self.settings.bullet_lifetime;
        for bullet in &mut self.bullets {
            bullet.position = self.map.wrap(bullet.position + bullet.velocity * dt);
            bullet.age += dt;
        }
        self.bullets.retain(|b| b.age < lifetime);

        self.resolve_bullet_hits();
        if self.ship.lives > 0 && self.ship.respawn_timer <= 0.0 {
            self.resolve_ship_collision();
        }
        self.frame += 1;
    }

    fn control_ship(&mut self, action: &Action, dt: f64) {
        let settings = self.settings;
        let thrust = clamp_command(action.thrust, settings.thrust_range);
        let turn_rate = clamp_command(action.turn_rate, settings.turn_rate_range);
        let ship = &mut self.ship;

        ship.heading = (ship.heading + turn_rate * dt).rem_euclid(360.0);
        let drag = settings.drag * dt;
        ship.speed = if ship.speed > 0.0 {
            (ship.speed - drag).max(0.0)
        } else {
            (ship.speed + drag).min(0.0)
        };
        ship.speed = (ship.speed + thrust * dt).clamp(-settings.max_speed, settings.max_speed);
        ship.position = self
            .map
            .wrap(ship.position + Vec2::from_polar(ship.heading, ship.speed * dt));
        ship.fire_cooldown = (ship.fire_cooldown - dt).max(0.0);
        ship.respawn_timer = (ship.respawn_timer - dt).max(0.0);

        if action.fire && ship.fire_cooldown <= 0.0 && self.ammo != Some(0) {
            let nose = ship.position + Vec2::from_polar(ship.heading, settings.ship_radius);
            self.bullets.push(Bullet {
                position: self.map.wrap(nose),
                velocity: Vec2::from_polar(ship.heading, settings.bullet_speed),
                age: 0.0,
            });
            ship.fire_cooldown = settings.fire_cooldown;
            // Firing gives up the rest of the invulnerability window.
            ship.respawn_timer = 0.0;
            if let Some(ammo) = &mut self.ammo {
                *ammo -= 1;
            }
            self.score.shots_fired += 1;
        }
    }

    fn resolve_bullet_hits(&mut self) {
        let mut i = 0;
        while i < self.bullets.len() {
            let bullet = self.bullets[i].position;
            let hit = self.asteroids.iter().position(|a| {
                self.map.shortest_delta(bullet, a.position).length()
                    < self.settings.asteroid_radius(a.size)
            });
            if let Some(index) = hit {
                self.bullets.swap_remove(i);
                self.destroy_asteroid(index);
                self.score.bullets_hit += 1;
            } else {
                i += 1;
            }
        }
    }

    fn resolve_ship_collision(&mut self) {
        let ship = self.ship.position;
        let hit = self.asteroids.iter().position(|a| {
            self.map.shortest_delta(ship, a.position).length()
                < self.settings.asteroid_radius(a.size) + self.settings.ship_radius
        });
        let Some(index) = hit else {
            return;
        };
        self.destroy_asteroid(index);
        self.score.deaths += 1;
        self.ship.lives -= 1;
        self.score.lives_remaining = self.ship.lives;
        log::trace!("ship destroyed at frame {}, {} lives left", self.frame, self.ship.lives);
        if self.ship.lives > 0 {
            self.ship = Ship {
                position: self.spawn.position,
                heading: self.spawn.heading.rem_euclid(360.0),
                speed: 0.0,
                lives: self.ship.lives,
                fire_cooldown: 0.0,
                respawn_timer: self.settings.respawn_time,
            };
        }
    }

    /// Removes an asteroid, splitting it into two smaller ones if it is larger than 1.
    fn destroy_asteroid(&mut self, index: usize) {
        let asteroid = self.asteroids.remove(index);
        self.score.asteroids_hit += 1;
        if asteroid.size > 1 {
            for sign in [1.0, -1.0] {
                self.asteroids.push(Asteroid {
                    position: asteroid.position,
                    velocity: asteroid
                        .velocity
                        .rotated(sign * self.settings.split_angle)
                        * self.settings.split_speed_factor,
                    size: asteroid.size - 1,
                });
            }
        }
    }
}

fn clamp_command(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        0.0
    }
}
