//! Named initial conditions for a run.
//!
//! A [`Scenario`] is an immutable value handed to the simulator at call time. The
//! [`ScenarioRegistry`] maps names to scenarios; it starts from the built-in set and can
//! be extended from JSON.

use std::{borrow::Cow, collections::BTreeMap};

use serde::{Deserialize, Serialize};

use crate::geometry::{MapSize, Vec2};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ScenarioError {
    #[display("unknown scenario: {name}")]
    Unknown { name: String },
    #[display("invalid scenario file")]
    Parse(serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipSpawn {
    pub position: Vec2,
    pub heading: f64,
    pub lives: u32,
}

impl Default for ShipSpawn {
    fn default() -> Self {
        Self {
            position: Vec2::new(500.0, 400.0),
            heading: 90.0,
            lives: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidSpawn {
    pub position: Vec2,
    /// Direction of travel in degrees.
    pub angle: f64,
    pub speed: f64,
    pub size: u8,
}

impl Default for AsteroidSpawn {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            angle: 0.0,
            speed: 60.0,
            size: 4,
        }
    }
}

/// Initial asteroid layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsteroidField {
    /// `count` asteroids generated from `seed`.
    Random { count: usize, seed: u64 },
    Fixed(Vec<AsteroidSpawn>),
}

impl Default for AsteroidField {
    fn default() -> Self {
        Self::Random { count: 20, seed: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub map_size: MapSize,
    /// Seconds of simulated time before the run stops.
    pub time_limit: f64,
    pub ship: ShipSpawn,
    pub asteroids: AsteroidField,
    /// Bullets available per asteroid hit needed to clear the field. `0` is unlimited.
    pub ammo_limit_multiplier: f64,
    pub stop_if_no_ammo: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: String::new(),
            map_size: MapSize::default(),
            time_limit: 60.0,
            ship: ShipSpawn::default(),
            asteroids: AsteroidField::default(),
            ammo_limit_multiplier: 0.0,
            stop_if_no_ammo: false,
        }
    }
}

impl Scenario {
    /// The `run`-th repetition of this scenario.
    ///
    /// Random fields are regenerated from `seed + run`; fixed fields play out the same way
    /// every time.
    ///
    /// ```
    /// # use fuzzpilot_engine::{AsteroidField, ScenarioRegistry};
    /// let registry = ScenarioRegistry::builtin();
    /// let scenario = registry.get("random_repeatable").unwrap();
    /// assert_eq!(
    ///     scenario.repetition(2).asteroids,
    ///     AsteroidField::Random { count: 20, seed: 3 }
    /// );
    /// ```
    #[must_use]
    pub fn repetition(&self, run: u64) -> Cow<'_, Self> {
        match self.asteroids {
            AsteroidField::Random { count, seed } if run > 0 => Cow::Owned(Self {
                asteroids: AsteroidField::Random {
                    count,
                    seed: seed.wrapping_add(run),
                },
                ..self.clone()
            }),
            _ => Cow::Borrowed(self),
        }
    }
}

fn fixed(spawns: &[(f64, f64, f64, f64)]) -> AsteroidField {
    AsteroidField::Fixed(
        spawns
            .iter()
            .map(|&(x, y, angle, speed)| AsteroidSpawn {
                position: Vec2::new(x, y),
                angle,
                speed,
                size: 4,
            })
            .collect(),
    )
}

fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "random_repeatable".into(),
            ship: ShipSpawn {
                position: Vec2::new(400.0, 400.0),
                ..ShipSpawn::default()
            },
            asteroids: AsteroidField::Random { count: 20, seed: 1 },
            ..Scenario::default()
        },
        Scenario {
            name: "battle_arena".into(),
            map_size: MapSize::new(1200.0, 900.0),
            time_limit: 90.0,
            ship: ShipSpawn {
                position: Vec2::new(200.0, 200.0),
                heading: 45.0,
                lives: 5,
            },
            asteroids: AsteroidField::Random {
                count: 15,
                seed: 2,
            },
            ammo_limit_multiplier: 0.5,
            stop_if_no_ammo: true,
        },
        Scenario {
            name: "one_asteroid".into(),
            map_size: MapSize::new(1200.0, 900.0),
            time_limit: 90.0,
            ship: ShipSpawn {
                position: Vec2::new(500.0, 700.0),
                heading: 270.0,
                lives: 5,
            },
            asteroids: fixed(&[(200.0, 200.0, 0.0, 150.0)]),
            ..Scenario::default()
        },
        Scenario {
            name: "asteroid_wall".into(),
            ship: ShipSpawn {
                position: Vec2::new(500.0, 600.0),
                ..ShipSpawn::default()
            },
            asteroids: fixed(&[
                (100.0, 200.0, 60.0, 40.0),
                (200.0, 200.0, 65.0, 40.0),
                (300.0, 200.0, 70.0, 40.0),
                (400.0, 200.0, 75.0, 40.0),
                (500.0, 200.0, 80.0, 40.0),
                (600.0, 200.0, 90.0, 40.0),
                (700.0, 200.0, 100.0, 40.0),
                (800.0, 200.0, 110.0, 40.0),
                (900.0, 200.0, 120.0, 40.0),
            ]),
            ..Scenario::default()
        },
        Scenario {
            name: "cross".into(),
            ship: ShipSpawn {
                position: Vec2::new(400.0, 400.0),
                ..ShipSpawn::default()
            },
            asteroids: fixed(&[
                (400.0, 700.0, 271.0, 40.0),
                (400.0, 100.0, 91.0, 40.0),
                (800.0, 400.0, 181.0, 40.0),
                (100.0, 400.0, 1.0, 40.0),
            ]),
            ..Scenario::default()
        },
        Scenario {
            name: "tracking_test".into(),
            ship: ShipSpawn {
                position: Vec2::new(500.0, 600.0),
                ..ShipSpawn::default()
            },
            asteroids: fixed(&[(100.0, 200.0, 0.0, 100.0)]),
            ..Scenario::default()
        },
        Scenario {
            name: "diversion".into(),
            ship: ShipSpawn {
                position: Vec2::new(500.0, 500.0),
                ..ShipSpawn::default()
            },
            asteroids: fixed(&[
                (200.0, 200.0, 110.0, 40.0),
                (300.0, 200.0, 110.0, 40.0),
                (500.0, 100.0, 90.0, 40.0),
                (700.0, 200.0, 70.0, 40.0),
                (800.0, 200.0, 70.0, 40.0),
            ]),
            ..Scenario::default()
        },
    ]
}

/// Name-indexed scenarios.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRegistry {
    scenarios: BTreeMap<String, Scenario>,
}

impl ScenarioRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in scenarios.
    ///
    /// ```
    /// # use fuzzpilot_engine::ScenarioRegistry;
    /// let registry = ScenarioRegistry::builtin();
    /// assert!(registry.get("random_repeatable").is_ok());
    /// assert!(registry.get("missing").is_err());
    /// ```
    #[must_use]
    pub fn builtin() -> Self {
        let mut this = Self::empty();
        for scenario in builtin_scenarios() {
            this.insert(scenario);
        }
        this
    }

    /// Parses a JSON array of scenarios.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let scenarios: Vec<Scenario> = serde_json::from_str(json).map_err(ScenarioError::Parse)?;
        let mut this = Self::empty();
        this.extend(scenarios);
        Ok(this)
    }

    /// Adds or replaces a scenario under its own name.
    pub fn insert(&mut self, scenario: Scenario) -> Option<Scenario> {
        self.scenarios.insert(scenario.name.clone(), scenario)
    }

    pub fn get(&self, name: &str) -> Result<&Scenario, ScenarioError> {
        self.scenarios.get(name).ok_or_else(|| ScenarioError::Unknown {
            name: name.to_owned(),
        })
    }

    /// Looks up every name in order, failing on the first unknown one.
    pub fn select<S>(&self, names: &[S]) -> Result<Vec<Scenario>, ScenarioError>
    where
        S: AsRef<str>,
    {
        names
            .iter()
            .map(|name| self.get(name.as_ref()).cloned())
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.scenarios.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> + '_ {
        self.scenarios.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

impl Extend<Scenario> for ScenarioRegistry {
    fn extend<T: IntoIterator<Item = Scenario>>(&mut self, iter: T) {
        for scenario in iter {
            self.insert(scenario);
        }
    }
}
