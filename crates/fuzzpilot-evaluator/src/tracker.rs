//! Persistent asteroid identifiers across ticks.
//!
//! Snapshots list asteroids in no particular order, and the order changes whenever one is
//! destroyed or split. The tracker matches each current asteroid to the nearest track of
//! the previous tick, after predicting its position one step back with its own velocity.
//! A match is accepted only within `|v|·dt·1.5 + 1e-3`; anything else becomes a new track.
//! Tracks that are not matched in a tick disappear.

use fuzzpilot_engine::{AsteroidState, MapSize, Vec2};

pub type TrackId = u64;

const MATCH_SLACK: f64 = 1.5;
const MATCH_FLOOR: f64 = 1e-3;

#[derive(Debug, Default, Clone)]
pub struct AsteroidTracker {
    tracks: Vec<(TrackId, Vec2)>,
    next_id: TrackId,
}

impl AsteroidTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns an identifier to each asteroid, in input order.
    ///
    /// Matching is greedy: asteroids are processed in order, and each previous track can be
    /// claimed at most once.
    pub fn update(
        &mut self,
        asteroids: &[AsteroidState],
        delta_time: f64,
        map: MapSize,
    ) -> Vec<TrackId> {
        let mut claimed = vec![false; self.tracks.len()];
        let mut tracks = Vec::with_capacity(asteroids.len());
        let mut ids = Vec::with_capacity(asteroids.len());

        for asteroid in asteroids {
            let predicted = map.wrap(asteroid.position - asteroid.velocity * delta_time);
            let threshold = asteroid.velocity.length() * delta_time * MATCH_SLACK + MATCH_FLOOR;

            let best = self
                .tracks
                .iter()
                .enumerate()
                .filter(|(i, _)| !claimed[*i])
                .map(|(i, (_, position))| (i, map.shortest_delta(predicted, *position).length()))
                .filter(|(_, distance)| *distance < threshold)
                .min_by(|a, b| a.1.total_cmp(&b.1));

            let id = match best {
                Some((i, _)) => {
                    claimed[i] = true;
                    self.tracks[i].0
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    id
                }
            };
            tracks.push((id, asteroid.position));
            ids.push(id);
        }

        self.tracks = tracks;
        ids
    }

    /// Forgets every track. Identifiers are never reused.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
