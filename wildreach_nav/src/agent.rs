// Per-agent navigation state and stuck detection.
//
// The tracker is a reactive loop fed by external position-update events. For
// each tracked agent it measures displacement since the last update: below
// the stuck-distance threshold, elapsed time accumulates into a stuck timer;
// past the stuck-duration threshold the agent is flagged stuck exactly once,
// its assigned path is cleared, and an `AgentUnstuck` recovery event is
// emitted carrying the current position and the last position where real
// movement was observed. Any real movement resets the timer and re-arms the
// detector.
//
// Position updates may race registration in a live multiplayer system, so
// updates for unknown agents are a silent no-op, and unregistration is
// idempotent.
//
// State is keyed by `AgentId` in a `BTreeMap` for deterministic iteration.
//
// See also: `navigator.rs` which feeds this from typed event handlers,
// `event.rs` for the emitted `AgentUnstuck` payload.

use crate::config::NavConfig;
use crate::event::NavEvent;
use crate::types::{AgentId, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Navigation bookkeeping for one agent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentNavState {
    pub agent_id: AgentId,
    pub position: Vec3,
    /// Final destination of the assigned path, if any.
    pub target: Option<Vec3>,
    /// Assigned route waypoints; empty when idle.
    pub waypoints: Vec<Vec3>,
    /// Index of the waypoint currently being approached.
    pub waypoint_index: usize,
    /// Movement speed in world units per second.
    pub speed: f32,
    pub radius: f32,
    pub max_slope: f32,
    pub is_moving: bool,
    pub is_stuck: bool,
    /// Time accumulated below the stuck-distance threshold.
    stuck_timer: Duration,
    /// Last position where the agent demonstrably moved.
    pub last_valid_position: Vec3,
    /// Clock reading of the previous position update.
    last_update: Option<Duration>,
}

/// Owner of all per-agent navigation state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentTracker {
    agents: BTreeMap<AgentId, AgentNavState>,
}

impl AgentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an agent. Unsupplied speed/radius/slope fall back to config
    /// defaults. Re-registering an existing agent resets its state.
    pub fn register(
        &mut self,
        agent_id: AgentId,
        position: Vec3,
        speed: Option<f32>,
        radius: Option<f32>,
        max_slope: Option<f32>,
        config: &NavConfig,
    ) {
        self.agents.insert(
            agent_id,
            AgentNavState {
                agent_id,
                position,
                target: None,
                waypoints: Vec::new(),
                waypoint_index: 0,
                speed: speed.unwrap_or(config.default_agent_speed),
                radius: radius.unwrap_or(config.default_agent_radius),
                max_slope: max_slope.unwrap_or(config.max_walkable_slope),
                is_moving: false,
                is_stuck: false,
                stuck_timer: Duration::ZERO,
                last_valid_position: position,
                last_update: None,
            },
        );
    }

    /// Stop tracking an agent. Idempotent.
    pub fn unregister(&mut self, agent_id: AgentId) {
        self.agents.remove(&agent_id);
    }

    /// React to an external position update. Returns the recovery event if
    /// this update tripped stuck detection. Unknown agents are a no-op.
    pub fn update_position(
        &mut self,
        agent_id: AgentId,
        position: Vec3,
        now: Duration,
        config: &NavConfig,
    ) -> Option<NavEvent> {
        let state = self.agents.get_mut(&agent_id)?;

        let elapsed = match state.last_update {
            Some(prev) => now.saturating_sub(prev),
            None => Duration::ZERO,
        };
        let displacement = state.position.distance(position);

        state.position = position;
        state.last_update = Some(now);

        if displacement < config.stuck_distance {
            state.stuck_timer += elapsed;
            if !state.is_stuck && state.stuck_timer >= config.stuck_duration() {
                // Flip exactly once per stuck episode: no repeat signaling
                // while still stuck.
                state.is_stuck = true;
                state.is_moving = false;
                state.target = None;
                state.waypoints.clear();
                state.waypoint_index = 0;
                return Some(NavEvent::AgentUnstuck {
                    agent_id,
                    position,
                    fallback: state.last_valid_position,
                });
            }
        } else {
            state.stuck_timer = Duration::ZERO;
            state.is_stuck = false;
            state.last_valid_position = position;
        }

        None
    }

    /// Hand a freshly computed route to an agent. No-op for untracked agents
    /// (the result still reaches the requester through its `PathReady`).
    pub fn assign_path(&mut self, agent_id: AgentId, waypoints: Vec<Vec3>) {
        if let Some(state) = self.agents.get_mut(&agent_id) {
            state.target = waypoints.last().copied();
            state.is_moving = !waypoints.is_empty();
            state.waypoints = waypoints;
            state.waypoint_index = 0;
        }
    }

    pub fn state(&self, agent_id: AgentId) -> Option<&AgentNavState> {
        self.agents.get(&agent_id)
    }

    /// Movement speed for time estimates; config default for unknown agents.
    pub fn speed_of(&self, agent_id: AgentId, config: &NavConfig) -> f32 {
        self.agents
            .get(&agent_id)
            .map(|s| s.speed)
            .unwrap_or(config.default_agent_speed)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn config() -> NavConfig {
        NavConfig::default() // stuck: < 0.5 units for >= 3s
    }

    #[test]
    fn register_applies_defaults() {
        let config = config();
        let mut tracker = AgentTracker::new();
        tracker.register(AgentId(1), Vec3::new(0.0, 0.0, 0.0), None, None, None, &config);

        let state = tracker.state(AgentId(1)).unwrap();
        assert_eq!(state.speed, config.default_agent_speed);
        assert_eq!(state.radius, config.default_agent_radius);
        assert_eq!(state.max_slope, config.max_walkable_slope);
        assert!(!state.is_stuck);
    }

    #[test]
    fn register_honors_payload_overrides() {
        let config = config();
        let mut tracker = AgentTracker::new();
        tracker.register(
            AgentId(1),
            Vec3::new(0.0, 0.0, 0.0),
            Some(9.0),
            Some(1.25),
            Some(0.3),
            &config,
        );

        let state = tracker.state(AgentId(1)).unwrap();
        assert_eq!(state.speed, 9.0);
        assert_eq!(state.radius, 1.25);
        assert_eq!(state.max_slope, 0.3);
    }

    #[test]
    fn unknown_agent_update_is_noop() {
        let config = config();
        let mut tracker = AgentTracker::new();
        let event =
            tracker.update_position(AgentId(99), Vec3::new(1.0, 0.0, 1.0), secs(1), &config);
        assert!(event.is_none());
        assert!(tracker.state(AgentId(99)).is_none());
    }

    #[test]
    fn unregister_is_idempotent() {
        let config = config();
        let mut tracker = AgentTracker::new();
        tracker.register(AgentId(1), Vec3::new(0.0, 0.0, 0.0), None, None, None, &config);
        tracker.unregister(AgentId(1));
        tracker.unregister(AgentId(1));
        assert!(tracker.is_empty());
    }

    #[test]
    fn stuck_fires_exactly_once_and_clears_path() {
        let config = config();
        let mut tracker = AgentTracker::new();
        let pos = Vec3::new(10.0, 0.0, 10.0);
        tracker.register(AgentId(1), pos, None, None, None, &config);
        tracker.assign_path(
            AgentId(1),
            vec![pos, Vec3::new(20.0, 0.0, 10.0)],
        );

        // Stationary updates once per second. The first carries no elapsed
        // time (no previous reading); the timer crosses 3s at t=4.
        assert!(tracker.update_position(AgentId(1), pos, secs(1), &config).is_none());
        assert!(tracker.update_position(AgentId(1), pos, secs(2), &config).is_none());
        assert!(tracker.update_position(AgentId(1), pos, secs(3), &config).is_none());
        let event = tracker.update_position(AgentId(1), pos, secs(4), &config);

        match event {
            Some(NavEvent::AgentUnstuck {
                agent_id,
                position,
                fallback,
            }) => {
                assert_eq!(agent_id, AgentId(1));
                assert_eq!(position, pos);
                assert_eq!(fallback, pos); // never moved, so registration spot
            }
            other => panic!("expected AgentUnstuck, got {other:?}"),
        }

        let state = tracker.state(AgentId(1)).unwrap();
        assert!(state.is_stuck);
        assert!(state.waypoints.is_empty());
        assert!(state.target.is_none());
        assert!(!state.is_moving);

        // Still stationary: no repeat signal.
        assert!(tracker.update_position(AgentId(1), pos, secs(5), &config).is_none());
        assert!(tracker.update_position(AgentId(1), pos, secs(60), &config).is_none());
    }

    #[test]
    fn movement_resets_and_rearms_stuck_detection() {
        let config = config();
        let mut tracker = AgentTracker::new();
        let pos = Vec3::new(0.0, 0.0, 0.0);
        tracker.register(AgentId(1), pos, None, None, None, &config);

        // Trip stuck detection.
        for t in 1..=4 {
            tracker.update_position(AgentId(1), pos, secs(t), &config);
        }
        assert!(tracker.state(AgentId(1)).unwrap().is_stuck);

        // A real move resets state and records the new last-valid position.
        let moved = Vec3::new(5.0, 0.0, 0.0);
        assert!(tracker.update_position(AgentId(1), moved, secs(5), &config).is_none());
        let state = tracker.state(AgentId(1)).unwrap();
        assert!(!state.is_stuck);
        assert_eq!(state.last_valid_position, moved);

        // A later stuck episode signals again.
        let mut fired = 0;
        for t in 6..=20 {
            if tracker
                .update_position(AgentId(1), moved, secs(t), &config)
                .is_some()
            {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn small_jitter_still_counts_as_stuck() {
        let config = config();
        let mut tracker = AgentTracker::new();
        tracker.register(AgentId(1), Vec3::new(0.0, 0.0, 0.0), None, None, None, &config);

        // Wiggle below the 0.5-unit threshold.
        let mut fired = 0;
        for t in 1..=10 {
            let jitter = if t % 2 == 0 { 0.1 } else { -0.1 };
            if tracker
                .update_position(AgentId(1), Vec3::new(jitter, 0.0, 0.0), secs(t), &config)
                .is_some()
            {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn assign_path_sets_target_and_moving() {
        let config = config();
        let mut tracker = AgentTracker::new();
        tracker.register(AgentId(1), Vec3::new(0.0, 0.0, 0.0), None, None, None, &config);

        let waypoints = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 2.0),
        ];
        tracker.assign_path(AgentId(1), waypoints.clone());

        let state = tracker.state(AgentId(1)).unwrap();
        assert!(state.is_moving);
        assert_eq!(state.target, Some(Vec3::new(4.0, 0.0, 2.0)));
        assert_eq!(state.waypoints, waypoints);
        assert_eq!(state.waypoint_index, 0);
    }
}
