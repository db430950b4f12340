// extensions/tween.rs
//
// Tween system: animated transform transitions on scene nodes.
// Time is in milliseconds, matching the frame clock.
//
// Usage:
//   let mut tweens = TweenState::new();
//   tweens.add(node, Tween::orientation(from, to, 750.0, Easing::CubicOut));
//   tweens.tick(dt_ms, &mut graph);  // Advances all tweens, writes local transforms

use std::collections::HashMap;
use glam::Quat;
use crate::core::scene::{NodeId, SceneGraph};
use super::easing::{Easing, ease, ease_quat};

/// What part of a node's local transform a tween animates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenTarget {
    /// Slerp the local rotation.
    Orientation { from: Quat, to: Quat },
    /// Rotate about local Y by an animated angle on top of `base`.
    Yaw { base: Quat, from: f32, to: f32 },
}

/// A single one-shot tween.
#[derive(Debug, Clone)]
pub struct Tween {
    pub target: TweenTarget,
    /// Duration in ms.
    pub duration_ms: f64,
    /// Elapsed time in ms.
    pub elapsed_ms: f64,
    pub easing: Easing,
    /// Optional event ID to report when complete.
    pub on_complete: Option<u32>,
}

impl Tween {
    fn with_target(target: TweenTarget, duration_ms: f64, easing: Easing) -> Self {
        Self {
            target,
            duration_ms: duration_ms.max(0.0),
            elapsed_ms: 0.0,
            easing,
            on_complete: None,
        }
    }

    pub fn orientation(from: Quat, to: Quat, duration_ms: f64, easing: Easing) -> Self {
        Self::with_target(TweenTarget::Orientation { from, to }, duration_ms, easing)
    }

    pub fn yaw(base: Quat, from: f32, to: f32, duration_ms: f64, easing: Easing) -> Self {
        Self::with_target(TweenTarget::Yaw { base, from, to }, duration_ms, easing)
    }

    pub fn with_on_complete(mut self, event_id: u32) -> Self {
        self.on_complete = Some(event_id);
        self
    }

    /// Normalized progress [0, 1].
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0) as f32
        }
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }

    /// Advance time. Returns true once the tween has reached its end.
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        self.elapsed_ms = (self.elapsed_ms + dt_ms.max(0.0)).min(self.duration_ms);
        self.is_complete()
    }

    /// Write the current value into `node`'s local transform.
    pub fn apply(&self, graph: &mut SceneGraph, node: NodeId) {
        let t = self.progress();
        let Some(local) = graph.local_mut(node) else {
            return;
        };
        match self.target {
            TweenTarget::Orientation { from, to } => {
                local.rotation = ease_quat(from, to, t, self.easing);
            }
            TweenTarget::Yaw { base, from, to } => {
                let angle = ease(from, to, t, self.easing);
                local.rotation = (base * Quat::from_rotation_y(angle)).normalize();
            }
        }
    }
}

/// Handle to a tween for later reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenId(pub u32);

/// Manages all active tweens.
#[derive(Debug, Default)]
pub struct TweenState {
    tweens: HashMap<TweenId, (NodeId, Tween)>,
    next_id: u32,
    /// Completed tween events to be polled.
    completed_events: Vec<u32>,
}

impl TweenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tween for a node. Returns a handle for later control.
    pub fn add(&mut self, node: NodeId, tween: Tween) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id += 1;
        self.tweens.insert(id, (node, tween));
        id
    }

    /// Advance all tweens and apply them to the graph.
    /// Returns the number of tweens that completed this tick.
    pub fn tick(&mut self, dt_ms: f64, graph: &mut SceneGraph) -> usize {
        let mut completed = Vec::new();

        for (&id, (node, tween)) in self.tweens.iter_mut() {
            let done = tween.advance(dt_ms);
            tween.apply(graph, *node);
            if done {
                if let Some(event_id) = tween.on_complete {
                    self.completed_events.push(event_id);
                }
                completed.push(id);
            }
        }

        let count = completed.len();
        for id in completed {
            self.tweens.remove(&id);
        }

        count
    }

    /// Drain completed tween events.
    pub fn drain_completed(&mut self) -> impl Iterator<Item = u32> + '_ {
        self.completed_events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn orientation_tween_reaches_target() {
        let mut graph = SceneGraph::new();
        let node = graph.spawn("light");
        let target = Quat::from_rotation_x(1.2);
        let mut tweens = TweenState::new();
        tweens.add(node, Tween::orientation(Quat::IDENTITY, target, 750.0, Easing::CubicOut));

        assert_eq!(tweens.tick(375.0, &mut graph), 0);
        let mid = graph.local(node).unwrap().rotation;
        // CubicOut: most of the way after half the time
        assert!(mid.angle_between(target) < 0.2);
        assert!(mid.angle_between(target) > 1e-2);

        assert_eq!(tweens.tick(375.0, &mut graph), 1);
        assert!(graph.local(node).unwrap().rotation.angle_between(target) < 2e-3);
        assert!(tweens.is_empty());
    }

    #[test]
    fn yaw_full_turn() {
        let mut graph = SceneGraph::new();
        let node = graph.spawn("pivot");
        let mut tweens = TweenState::new();
        tweens.add(node, Tween::yaw(Quat::IDENTITY, 0.0, TAU, 5000.0, Easing::Linear));

        tweens.tick(1250.0, &mut graph);
        let quarter = graph.local(node).unwrap().rotation;
        assert!(quarter.angle_between(Quat::from_rotation_y(TAU / 4.0)) < 2e-3);

        tweens.tick(3750.0, &mut graph);
        // a full turn lands back on the starting orientation
        assert!(graph.local(node).unwrap().rotation.angle_between(Quat::IDENTITY) < 2e-3);
    }

    #[test]
    fn completion_event() {
        let mut graph = SceneGraph::new();
        let node = graph.spawn("n");
        let target = Quat::from_rotation_z(0.5);
        let mut tweens = TweenState::new();
        tweens.add(node, Tween::orientation(Quat::IDENTITY, target, 100.0, Easing::Linear).with_on_complete(7));
        assert_eq!(tweens.len(), 1);
        tweens.tick(150.0, &mut graph);
        let events: Vec<u32> = tweens.drain_completed().collect();
        assert_eq!(events, vec![7]);
        assert!(graph.local(node).unwrap().rotation.angle_between(target) < 2e-3);
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut tween = Tween::orientation(Quat::IDENTITY, Quat::from_rotation_z(1.0), 0.0, Easing::CubicOut);
        assert!(tween.advance(0.0));
        assert_eq!(tween.progress(), 1.0);
    }

    #[test]
    fn tweens_on_separate_nodes_run_independently() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn("a");
        let b = graph.spawn("b");
        let mut tweens = TweenState::new();
        tweens.add(a, Tween::yaw(Quat::IDENTITY, 0.0, 1.0, 100.0, Easing::Linear));
        tweens.add(b, Tween::yaw(Quat::IDENTITY, 0.0, 1.0, 200.0, Easing::Linear));
        assert_eq!(tweens.tick(100.0, &mut graph), 1);
        assert_eq!(tweens.len(), 1);
        let half = graph.local(b).unwrap().rotation;
        assert!(half.angle_between(Quat::from_rotation_y(0.5)) < 2e-3);
    }
}
