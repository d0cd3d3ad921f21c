// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resolves what should be on screen at a given time.

use crate::scene::Scene;
use crate::sequence::Sequence;
use crate::timeline::Timeline;
use crate::tree::ConfigTree;

/// Result of evaluating a timeline at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEvaluation<'a> {
    /// Resolved parameter tree, `None` when no scene is active
    pub config: Option<ConfigTree>,
    /// The active scene, if any
    pub active_scene: Option<&'a Scene>,
}

impl TimelineEvaluation<'_> {
    /// Evaluation for a time no scene covers
    pub fn empty() -> Self {
        Self {
            config: None,
            active_scene: None,
        }
    }
}

/// Find the scene whose `[start, start + duration)` contains `time`.
///
/// When several overlap, the latest start wins. Scenes with identical starts
/// resolve to the first one in `scenes`.
pub fn find_active_scene(scenes: &[Scene], time: f64) -> Option<&Scene> {
    scenes
        .iter()
        .filter(|scene| scene.contains(time))
        .fold(None, |best: Option<&Scene>, scene| match best {
            Some(current) if scene.start_time <= current.start_time => Some(current),
            _ => Some(scene),
        })
}

/// Resolve a scene's parameter tree at absolute `time`.
///
/// Starts from a copy of the scene's base tree, then applies every active
/// sequence in ascending `order` (stable for equal orders), so later layers
/// overwrite earlier ones on shared paths.
pub fn evaluate_scene(scene: &Scene, time: f64) -> ConfigTree {
    let mut config = scene.base_config.clone();
    if scene.sequences.is_empty() {
        return config;
    }

    let scene_time = time - scene.start_time;
    let mut layers: Vec<&Sequence> = scene.sequences.iter().collect();
    layers.sort_by_key(|sequence| sequence.order);

    for sequence in layers {
        sequence.apply(&mut config, scene_time);
    }
    config
}

/// Evaluate the whole timeline at absolute `time`.
///
/// Every call builds a fresh tree; callers that want to skip redundant work
/// must compare results by value.
pub fn evaluate_timeline_at_time(timeline: &Timeline, time: f64) -> TimelineEvaluation<'_> {
    match timeline.active_scene_at(time) {
        Some(scene) => TimelineEvaluation {
            config: Some(evaluate_scene(scene, time)),
            active_scene: Some(scene),
        },
        None => TimelineEvaluation::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::ids::SequentialIds;
    use crate::keyframe::Keyframe;
    use serde_json::json;

    fn two_scene_timeline(ids: &mut SequentialIds) -> Timeline {
        Timeline {
            scenes: vec![
                Scene::new(ids, "A", 0.0, 10.0).with_config(json!({ "shader": "plasma" })),
                Scene::new(ids, "B", 10.0, 10.0).with_config(json!({ "shader": "tunnel" })),
            ],
            ..Timeline::default()
        }
    }

    #[test]
    fn test_half_open_scene_boundary() {
        let mut ids = SequentialIds::new();
        let timeline = two_scene_timeline(&mut ids);
        assert_eq!(find_active_scene(&timeline.scenes, 9.999).map(|s| s.name.as_str()), Some("A"));
        assert_eq!(find_active_scene(&timeline.scenes, 10.0).map(|s| s.name.as_str()), Some("B"));
        assert!(find_active_scene(&timeline.scenes, 20.0).is_none());
    }

    #[test]
    fn test_latest_start_wins_on_overlap() {
        let mut ids = SequentialIds::new();
        let scenes = vec![
            Scene::new(&mut ids, "late", 5.0, 10.0).with_track(0),
            Scene::new(&mut ids, "early", 0.0, 20.0).with_track(1),
        ];
        assert_eq!(find_active_scene(&scenes, 6.0).map(|s| s.name.as_str()), Some("late"));
        assert_eq!(find_active_scene(&scenes, 2.0).map(|s| s.name.as_str()), Some("early"));
    }

    #[test]
    fn test_identical_starts_resolve_to_first_declared() {
        let mut ids = SequentialIds::new();
        let scenes = vec![
            Scene::new(&mut ids, "first", 0.0, 10.0).with_track(3),
            Scene::new(&mut ids, "second", 0.0, 10.0).with_track(0),
        ];
        assert_eq!(find_active_scene(&scenes, 1.0).map(|s| s.name.as_str()), Some("first"));
    }

    #[test]
    fn test_no_scene_gives_empty_evaluation() {
        let mut ids = SequentialIds::new();
        let timeline = two_scene_timeline(&mut ids);
        for time in [-5.0, 20.0, 1e6] {
            assert_eq!(evaluate_timeline_at_time(&timeline, time), TimelineEvaluation::empty());
        }
        assert_eq!(evaluate_timeline_at_time(&Timeline::new(), 0.0), TimelineEvaluation::empty());
    }

    #[test]
    fn test_scene_without_sequences_returns_base_config() {
        let mut ids = SequentialIds::new();
        let timeline = two_scene_timeline(&mut ids);
        let eval = evaluate_timeline_at_time(&timeline, 12.0);
        assert_eq!(eval.active_scene.map(|s| s.name.as_str()), Some("B"));
        assert_eq!(eval.config.unwrap().get_path("shader"), Some(&json!("tunnel")));
    }

    #[test]
    fn test_higher_order_wins_conflicts() {
        let mut ids = SequentialIds::new();
        let high = Sequence::new(&mut ids, "high", 0.0, 10.0)
            .with_order(2)
            .with_keyframe(Keyframe::new(&mut ids, 0.0, "bloom.strength", 2.0));
        let low = Sequence::new(&mut ids, "low", 0.0, 10.0)
            .with_order(1)
            .with_override("bloom.strength", 1.0)
            .with_override("bloom.radius", 4.0);
        // Declared high-first to make sure ordering is by `order`, not position
        let scene = Scene::new(&mut ids, "s", 0.0, 10.0)
            .with_config(json!({ "bloom": { "strength": 0.0, "radius": 0.0 } }))
            .with_sequence(high)
            .with_sequence(low);

        let config = evaluate_scene(&scene, 5.0);
        assert_eq!(config.get_path("bloom.strength"), Some(&json!(2.0)));
        assert_eq!(config.get_path("bloom.radius"), Some(&json!(4.0)));
    }

    #[test]
    fn test_sequence_offsets_and_easing() {
        let mut ids = SequentialIds::new();
        let seq = Sequence::new(&mut ids, "fade", 2.0, 4.0)
            .with_keyframe(Keyframe::new(&mut ids, 0.0, "overlay.opacity", 0.0).with_easing(Easing::EaseIn))
            .with_keyframe(Keyframe::new(&mut ids, 2.0, "overlay.opacity", 1.0));
        let scene = Scene::new(&mut ids, "s", 100.0, 10.0)
            .with_config(json!({ "overlay": { "opacity": 0.5 } }))
            .with_sequence(seq);

        // Scene-local 3.0, sequence-local 1.0, eased 0.25
        let config = evaluate_scene(&scene, 103.0);
        assert_eq!(config.get_path("overlay.opacity"), Some(&json!(0.25)));

        // Outside the sequence window the base value stays
        let config = evaluate_scene(&scene, 109.0);
        assert_eq!(config.get_path("overlay.opacity"), Some(&json!(0.5)));
    }

    #[test]
    fn test_evaluation_never_mutates_the_scene() {
        let mut ids = SequentialIds::new();
        let scene = Scene::new(&mut ids, "s", 0.0, 10.0)
            .with_config(json!({ "a": 1.0 }))
            .with_sequence(
                Sequence::new(&mut ids, "fx", 0.0, 10.0)
                    .with_keyframe(Keyframe::new(&mut ids, 0.0, "a", 5.0)),
            );
        let before = scene.clone();
        let _ = evaluate_scene(&scene, 1.0);
        assert_eq!(scene, before);
    }
}
