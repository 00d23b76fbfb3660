// cl_flyby.rs — viewpoint search around a tracked player
//
// Candidate directions are built from the target's yaw-only basis and probed
// in a fixed order. A candidate is usable when the trace outward from the
// target stays dry and ends between FLYBY_MIN_DIST and FLYBY_MAX_DIST away;
// with visibility checking the camera must also be able to reach it.

use qwspec_common::q_shared::{
    angle_vectors_tuple, vector_distance, vector_length_squared, vector_ma, vector_normalize,
    vector_subtract, Vec3, PITCH, ROLL,
};

use crate::cl_trace::TraceOracle;

pub const FLYBY_MAX_DIST: f32 = 800.0;
pub const FLYBY_MIN_DIST: f32 = 32.0;
/// Anything at or above this means no candidate was found.
pub const FLYBY_SENTINEL: f32 = 1000.0;
/// A vantage closer than 16 units to the target is not a view.
pub const MIN_VISIBLE_DIST_SQUARED: f32 = 256.0;

/// One candidate direction as coefficients on (forward, right, up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlybyCandidate {
    pub forward: f32,
    pub right: f32,
    pub up: f32,
}

const fn cand(forward: f32, right: f32, up: f32) -> FlybyCandidate {
    FlybyCandidate { forward, right, up }
}

/// Probe order; earlier entries win ties.
pub const FLYBY_CANDIDATES: [FlybyCandidate; 12] = [
    cand(1.0, 1.0, 1.0),   // forward+up+right
    cand(1.0, -1.0, 1.0),  // forward+up-right
    cand(1.0, 1.0, 0.0),   // forward+right
    cand(1.0, -1.0, 0.0),  // forward-right
    cand(1.0, 0.0, 1.0),   // forward+up
    cand(1.0, 0.0, -1.0),  // forward-up
    cand(-1.0, 1.0, 1.0),  // up+right-forward
    cand(-1.0, -1.0, 1.0), // up-right-forward
    cand(-1.0, 0.0, 0.0),  // -forward
    cand(1.0, 0.0, 0.0),   // forward
    cand(0.0, -1.0, 0.0),  // -right
    cand(0.0, 1.0, 0.0),   // right
];

impl FlybyCandidate {
    /// Combine with a basis; the result is not normalized.
    pub fn direction(&self, forward: &Vec3, right: &Vec3, up: &Vec3) -> Vec3 {
        let mut v = [0.0; 3];
        for i in 0..3 {
            v[i] = self.forward * forward[i] + self.right * right[i] + self.up * up[i];
        }
        v
    }
}

/// A vantage point that passed every check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flyby {
    pub position: Vec3,
    /// Score the search minimized.
    pub distance: f32,
    /// Index into FLYBY_CANDIDATES.
    pub candidate: usize,
}

/// Probe one direction from `target`. Returns the trace endpoint and its
/// score, or None when the direction is unusable.
///
/// Without visibility checking the score is the distance from the target;
/// with it, the distance from the camera to the endpoint, so the search
/// prefers vantages the camera can reach with the least movement.
pub fn try_flyby(
    world: &dyn TraceOracle,
    self_origin: &Vec3,
    target_origin: &Vec3,
    dir: &Vec3,
    checkvis: bool,
) -> Option<(Vec3, f32)> {
    let mut v = *dir;
    if vector_normalize(&mut v) == 0.0 {
        return None;
    }

    let end = vector_ma(target_origin, FLYBY_MAX_DIST, &v);
    let trace = world.trace(target_origin, &end);
    if trace.inwater {
        return None;
    }

    // an unobstructed trace is exactly the band's outer edge, whatever the
    // rounding in its endpoint
    let mut len = if trace.fraction == 1.0 {
        FLYBY_MAX_DIST
    } else {
        vector_distance(&trace.endpos, target_origin).min(FLYBY_MAX_DIST)
    };
    if len < FLYBY_MIN_DIST {
        return None;
    }

    if checkvis {
        let trace = world.trace(self_origin, &trace.endpos);
        if !trace.is_clear() {
            return None;
        }
        len = vector_distance(&trace.endpos, self_origin);
    }

    Some((trace.endpos, len))
}

/// Search the twelve candidates around a target whose view angles are
/// `target_angles`. Only the yaw is used.
pub fn find_flyby(
    world: &dyn TraceOracle,
    self_origin: &Vec3,
    target_origin: &Vec3,
    target_angles: &Vec3,
    checkvis: bool,
) -> Option<Flyby> {
    let mut angles = *target_angles;
    angles[PITCH] = 0.0;
    angles[ROLL] = 0.0;
    let (forward, right, up) = angle_vectors_tuple(&angles);

    let mut best: Option<Flyby> = None;
    let mut max = FLYBY_SENTINEL;

    for (i, candidate) in FLYBY_CANDIDATES.iter().enumerate() {
        let dir = candidate.direction(&forward, &right, &up);
        if let Some((position, dist)) = try_flyby(world, self_origin, target_origin, &dir, checkvis) {
            if dist < max {
                max = dist;
                best = Some(Flyby {
                    position,
                    distance: dist,
                    candidate: i,
                });
            }
        }
    }

    best
}

/// Whether `vantage` still sees `target_origin`: a clear, dry line of sight
/// and not inside the target.
pub fn is_visible(world: &dyn TraceOracle, target_origin: &Vec3, vantage: &Vec3) -> bool {
    let trace = world.trace(target_origin, vantage);
    if !trace.is_clear() {
        return false;
    }
    vector_length_squared(&vector_subtract(vantage, target_origin)) >= MIN_VISIBLE_DIST_SQUARED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl_trace::BoxWorld;
    use qwspec_common::q_shared::Trace;

    const TARGET: Vec3 = [0.0, 0.0, 24.0];

    #[test]
    fn test_candidates_are_distinct() {
        for (i, a) in FLYBY_CANDIDATES.iter().enumerate() {
            for b in FLYBY_CANDIDATES.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_open_world_locks_at_max_distance() {
        let world = BoxWorld::new();
        let me = [0.0, 0.0, 24.0];
        let fly = find_flyby(&world, &me, &TARGET, &[0.0; 3], false).unwrap();
        assert!((fly.distance - FLYBY_MAX_DIST).abs() < 0.01);
        assert!((vector_distance(&fly.position, &TARGET) - FLYBY_MAX_DIST).abs() < 0.01);

        let again = find_flyby(&world, &me, &TARGET, &[0.0; 3], false).unwrap();
        assert_eq!(fly, again);
    }

    #[test]
    fn test_exact_ties_keep_earlier_candidate() {
        // every probe reports the same distance
        let oracle = |start: &Vec3, _end: &Vec3| Trace {
            fraction: 0.5,
            endpos: [start[0] + 100.0, start[1], start[2]],
            ..Trace::default()
        };
        let fly = find_flyby(&oracle, &TARGET, &TARGET, &[0.0; 3], false).unwrap();
        assert_eq!(fly.candidate, 0);
    }

    #[test]
    fn test_walled_in_target_fails() {
        let world = BoxWorld::enclosure(TARGET, 20.0, 8.0);
        assert!(find_flyby(&world, &TARGET, &TARGET, &[0.0; 3], true).is_none());
        assert!(find_flyby(&world, &TARGET, &TARGET, &[0.0; 3], false).is_none());
    }

    #[test]
    fn test_band_rejects_too_close() {
        // everything hits at 10 units
        let oracle = |start: &Vec3, end: &Vec3| {
            let mut dir = vector_subtract(end, start);
            vector_normalize(&mut dir);
            Trace {
                fraction: 0.5,
                endpos: vector_ma(start, 10.0, &dir),
                ..Trace::default()
            }
        };
        assert!(try_flyby(&oracle, &[0.0; 3], &TARGET, &[1.0, 0.0, 0.0], false).is_none());
    }

    #[test]
    fn test_band_accepts_inside() {
        let oracle = |start: &Vec3, end: &Vec3| {
            let mut dir = vector_subtract(end, start);
            vector_normalize(&mut dir);
            Trace {
                fraction: 0.5,
                endpos: vector_ma(start, 400.0, &dir),
                ..Trace::default()
            }
        };
        let (pos, len) = try_flyby(&oracle, &[0.0; 3], &TARGET, &[0.0, 2.0, 0.0], false).unwrap();
        assert!((len - 400.0).abs() < 0.01);
        assert!((pos[1] - 400.0).abs() < 0.01);
    }

    #[test]
    fn test_water_rejects_candidate() {
        let mut world = BoxWorld::new();
        // lake covering everything below the target
        world.add_water([-2000.0, -2000.0, -2000.0], [2000.0, 2000.0, 0.0]);
        let up_only = try_flyby(&world, &TARGET, &TARGET, &[0.0, 0.0, 1.0], false);
        assert!(up_only.is_some());
        let down = try_flyby(&world, &TARGET, &TARGET, &[1.0, 0.0, -1.0], false);
        assert!(down.is_none());
    }

    #[test]
    fn test_checkvis_prefers_vantage_nearest_camera() {
        let world = BoxWorld::new();
        // camera sitting far behind the target (yaw 0 => behind is -x)
        let me = [-900.0, 0.0, 24.0];
        let fly = find_flyby(&world, &me, &TARGET, &[0.0; 3], true).unwrap();
        assert_eq!(fly.candidate, 8); // -forward
        assert!((fly.position[0] + FLYBY_MAX_DIST).abs() < 0.01);
    }

    #[test]
    fn test_checkvis_rejects_blocked_camera() {
        let mut world = BoxWorld::new();
        // camera boxed in on its own; target in the open
        let me = [1000.0, 1000.0, 24.0];
        world.add_solid([960.0, 960.0, -100.0], [970.0, 1040.0, 100.0]);
        world.add_solid([1030.0, 960.0, -100.0], [1040.0, 1040.0, 100.0]);
        world.add_solid([960.0, 960.0, -100.0], [1040.0, 970.0, 100.0]);
        world.add_solid([960.0, 1030.0, -100.0], [1040.0, 1040.0, 100.0]);
        world.add_solid([960.0, 960.0, 100.0], [1040.0, 1040.0, 110.0]);
        world.add_solid([960.0, 960.0, -110.0], [1040.0, 1040.0, -100.0]);
        assert!(find_flyby(&world, &me, &TARGET, &[0.0; 3], true).is_none());
        assert!(find_flyby(&world, &me, &TARGET, &[0.0; 3], false).is_some());
    }

    #[test]
    fn test_result_always_inside_band() {
        let mut world = BoxWorld::new();
        world
            .add_solid([300.0, -1000.0, -1000.0], [310.0, 1000.0, 1000.0])
            .add_solid([-1000.0, -1000.0, 500.0], [1000.0, 1000.0, 510.0])
            .add_solid([-1000.0, -1000.0, -10.0], [1000.0, 1000.0, 0.0]);
        for yaw in [0.0, 45.0, 90.0, 180.0, 270.0] {
            if let Some(fly) = find_flyby(&world, &TARGET, &TARGET, &[0.0, yaw, 0.0], false) {
                assert!(fly.distance >= FLYBY_MIN_DIST);
                assert!(fly.distance <= FLYBY_MAX_DIST, "scored {}", fly.distance);
                let d = vector_distance(&fly.position, &TARGET);
                assert!((d - fly.distance).abs() < 0.01);
            }
        }
    }

    #[test]
    fn test_diagonal_open_trace_scores_outer_edge() {
        let world = BoxWorld::new();
        let origin = [123.4, -56.7, 24.0];
        let dir = [0.3, 0.7, -0.2];
        let (position, len) = try_flyby(&world, &origin, &origin, &dir, false).unwrap();
        assert_eq!(len, FLYBY_MAX_DIST);
        assert!((vector_distance(&position, &origin) - FLYBY_MAX_DIST).abs() < 0.01);
    }

    #[test]
    fn test_visibility() {
        let mut world = BoxWorld::new();
        assert!(is_visible(&world, &TARGET, &[100.0, 0.0, 24.0]));
        // too close
        assert!(!is_visible(&world, &TARGET, &[10.0, 0.0, 24.0]));
        world.add_solid([50.0, -10.0, -10.0], [60.0, 10.0, 60.0]);
        assert!(!is_visible(&world, &TARGET, &[100.0, 0.0, 24.0]));
    }
}
