// cl_trace.rs — line traces for camera placement
//
// The camera only needs to know how far a straight line gets before it hits
// something solid, and whether it passed through liquid. TraceOracle is that
// question; BoxWorld answers it for a world made of axis-aligned brushes.

use qwspec_common::q_shared::{vector_ma, vector_subtract, Trace, Vec3};

/// 1/32 epsilon to keep floating point happy
const DIST_EPSILON: f32 = 0.03125;

/// Anything that can trace a point from `start` to `end`.
pub trait TraceOracle {
    fn trace(&self, start: &Vec3, end: &Vec3) -> Trace;
}

impl<F> TraceOracle for F
where
    F: Fn(&Vec3, &Vec3) -> Trace,
{
    fn trace(&self, start: &Vec3, end: &Vec3) -> Trace {
        self(start, end)
    }
}

/// Axis-aligned brush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxBrush {
    pub mins: Vec3,
    pub maxs: Vec3,
}

impl BoxBrush {
    pub fn new(mins: Vec3, maxs: Vec3) -> Self {
        Self { mins, maxs }
    }

    pub fn contains(&self, p: &Vec3) -> bool {
        (0..3).all(|i| p[i] >= self.mins[i] && p[i] <= self.maxs[i])
    }

    /// The six bounding planes as (normal axis, sign, dist).
    fn planes(&self) -> impl Iterator<Item = (usize, f32, f32)> + '_ {
        (0..3).flat_map(move |axis| {
            [(axis, 1.0, self.maxs[axis]), (axis, -1.0, -self.mins[axis])]
        })
    }

    /// Clip the segment p1→p2 against this brush, lowering `trace.fraction`
    /// when it enters earlier than anything found so far.
    fn clip_segment(&self, p1: &Vec3, p2: &Vec3, trace: &mut Trace) {
        let mut enterfrac: f32 = -1.0;
        let mut leavefrac: f32 = 1.0;
        let mut getout = false;
        let mut startout = false;

        for (axis, sign, dist) in self.planes() {
            let d1 = sign * p1[axis] - dist;
            let d2 = sign * p2[axis] - dist;

            if d2 > 0.0 {
                getout = true;
            }
            if d1 > 0.0 {
                startout = true;
            }

            // completely in front of face, no intersection
            if d1 > 0.0 && d2 >= d1 {
                return;
            }
            if d1 <= 0.0 && d2 <= 0.0 {
                continue;
            }

            if d1 > d2 {
                let f = (d1 - DIST_EPSILON) / (d1 - d2);
                if f > enterfrac {
                    enterfrac = f;
                }
            } else {
                let f = (d1 + DIST_EPSILON) / (d1 - d2);
                if f < leavefrac {
                    leavefrac = f;
                }
            }
        }

        if !startout {
            // original point was inside brush
            trace.startsolid = true;
            if !getout {
                trace.allsolid = true;
                trace.fraction = 0.0;
            }
            return;
        }

        if enterfrac < leavefrac && enterfrac > -1.0 && enterfrac < trace.fraction {
            trace.fraction = enterfrac.max(0.0);
        }
    }

    /// Whether the segment p1→p2 passes through any part of the brush.
    fn touches_segment(&self, p1: &Vec3, p2: &Vec3) -> bool {
        let mut tmin: f32 = 0.0;
        let mut tmax: f32 = 1.0;
        for axis in 0..3 {
            let d = p2[axis] - p1[axis];
            if d.abs() < 1e-6 {
                if p1[axis] < self.mins[axis] || p1[axis] > self.maxs[axis] {
                    return false;
                }
                continue;
            }
            let mut t1 = (self.mins[axis] - p1[axis]) / d;
            let mut t2 = (self.maxs[axis] - p1[axis]) / d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            tmin = tmin.max(t1);
            tmax = tmax.min(t2);
            if tmin > tmax {
                return false;
            }
        }
        true
    }
}

/// What occupies a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contents {
    Empty,
    Solid,
    Water,
}

/// A world of solid and liquid boxes.
#[derive(Debug, Clone, Default)]
pub struct BoxWorld {
    pub solids: Vec<BoxBrush>,
    pub liquids: Vec<BoxBrush>,
}

impl BoxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_solid(&mut self, mins: Vec3, maxs: Vec3) -> &mut Self {
        self.solids.push(BoxBrush::new(mins, maxs));
        self
    }

    pub fn add_water(&mut self, mins: Vec3, maxs: Vec3) -> &mut Self {
        self.liquids.push(BoxBrush::new(mins, maxs));
        self
    }

    /// Six slabs of `thickness` closing off the cube of half-size `inner`
    /// around `center`.
    pub fn enclosure(center: Vec3, inner: f32, thickness: f32) -> Self {
        let mut world = Self::new();
        let outer = inner + thickness;
        for axis in 0..3 {
            for sign in [1.0f32, -1.0] {
                let mut mins = [0.0; 3];
                let mut maxs = [0.0; 3];
                for i in 0..3 {
                    if i == axis {
                        let (a, b) = (sign * inner, sign * outer);
                        mins[i] = center[i] + a.min(b);
                        maxs[i] = center[i] + a.max(b);
                    } else {
                        mins[i] = center[i] - outer;
                        maxs[i] = center[i] + outer;
                    }
                }
                world.add_solid(mins, maxs);
            }
        }
        world
    }

    pub fn point_contents(&self, p: &Vec3) -> Contents {
        if self.solids.iter().any(|b| b.contains(p)) {
            Contents::Solid
        } else if self.liquids.iter().any(|b| b.contains(p)) {
            Contents::Water
        } else {
            Contents::Empty
        }
    }
}

impl TraceOracle for BoxWorld {
    fn trace(&self, start: &Vec3, end: &Vec3) -> Trace {
        let mut trace = Trace::default();

        for brush in &self.solids {
            brush.clip_segment(start, end, &mut trace);
            if trace.allsolid {
                break;
            }
        }

        let delta = vector_subtract(end, start);
        trace.endpos = if trace.fraction == 1.0 {
            *end
        } else {
            vector_ma(start, trace.fraction, &delta)
        };

        trace.inwater = self
            .liquids
            .iter()
            .any(|w| w.touches_segment(start, &trace.endpos));

        trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qwspec_common::q_shared::vector_distance;

    #[test]
    fn test_empty_world_is_clear() {
        let world = BoxWorld::new();
        let tr = world.trace(&[0.0; 3], &[800.0, 0.0, 0.0]);
        assert!(tr.is_clear());
        assert_eq!(tr.endpos, [800.0, 0.0, 0.0]);
    }

    #[test]
    fn test_hits_wall_short_of_face() {
        let mut world = BoxWorld::new();
        world.add_solid([100.0, -50.0, -50.0], [120.0, 50.0, 50.0]);
        let tr = world.trace(&[0.0; 3], &[800.0, 0.0, 0.0]);
        assert!(tr.fraction < 1.0);
        assert!(!tr.startsolid);
        assert!(tr.endpos[0] < 100.0);
        assert!(tr.endpos[0] > 99.9);
    }

    #[test]
    fn test_misses_box_to_the_side() {
        let mut world = BoxWorld::new();
        world.add_solid([100.0, 60.0, -50.0], [120.0, 80.0, 50.0]);
        let tr = world.trace(&[0.0; 3], &[800.0, 0.0, 0.0]);
        assert_eq!(tr.fraction, 1.0);
    }

    #[test]
    fn test_nearest_brush_wins() {
        let mut world = BoxWorld::new();
        world
            .add_solid([300.0, -10.0, -10.0], [310.0, 10.0, 10.0])
            .add_solid([200.0, -10.0, -10.0], [210.0, 10.0, 10.0]);
        let tr = world.trace(&[0.0; 3], &[800.0, 0.0, 0.0]);
        assert!((tr.endpos[0] - 200.0).abs() < 0.1);
    }

    #[test]
    fn test_start_inside_solid() {
        let mut world = BoxWorld::new();
        world.add_solid([-10.0; 3], [10.0; 3]);
        let tr = world.trace(&[0.0; 3], &[5.0, 0.0, 0.0]);
        assert!(tr.startsolid);
        assert!(tr.allsolid);
        assert_eq!(tr.fraction, 0.0);
    }

    #[test]
    fn test_water_flags_inwater() {
        let mut world = BoxWorld::new();
        world.add_water([100.0, -50.0, -50.0], [200.0, 50.0, 50.0]);
        let tr = world.trace(&[0.0; 3], &[800.0, 0.0, 0.0]);
        assert_eq!(tr.fraction, 1.0);
        assert!(tr.inwater);
        assert!(!tr.is_clear());

        let tr = world.trace(&[0.0; 3], &[0.0, 800.0, 0.0]);
        assert!(!tr.inwater);
    }

    #[test]
    fn test_water_behind_wall_not_reached() {
        let mut world = BoxWorld::new();
        world
            .add_solid([50.0, -50.0, -50.0], [60.0, 50.0, 50.0])
            .add_water([100.0, -50.0, -50.0], [200.0, 50.0, 50.0]);
        let tr = world.trace(&[0.0; 3], &[800.0, 0.0, 0.0]);
        assert!(!tr.inwater);
    }

    #[test]
    fn test_enclosure_blocks_every_axis() {
        let world = BoxWorld::enclosure([0.0, 0.0, 24.0], 20.0, 8.0);
        let start = [0.0, 0.0, 24.0];
        for dir in [
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
            [0.577, 0.577, 0.577],
        ] {
            let end = vector_ma(&start, 800.0, &dir);
            let tr = world.trace(&start, &end);
            assert!(tr.fraction < 1.0);
            assert!(vector_distance(&start, &tr.endpos) <= 36.0);
        }
        assert_eq!(world.point_contents(&start), Contents::Empty);
        assert_eq!(world.point_contents(&[0.0, 0.0, 48.0]), Contents::Solid);
    }

    #[test]
    fn test_closure_oracle() {
        let oracle = |_: &Vec3, end: &Vec3| Trace {
            endpos: *end,
            inwater: true,
            ..Trace::default()
        };
        assert!(oracle.trace(&[0.0; 3], &[1.0; 3]).inwater);
    }
}
