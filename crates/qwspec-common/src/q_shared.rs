// q_shared.rs — foundational types and functions shared by all modules
// Vector math, angle helpers, trace results and the outgoing user command.

// ============================================================
// Basic types
// ============================================================

pub type Vec3 = [f32; 3];

// angle indexes
pub const PITCH: usize = 0; // up / down
pub const YAW: usize = 1; // left / right
pub const ROLL: usize = 2; // fall over

pub const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;

// ============================================================
// Limits
// ============================================================

/// Player slots known to the client.
pub const MAX_CLIENTS: usize = 32;

pub const MAX_STRING_CHARS: usize = 1024;
pub const MAX_STRING_TOKENS: usize = 80;

// ============================================================
// Cvar flags
// ============================================================

pub const CVAR_ARCHIVE: i32 = 1; // set to cause it to be saved to vars.rc
pub const CVAR_NOSET: i32 = 8; // don't allow change from console at all

// ============================================================
// Trace
// ============================================================

/// Result of a straight-line move through the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trace {
    pub allsolid: bool,
    pub startsolid: bool,
    /// 1.0 = didn't hit anything
    pub fraction: f32,
    /// final position
    pub endpos: Vec3,
    /// some part of the move was inside a liquid volume
    pub inwater: bool,
}

impl Default for Trace {
    fn default() -> Self {
        Self {
            allsolid: false,
            startsolid: false,
            fraction: 1.0,
            endpos: [0.0; 3],
            inwater: false,
        }
    }
}

impl Trace {
    /// True when the move reached its end point and stayed out of liquid.
    pub fn is_clear(&self) -> bool {
        self.fraction == 1.0 && !self.inwater
    }
}

// ============================================================
// Button bits
// ============================================================

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Buttons: u8 {
        const ATTACK = 0x01;
        const JUMP   = 0x02;
        const USE    = 0x04;
    }
}

// ============================================================
// Usercmd
// ============================================================

/// One tick of intended movement, sent to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UserCmd {
    pub msec: u8,
    pub angles: Vec3,
    pub forwardmove: i16,
    pub sidemove: i16,
    pub upmove: i16,
    pub buttons: Buttons,
    pub impulse: u8,
}

impl UserCmd {
    pub fn clear_movement(&mut self) {
        self.forwardmove = 0;
        self.sidemove = 0;
        self.upmove = 0;
    }
}

// ============================================================
// MATHLIB — Vector operations
// ============================================================

#[inline]
pub fn dot_product(a: &Vec3, b: &Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn vector_subtract(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// veca + scale * vecb
pub fn vector_ma(veca: &Vec3, scale: f32, vecb: &Vec3) -> Vec3 {
    [
        veca[0] + scale * vecb[0],
        veca[1] + scale * vecb[1],
        veca[2] + scale * vecb[2],
    ]
}

pub fn vector_compare(v1: &Vec3, v2: &Vec3) -> bool {
    v1[0] == v2[0] && v1[1] == v2[1] && v1[2] == v2[2]
}

/// Normalize in place, returns original length.
pub fn vector_normalize(v: &mut Vec3) -> f32 {
    let length = vector_length(v);
    if length != 0.0 {
        let ilength = 1.0 / length;
        v[0] *= ilength;
        v[1] *= ilength;
        v[2] *= ilength;
    }
    length
}

pub fn vector_length(v: &Vec3) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[inline]
pub fn vector_length_squared(v: &Vec3) -> f32 {
    dot_product(v, v)
}

pub fn vector_distance(a: &Vec3, b: &Vec3) -> f32 {
    vector_length(&vector_subtract(a, b))
}

// ============================================================
// Angle functions
// ============================================================

pub fn angle_vectors(
    angles: &Vec3,
    forward: Option<&mut Vec3>,
    right: Option<&mut Vec3>,
    up: Option<&mut Vec3>,
) {
    let angle_yaw = angles[YAW].to_radians();
    let sy = angle_yaw.sin();
    let cy = angle_yaw.cos();

    let angle_pitch = angles[PITCH].to_radians();
    let sp = angle_pitch.sin();
    let cp = angle_pitch.cos();

    let angle_roll = angles[ROLL].to_radians();
    let sr = angle_roll.sin();
    let cr = angle_roll.cos();

    if let Some(fwd) = forward {
        fwd[0] = cp * cy;
        fwd[1] = cp * sy;
        fwd[2] = -sp;
    }
    if let Some(r) = right {
        r[0] = -sr * sp * cy + -cr * -sy;
        r[1] = -sr * sp * sy + -cr * cy;
        r[2] = -sr * cp;
    }
    if let Some(u) = up {
        u[0] = cr * sp * cy + -sr * -sy;
        u[1] = cr * sp * sy + -sr * cy;
        u[2] = cr * cp;
    }
}

/// Convenience version of angle_vectors that returns a tuple (forward, right, up).
pub fn angle_vectors_tuple(angles: &Vec3) -> (Vec3, Vec3, Vec3) {
    let mut forward = [0.0f32; 3];
    let mut right = [0.0f32; 3];
    let mut up = [0.0f32; 3];
    angle_vectors(angles, Some(&mut forward), Some(&mut right), Some(&mut up));
    (forward, right, up)
}

/// Direction vector to Euler angles, without integer truncation.
///
/// Pitch comes back positive when the vector points up (0..360), which is
/// the opposite of the view-angle convention; camera code negates it.
pub fn vectoangles(value: &Vec3) -> Vec3 {
    let yaw;
    let mut pitch;

    if value[1] == 0.0 && value[0] == 0.0 {
        yaw = 0.0;
        pitch = if value[2] > 0.0 { 90.0 } else { 270.0 };
    } else {
        let mut y = value[1].atan2(value[0]) * RAD_TO_DEG;
        if y < 0.0 {
            y += 360.0;
        }
        yaw = y;

        let forward = (value[0] * value[0] + value[1] * value[1]).sqrt();
        pitch = value[2].atan2(forward) * RAD_TO_DEG;
        if pitch < 0.0 {
            pitch += 360.0;
        }
    }

    [pitch, yaw, 0.0]
}

/// Smallest signed difference a - b, wrapped into (-180, 180].
pub fn angle_delta(a: f32, b: f32) -> f32 {
    let mut d = (a - b) % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

// ============================================================
// String helpers
// ============================================================

/// atoi-style parse: leading integer, 0 on garbage.
pub fn q_atoi(s: &str) -> i32 {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    s[..end].parse().unwrap_or(0)
}

/// atof-style parse: 0.0 on garbage.
pub fn q_atof(s: &str) -> f32 {
    s.trim().parse().unwrap_or(0.0)
}

/// Format a float the way the console shows coordinates: trailing zeros and
/// a bare decimal point are stripped.
pub fn com_ftos(f: f32) -> String {
    let mut s = format!("{:.6}", f);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

// ============================================================
// Tests
// ============================================================
