// cl_mouseaccel.rs — mouse acceleration curves
//
// The engine turns a raw mouse delta into a sensitivity multiplier. Speed is
// measured in counts per millisecond, optionally smoothed, and fed through
// one of the curve families selected by m_accel_type.

use qwspec_common::cvar::{CvarContext, CvarError};
use qwspec_common::q_shared::CVAR_ARCHIVE;

/// Most points a custom curve keeps.
pub const MAX_CURVE_POINTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccelType {
    #[default]
    None,
    Classic,
    Linear,
    Natural,
    Jump,
    Motivity,
    Power,
    Custom,
}

impl AccelType {
    pub fn from_value(v: i32) -> Self {
        match v {
            1 => Self::Classic,
            2 => Self::Linear,
            3 => Self::Natural,
            4 => Self::Jump,
            5 => Self::Motivity,
            6 => Self::Power,
            7 => Self::Custom,
            _ => Self::None,
        }
    }
}

/// How a 2D delta becomes one speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMode {
    #[default]
    Euclidean,
    /// Largest of the two axes.
    Max,
}

/// Whether a curve's cap limits the input speed or the output multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapType {
    #[default]
    Output,
    Input,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CurveParseError {
    #[error("curve point \"{0}\" is not x,y")]
    Malformed(String),
    #[error("curve point \"{0}\" is not a number")]
    NotANumber(String),
}

/// Typed snapshot of the m_accel_* cvars.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseAccelConfig {
    pub kind: AccelType,
    pub legacy: bool,
    pub distance_mode: DistanceMode,
    pub cap_type: CapType,
    pub smooth: f64,
    pub smooth_halflife: f64,
    pub senscap: f64,

    // m_accel / m_accel_offset / m_accel_power, also the classic fallbacks
    pub accel: f64,
    pub offset: f64,
    pub power: f64,

    pub classic_offset: f64,
    pub classic_accel: f64,
    pub classic_exponent: f64,
    pub classic_cap: f64,

    pub linear_offset: f64,
    pub linear_accel: f64,
    pub linear_cap: f64,

    pub natural_offset: f64,
    pub natural_accel: f64,
    pub natural_limit: f64,

    pub jump_input: f64,
    pub jump_output: f64,
    pub jump_smooth: f64,

    pub sync_speed: f64,
    pub sync_motivity: f64,
    pub sync_smooth: f64,
    pub sync_gamma: f64,
    pub sync_min: f64,
    pub sync_max: f64,

    pub power_scale: f64,
    pub power_exponent: f64,
    pub power_offset: f64,
    pub power_cap: f64,
}

impl Default for MouseAccelConfig {
    fn default() -> Self {
        Self {
            kind: AccelType::None,
            legacy: false,
            distance_mode: DistanceMode::Euclidean,
            cap_type: CapType::Output,
            smooth: 0.0,
            smooth_halflife: 0.0,
            senscap: 0.0,
            accel: 0.0,
            offset: 0.0,
            power: 2.0,
            classic_offset: 0.0,
            classic_accel: 0.0,
            classic_exponent: 0.0,
            classic_cap: 0.0,
            linear_offset: 0.0,
            linear_accel: 0.0,
            linear_cap: 0.0,
            natural_offset: 0.0,
            natural_accel: 0.1,
            natural_limit: 2.0,
            jump_input: 15.0,
            jump_output: 1.5,
            jump_smooth: 0.5,
            sync_speed: 5.0,
            sync_motivity: 1.5,
            sync_smooth: 0.5,
            sync_gamma: 1.0,
            sync_min: 0.0,
            sync_max: 0.0,
            power_scale: 1.0,
            power_exponent: 0.05,
            power_offset: 0.0,
            power_cap: 0.0,
        }
    }
}

/// (name, default) of every acceleration cvar.
const ACCEL_CVARS: &[(&str, &str)] = &[
    ("m_accel", "0"),
    ("m_accel_offset", "0"),
    ("m_accel_power", "2"),
    ("m_accel_senscap", "0"),
    ("m_accel_type", "0"),
    ("m_accel_legacy", "0"),
    ("m_accel_classic_offset", "0"),
    ("m_accel_classic_accel", "0"),
    ("m_accel_classic_exponent", "0"),
    ("m_accel_classic_cap", "0"),
    ("m_accel_linear_offset", "0"),
    ("m_accel_linear_accel", "0"),
    ("m_accel_linear_cap", "0"),
    ("m_accel_natural_offset", "0"),
    ("m_accel_natural_accel", "0.1"),
    ("m_accel_natural_limit", "2"),
    ("m_accel_jump_input", "15"),
    ("m_accel_jump_output", "1.5"),
    ("m_accel_jump_smooth", "0.5"),
    ("m_accel_sync_speed", "5"),
    ("m_accel_sync_motivity", "1.5"),
    ("m_accel_sync_smooth", "0.5"),
    ("m_accel_sync_gamma", "1"),
    ("m_accel_sync_min", "0"),
    ("m_accel_sync_max", "0"),
    ("m_accel_power_scale", "1"),
    ("m_accel_power_exponent", "0.05"),
    ("m_accel_power_offset", "0"),
    ("m_accel_power_cap", "0"),
    ("m_accel_custom_points", ""),
    ("m_accel_smooth", "0"),
    ("m_accel_smooth_halflife", "0"),
    ("m_accel_cap_type", "0"),
    ("m_accel_distance_mode", "0"),
];

/// Register the acceleration cvars.
pub fn mouse_accel_init(cvars: &mut CvarContext) -> Result<(), CvarError> {
    for (name, default) in ACCEL_CVARS {
        cvars.get(name, default, CVAR_ARCHIVE)?;
    }
    Ok(())
}

impl MouseAccelConfig {
    pub fn from_cvars(cvars: &CvarContext) -> Self {
        let v = |name: &str| cvars.variable_value(name) as f64;
        Self {
            kind: AccelType::from_value(cvars.variable_integer("m_accel_type")),
            legacy: v("m_accel_legacy") != 0.0,
            distance_mode: match cvars.variable_integer("m_accel_distance_mode") {
                2 => DistanceMode::Max,
                // separate axes are measured like euclidean
                _ => DistanceMode::Euclidean,
            },
            cap_type: match cvars.variable_integer("m_accel_cap_type") {
                1 => CapType::Input,
                _ => CapType::Output,
            },
            smooth: v("m_accel_smooth"),
            smooth_halflife: v("m_accel_smooth_halflife"),
            senscap: v("m_accel_senscap"),
            accel: v("m_accel"),
            offset: v("m_accel_offset"),
            power: v("m_accel_power"),
            classic_offset: v("m_accel_classic_offset"),
            classic_accel: v("m_accel_classic_accel"),
            classic_exponent: v("m_accel_classic_exponent"),
            classic_cap: v("m_accel_classic_cap"),
            linear_offset: v("m_accel_linear_offset"),
            linear_accel: v("m_accel_linear_accel"),
            linear_cap: v("m_accel_linear_cap"),
            natural_offset: v("m_accel_natural_offset"),
            natural_accel: v("m_accel_natural_accel"),
            natural_limit: v("m_accel_natural_limit"),
            jump_input: v("m_accel_jump_input"),
            jump_output: v("m_accel_jump_output"),
            jump_smooth: v("m_accel_jump_smooth"),
            sync_speed: v("m_accel_sync_speed"),
            sync_motivity: v("m_accel_sync_motivity"),
            sync_smooth: v("m_accel_sync_smooth"),
            sync_gamma: v("m_accel_sync_gamma"),
            sync_min: v("m_accel_sync_min"),
            sync_max: v("m_accel_sync_max"),
            power_scale: v("m_accel_power_scale"),
            power_exponent: v("m_accel_power_exponent"),
            power_offset: v("m_accel_power_offset"),
            power_cap: v("m_accel_power_cap"),
        }
    }

    fn input_cap(&self, speed: f64, cap: f64) -> f64 {
        if self.cap_type == CapType::Input && cap > 0.0 {
            speed.min(cap)
        } else {
            speed
        }
    }

    fn output_capped(&self, cap: f64) -> bool {
        self.cap_type == CapType::Output && cap > 0.0
    }

    /// Classic parameters, falling back to m_accel/m_accel_offset/m_accel_power
    /// when the per-curve cvars are unset.
    fn classic_params(&self) -> (f64, f64, f64) {
        let pick = |new: f64, old: f64| if new > 0.0 { new } else { old };
        (
            pick(self.classic_offset, self.offset),
            pick(self.classic_accel, self.accel),
            pick(self.classic_exponent, self.power),
        )
    }

    fn classic(&self, speed: f64) -> f64 {
        let cap = self.classic_cap;
        let (offset, accel, exponent) = self.classic_params();
        let speed = self.input_cap(speed, cap);
        if speed <= offset {
            return 1.0;
        }
        let accel_raised = accel.powf(exponent - 1.0);
        let mut base = accel_raised * (speed - offset).powf(exponent) / speed;
        if self.output_capped(cap) && base > cap - 1.0 {
            base = cap - 1.0;
        }
        base + 1.0
    }

    fn linear(&self, speed: f64) -> f64 {
        let cap = self.linear_cap;
        let speed = self.input_cap(speed, cap);
        if speed <= self.linear_offset {
            return 1.0;
        }
        let result = 1.0 + self.linear_accel * (speed - self.linear_offset);
        if self.output_capped(cap) && result > cap {
            cap
        } else {
            result
        }
    }

    fn natural(&self, speed: f64) -> f64 {
        let offset = self.natural_offset;
        if speed <= offset {
            return 1.0;
        }
        // limit is stored as the top multiplier
        let limit = self.natural_limit - 1.0;
        if limit.abs() < 0.001 {
            return 1.0;
        }
        let accel = self.natural_accel / limit.abs();
        let offset_x = offset - speed;
        let decay = (accel * offset_x).exp();

        if self.legacy {
            limit * (1.0 - (offset - decay * offset_x) / speed) + 1.0
        } else {
            let constant = -limit / accel;
            let output = limit * (decay / accel - offset_x) + constant;
            output / speed + 1.0
        }
    }

    fn jump(&self, speed: f64) -> f64 {
        let step_x = self.jump_input;
        let step_y = self.jump_output;
        if !self.legacy && speed <= 0.0 {
            return 1.0;
        }
        if self.jump_smooth <= 0.0 {
            return if speed < step_x { 1.0 } else { step_y };
        }

        let k = 10.0 / (self.jump_smooth * step_x);
        if self.legacy {
            let sigmoid = 1.0 / (1.0 + (k * (step_x - speed)).exp());
            return 1.0 + (step_y - 1.0) * sigmoid;
        }

        // integral of the sigmoid, anchored so zero speed is 1.0
        let softplus = |x: f64| {
            let z = k * (x - step_x);
            (z.max(0.0) + (-z.abs()).exp().ln_1p()) / k
        };
        1.0 + (step_y - 1.0) * (softplus(speed) - softplus(0.0)) / speed
    }

    fn motivity(&self, speed: f64) -> f64 {
        let syncspeed = self.sync_speed;
        let motivity = self.sync_motivity;
        if syncspeed <= 0.0 || motivity <= 0.0 || motivity == 1.0 {
            return 1.0;
        }
        if speed <= 0.0 || speed == syncspeed {
            return 1.0;
        }

        let log_motivity = motivity.ln();
        let gamma_const = self.sync_gamma / log_motivity;
        let sharpness = if self.sync_smooth == 0.0 {
            16.0
        } else {
            0.5 / self.sync_smooth
        };
        let log_diff = speed.ln() - syncspeed.ln();

        if sharpness >= 16.0 {
            let log_space = gamma_const * log_diff;
            if log_space < -1.0 {
                return 1.0 / motivity;
            }
            if log_space > 1.0 {
                return motivity;
            }
            return (log_space * log_motivity).exp();
        }

        let log_space = gamma_const * log_diff.abs();
        let magnitude = log_space.powf(sharpness).tanh().powf(1.0 / sharpness);
        let exponent = if log_diff > 0.0 { magnitude } else { -magnitude };

        let mut result = (exponent * log_motivity).exp();
        if self.sync_min > 0.0 && result < self.sync_min {
            result = self.sync_min;
        }
        if self.sync_max > 0.0 && result > self.sync_max {
            result = self.sync_max;
        }
        result
    }

    fn power(&self, speed: f64) -> f64 {
        if speed <= 0.0 {
            return 1.0;
        }
        let cap = self.power_cap;
        let speed = self.input_cap(speed, cap);
        let offset = self.power_offset;
        if offset > 0.0 && speed <= offset {
            return 1.0;
        }

        let n = self.power_exponent;
        let mut result = (self.power_scale * speed).powf(n);
        if offset > 0.0 {
            let constant = offset * n / (n + 1.0);
            result += constant / speed;
        }
        if self.output_capped(cap) && result > cap {
            result = cap;
        }
        result
    }
}

/// Piecewise-linear multiplier curve, sorted by speed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomCurve {
    points: Vec<(f64, f64)>,
}

fn parse_point(token: &str) -> Result<(f64, f64), CurveParseError> {
    let (x, y) = token
        .split_once(',')
        .ok_or_else(|| CurveParseError::Malformed(token.to_string()))?;
    let num = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|_| CurveParseError::NotANumber(token.to_string()))
    };
    Ok((num(x)?, num(y)?))
}

impl CustomCurve {
    /// Parse `"x,y;x,y;..."`. Bad points are skipped.
    pub fn parse(text: &str) -> Self {
        let mut points = Vec::new();
        let mut rejected = 0;

        for token in text.split(';').filter(|t| !t.trim().is_empty()) {
            if points.len() >= MAX_CURVE_POINTS {
                break;
            }
            match parse_point(token) {
                Ok(p) => points.push(p),
                Err(e) => {
                    rejected += 1;
                    tracing::debug!("m_accel_custom_points: {}", e);
                }
            }
        }
        if rejected > 0 {
            tracing::debug!(rejected, "custom accel curve had unusable points");
        }

        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Interpolated multiplier, clamped to the end points.
    pub fn evaluate(&self, speed: f64) -> f64 {
        if self.points.len() < 2 {
            return 1.0;
        }
        for w in self.points.windows(2) {
            let ((x0, y0), (x1, y1)) = (w[0], w[1]);
            if speed >= x0 && speed <= x1 {
                if x1 == x0 {
                    return y0;
                }
                let t = (speed - x0) / (x1 - x0);
                return y0 + t * (y1 - y0);
            }
        }
        match (self.points.first(), self.points.last()) {
            (Some(&(x0, y0)), _) if speed < x0 => y0,
            (_, Some(&(_, y))) => y,
            _ => 1.0,
        }
    }
}

/// Per-session acceleration state.
#[derive(Debug, Clone, Default)]
pub struct MouseAccel {
    smoothed_speed: f64,
    /// Speed used by the last calculation, after smoothing.
    pub last_speed: f64,
    pub curve: CustomCurve,
}

impl MouseAccel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_custom_curve(&mut self, text: &str) {
        self.curve = CustomCurve::parse(text);
    }

    /// Counts per millisecond.
    pub fn speed(cfg: &MouseAccelConfig, mx: f64, my: f64, frametime: f64) -> f64 {
        if frametime <= 0.0 {
            return 0.0;
        }
        let dist = match cfg.distance_mode {
            DistanceMode::Max => mx.abs().max(my.abs()),
            DistanceMode::Euclidean => (mx * mx + my * my).sqrt(),
        };
        dist / (1000.0 * frametime)
    }

    fn smooth(&mut self, cfg: &MouseAccelConfig, speed: f64, frametime: f64) -> f64 {
        if cfg.smooth <= 0.0 && cfg.smooth_halflife <= 0.0 {
            return speed;
        }
        let alpha = if cfg.smooth_halflife > 0.0 {
            let decay = (-std::f64::consts::LN_2 * frametime * 1000.0 / cfg.smooth_halflife).exp();
            1.0 - decay
        } else {
            cfg.smooth
        };
        let alpha = alpha.clamp(0.0, 1.0);
        self.smoothed_speed = self.smoothed_speed * (1.0 - alpha) + speed * alpha;
        self.smoothed_speed
    }

    /// Sensitivity multiplier for one mouse delta.
    pub fn multiplier(&mut self, cfg: &MouseAccelConfig, mx: f64, my: f64, frametime: f64) -> f64 {
        if cfg.kind == AccelType::Classic && cfg.accel <= 0.0 && cfg.classic_accel <= 0.0 {
            return 1.0;
        }

        let speed = Self::speed(cfg, mx, my, frametime);
        let speed = self.smooth(cfg, speed, frametime);
        self.last_speed = speed;

        match cfg.kind {
            AccelType::None => 1.0,
            AccelType::Classic => cfg.classic(speed),
            AccelType::Linear => cfg.linear(speed),
            AccelType::Natural => cfg.natural(speed),
            AccelType::Jump => cfg.jump(speed),
            AccelType::Motivity => cfg.motivity(speed),
            AccelType::Power => cfg.power(speed),
            AccelType::Custom => self.curve.evaluate(speed),
        }
    }

    /// Total scale applied to a mouse delta: sensitivity times the curve,
    /// limited by m_accel_senscap. With no curve selected, a positive
    /// m_accel selects the old quadratic acceleration.
    pub fn scale(
        &mut self,
        cfg: &MouseAccelConfig,
        mx: f64,
        my: f64,
        frametime: f64,
        sensitivity: f64,
    ) -> f64 {
        if cfg.kind == AccelType::None {
            if cfg.accel <= 0.0 || frametime <= 0.0 {
                return sensitivity;
            }
            let mut accelsens = sensitivity;
            let speed = (mx * mx + my * my).sqrt() / (1000.0 * frametime) - cfg.offset;
            if speed > 0.0 {
                let speed = speed * cfg.accel;
                if cfg.power > 1.0 {
                    accelsens += ((cfg.power - 1.0) * speed.ln()).exp();
                } else {
                    accelsens = 1.0;
                }
            }
            if cfg.senscap > 0.0 && accelsens > cfg.senscap {
                accelsens = cfg.senscap;
            }
            return accelsens;
        }

        let mut m = self.multiplier(cfg, mx, my, frametime);
        if cfg.senscap > 0.0 && sensitivity > 0.0 && sensitivity * m > cfg.senscap {
            m = cfg.senscap / sensitivity;
        }
        sensitivity * m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_cfg(kind: AccelType) -> MouseAccelConfig {
        MouseAccelConfig {
            kind,
            ..MouseAccelConfig::default()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_speed_modes() {
        let mut cfg = make_cfg(AccelType::Linear);
        // 3-4-5 over 1 ms
        assert!(close(MouseAccel::speed(&cfg, 3.0, 4.0, 0.001), 5.0));
        cfg.distance_mode = DistanceMode::Max;
        assert!(close(MouseAccel::speed(&cfg, 3.0, -4.0, 0.001), 4.0));
        assert_eq!(MouseAccel::speed(&cfg, 3.0, 4.0, 0.0), 0.0);
    }

    #[test]
    fn test_classic_without_accel_is_identity() {
        let cfg = make_cfg(AccelType::Classic);
        let mut accel = MouseAccel::new();
        assert_eq!(accel.multiplier(&cfg, 500.0, 0.0, 0.001), 1.0);
        assert_eq!(accel.last_speed, 0.0);
    }

    #[test]
    fn test_classic_formula() {
        let mut cfg = make_cfg(AccelType::Classic);
        cfg.classic_accel = 0.5;
        cfg.classic_exponent = 2.0;
        cfg.classic_offset = 1.0;
        // 0.5^1 * (5-1)^2 / 5 + 1 = 2.6
        assert!(close(cfg.classic(5.0), 2.6));
        assert_eq!(cfg.classic(0.5), 1.0);

        cfg.classic_cap = 2.0;
        assert!(close(cfg.classic(5.0), 2.0));
        cfg.cap_type = CapType::Input;
        cfg.classic_cap = 3.0;
        // speed capped to 3: 0.5 * 4 / 3 + 1
        assert!(close(cfg.classic(5.0), 0.5 * 4.0 / 3.0 + 1.0));
    }

    #[test]
    fn test_classic_falls_back_to_old_cvars() {
        let mut cfg = make_cfg(AccelType::Classic);
        cfg.accel = 0.5;
        cfg.power = 2.0;
        assert!(close(cfg.classic(4.0), 0.5 * 16.0 / 4.0 + 1.0));
    }

    #[test]
    fn test_linear() {
        let mut cfg = make_cfg(AccelType::Linear);
        cfg.linear_accel = 0.1;
        cfg.linear_offset = 2.0;
        assert_eq!(cfg.linear(1.0), 1.0);
        assert!(close(cfg.linear(12.0), 2.0));
        cfg.linear_cap = 1.5;
        assert!(close(cfg.linear(12.0), 1.5));
    }

    #[test]
    fn test_natural_approaches_limit() {
        let mut cfg = make_cfg(AccelType::Natural);
        cfg.natural_limit = 2.0;
        cfg.natural_accel = 0.5;
        for legacy in [true, false] {
            cfg.legacy = legacy;
            assert_eq!(cfg.natural(0.0), 1.0);
            let low = cfg.natural(1.0);
            let high = cfg.natural(1000.0);
            assert!(low > 1.0 && low < high);
            assert!(high <= 2.0 + 1e-9);
            assert!(high > 1.9);
        }
        cfg.natural_limit = 1.0;
        assert_eq!(cfg.natural(10.0), 1.0);
    }

    #[test]
    fn test_jump_step_and_smooth() {
        let mut cfg = make_cfg(AccelType::Jump);
        cfg.jump_input = 10.0;
        cfg.jump_output = 2.0;
        cfg.jump_smooth = 0.0;
        assert_eq!(cfg.jump(9.9), 1.0);
        assert_eq!(cfg.jump(10.0), 2.0);

        cfg.jump_smooth = 0.5;
        cfg.legacy = true;
        assert!(close(cfg.jump(10.0), 1.5));
        assert!(cfg.jump(100.0) > 1.99);

        cfg.legacy = false;
        assert_eq!(cfg.jump(0.0), 1.0);
        let mid = cfg.jump(10.0);
        let far = cfg.jump(1000.0);
        assert!(mid > 1.0 && mid < far);
        assert!(far < 2.0);
    }

    #[test]
    fn test_motivity_is_symmetric_in_log_space() {
        let mut cfg = make_cfg(AccelType::Motivity);
        cfg.sync_speed = 5.0;
        cfg.sync_motivity = 2.0;
        cfg.sync_smooth = 0.0;
        assert_eq!(cfg.motivity(5.0), 1.0);
        assert!(close(cfg.motivity(500.0), 2.0));
        assert!(close(cfg.motivity(0.05), 0.5));
        let up = cfg.motivity(10.0);
        let down = cfg.motivity(2.5);
        assert!(close(up * down, 1.0));

        cfg.sync_smooth = 0.5;
        let up = cfg.motivity(10.0);
        assert!(up > 1.0 && up < 2.0);
        cfg.sync_max = 1.1;
        assert!(close(cfg.motivity(1000.0), 1.1));
    }

    #[test]
    fn test_power() {
        let mut cfg = make_cfg(AccelType::Power);
        cfg.power_scale = 1.0;
        cfg.power_exponent = 0.5;
        assert!(close(cfg.power(4.0), 2.0));
        assert_eq!(cfg.power(0.0), 1.0);
        cfg.power_offset = 2.0;
        assert_eq!(cfg.power(1.0), 1.0);
        // 4^0.5 + (2 * 0.5 / 1.5) / 4
        assert!(close(cfg.power(4.0), 2.0 + (2.0 * 0.5 / 1.5) / 4.0));
        cfg.power_cap = 1.5;
        assert!(close(cfg.power(4.0), 1.5));
    }

    #[test]
    fn test_custom_curve_parse_and_evaluate() {
        let curve = CustomCurve::parse("10,2; 0,1 ;junk;5,x;20,3");
        assert_eq!(curve.points(), &[(0.0, 1.0), (10.0, 2.0), (20.0, 3.0)]);
        assert!(close(curve.evaluate(5.0), 1.5));
        assert!(close(curve.evaluate(15.0), 2.5));
        assert_eq!(curve.evaluate(-1.0), 1.0);
        assert_eq!(curve.evaluate(99.0), 3.0);
    }

    #[test]
    fn test_custom_curve_needs_two_points() {
        assert_eq!(CustomCurve::parse("").evaluate(5.0), 1.0);
        assert_eq!(CustomCurve::parse("1,4").evaluate(5.0), 1.0);
    }

    #[test]
    fn test_custom_curve_point_limit() {
        let text: Vec<String> = (0..150).map(|i| format!("{},1", i)).collect();
        let curve = CustomCurve::parse(&text.join(";"));
        assert_eq!(curve.len(), MAX_CURVE_POINTS);
    }

    #[test]
    fn test_parse_point_errors() {
        assert!(matches!(parse_point("3"), Err(CurveParseError::Malformed(_))));
        assert!(matches!(parse_point("a,1"), Err(CurveParseError::NotANumber(_))));
    }

    #[test]
    fn test_smoothing_alpha() {
        let mut cfg = make_cfg(AccelType::Linear);
        cfg.linear_accel = 1.0;
        cfg.smooth = 0.5;
        let mut accel = MouseAccel::new();
        accel.multiplier(&cfg, 10.0, 0.0, 0.001);
        assert!(close(accel.last_speed, 5.0));
        accel.multiplier(&cfg, 10.0, 0.0, 0.001);
        assert!(close(accel.last_speed, 7.5));
    }

    #[test]
    fn test_smoothing_halflife() {
        let mut cfg = make_cfg(AccelType::Linear);
        cfg.linear_accel = 1.0;
        cfg.smooth_halflife = 1.0;
        let mut accel = MouseAccel::new();
        // one half-life per 1 ms frame
        accel.multiplier(&cfg, 8.0, 0.0, 0.001);
        assert!(close(accel.last_speed, 4.0));
    }

    #[test]
    fn test_scale_applies_senscap() {
        let mut cfg = make_cfg(AccelType::Linear);
        cfg.linear_accel = 1.0;
        cfg.senscap = 6.0;
        let mut accel = MouseAccel::new();
        // speed 10 => multiplier 11, capped to 6/3
        let s = accel.scale(&cfg, 10.0, 0.0, 0.001, 3.0);
        assert!(close(s, 6.0));
    }

    #[test]
    fn test_scale_without_curve() {
        let mut cfg = make_cfg(AccelType::None);
        let mut accel = MouseAccel::new();
        assert_eq!(accel.scale(&cfg, 10.0, 0.0, 0.001, 3.0), 3.0);

        cfg.accel = 0.1;
        cfg.power = 2.0;
        // (10 * 0.1)^1 added
        assert!(close(accel.scale(&cfg, 10.0, 0.0, 0.001, 3.0), 4.0));
    }

    #[test]
    fn test_config_from_cvars() {
        let mut cvars = CvarContext::new();
        mouse_accel_init(&mut cvars).unwrap();
        let cfg = MouseAccelConfig::from_cvars(&cvars);
        assert_eq!(cfg.kind, AccelType::None);
        assert_eq!(cfg.power, 2.0);
        assert_eq!(cfg.jump_output, 1.5);
        assert!((cfg.natural_accel - 0.1).abs() < 1e-6);

        cvars.set("m_accel_type", "5").unwrap();
        cvars.set("m_accel_cap_type", "1").unwrap();
        cvars.set("m_accel_distance_mode", "2").unwrap();
        let cfg = MouseAccelConfig::from_cvars(&cvars);
        assert_eq!(cfg.kind, AccelType::Motivity);
        assert_eq!(cfg.cap_type, CapType::Input);
        assert_eq!(cfg.distance_mode, DistanceMode::Max);
    }
}
