// cl_cam.rs — spectator camera
//
// Player tracking
// autocam 0 = none, 1 = free fly, 2 = track
//
// Every outgoing command runs cam_track (pick the target, find a vantage,
// move the camera) and then cam_finish_move (attack/jump/move-down edges).
// All time checks read cls.realtime.

use qwspec_common::cmd::CmdContext;
use qwspec_common::common::com_printf;
use qwspec_common::cvar::{CvarContext, CvarError};
use qwspec_common::q_shared::{
    angle_delta, vector_compare, vector_length, vector_subtract, vectoangles, Buttons, UserCmd,
    Vec3, CVAR_ARCHIVE, MAX_CLIENTS, PITCH, YAW,
};

use crate::cl_flyby::{find_flyby, is_visible};
use crate::cl_multiview::Multiview;
use crate::cl_trace::TraceOracle;
use crate::client::{ClientState, ClientStatic, ConnState};

/// Wait after a map change before trying to retrack.
pub const RETRACK_GRACE: f64 = 2.0;
pub const RETRACK_INTERVAL: f64 = 0.5;
/// Give up on the old target this long after the first failed attempt.
pub const RETRACK_TIMEOUT: f64 = 10.0;
/// Vantage re-search throttle while locked.
pub const VIEW_SEARCH_INTERVAL: f64 = 0.1;
pub const MVD_RELOCK_INTERVAL: f64 = 0.1;
pub const TRYLOCK_TIMEOUT: f64 = 0.3;
const TRYLOCK_ANGLE: f32 = 2.0;
const TRYLOCK_DIST: f32 = 200.0;
/// Orbit mode only teleports when the vantage moved further than this.
const ORBIT_TMOVE_DIST: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CamMode {
    #[default]
    None,
    FreeFly,
    Track,
}

impl CamMode {
    /// Next mode on an attack press; None once past Track.
    pub fn next(self) -> Option<CamMode> {
        match self {
            CamMode::None => Some(CamMode::FreeFly),
            CamMode::FreeFly => Some(CamMode::Track),
            CamMode::Track => None,
        }
    }
}

/// Camera cvars, read once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CamConfig {
    /// cl_hightrack: follow the top fragger.
    pub hightrack: bool,
    /// cl_chasecam: through the tracked player's eyes instead of orbiting.
    pub chasecam: bool,
    /// cam_thirdperson: chase position but own view angles.
    pub thirdperson: bool,
}

impl Default for CamConfig {
    fn default() -> Self {
        Self {
            hightrack: false,
            chasecam: true,
            thirdperson: false,
        }
    }
}

impl CamConfig {
    pub fn from_cvars(cvars: &CvarContext) -> Self {
        Self {
            hightrack: cvars.variable_integer("cl_hightrack") != 0,
            chasecam: cvars.variable_integer("cl_chasecam") != 0,
            thirdperson: cvars.variable_integer("cam_thirdperson") != 0,
        }
    }

    pub fn first_person(&self) -> bool {
        self.chasecam && !self.thirdperson
    }
}

/// Register the camera cvars.
pub fn cam_init(cvars: &mut CvarContext) -> Result<(), CvarError> {
    cvars.get("cl_hightrack", "0", 0)?;
    cvars.get("cl_chasecam", "1", CVAR_ARCHIVE)?;
    cvars.get("cam_thirdperson", "0", CVAR_ARCHIVE)?;
    cvars.get("mvd_autotrack", "0", 0)?;
    cvars.get("demo_autotrack", "0", 0)?;
    Ok(())
}

/// Pending attempt to follow the same player again after a map change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoRetrackRequest {
    pub target_slot: usize,
    pub next_attempt_time: f64,
    /// Set by the first attempt that found the target stale.
    pub first_attempt_time: Option<f64>,
}

/// Everything a camera tick reads or writes besides its own state.
pub struct CamEnv<'a> {
    pub cls: &'a mut ClientStatic,
    pub cl: &'a mut ClientState,
    pub cbuf: &'a mut CmdContext,
    pub multiview: &'a mut dyn Multiview,
    pub world: &'a dyn TraceOracle,
    pub config: CamConfig,
}

#[derive(Debug, Clone, Default)]
pub struct CameraTrackState {
    pub mode: CamMode,
    pub tracked_slot: usize,
    /// A vantage was found and is still visible.
    pub locked: bool,
    /// Slot the policies want; cycling starts from here.
    pub ideal_slot: usize,
    pub last_lock_time: f64,
    pub last_view_time: f64,
    /// Only meaningful while locked.
    pub desired_position: Vec3,
    pub retrack: Option<AutoRetrackRequest>,
    /// Slot the server was last told to follow with ptrack.
    pub server_track: Option<usize>,
    /// Who killed the player we were watching.
    pub killer: Option<usize>,

    oldbuttons: Buttons,
    cmddown: bool,
    olddown: bool,
    last_trylock_time: f64,
}

impl CameraTrackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.mode = CamMode::None;
        self.tracked_slot = 0;
        self.ideal_slot = 0;
        self.locked = false;
    }

    // ========================================================
    // Lock / unlock
    // ========================================================

    /// Start following `slot`. The vantage is searched on the next track
    /// tick, so the lock is not confirmed yet.
    pub fn lock(&mut self, env: &mut CamEnv, slot: usize) {
        if env.cbuf.cmd_find_alias("f_trackspectate").is_some() {
            env.cbuf.cbuf_add_text("f_trackspectate\n");
        }

        env.cls.netchan.write_string_cmd(&format!("ptrack {}", slot));
        self.server_track = Some(slot);

        if env.multiview.enabled() {
            env.multiview.set_track_slot(None, Some(slot));
        }
        if env.cls.playback.is_mvd() {
            self.ideal_slot = slot;
        }

        self.last_lock_time = env.cls.realtime;
        self.tracked_slot = slot;
        self.locked = false;
        tracing::debug!(slot, time = env.cls.realtime, "camera lock");
    }

    /// Hand control back to the player. Does nothing when already off.
    pub fn unlock(&mut self, env: &mut CamEnv) {
        if self.mode == CamMode::None {
            return;
        }

        if env.cbuf.cmd_find_alias("f_freeflyspectate").is_some() {
            env.cbuf.cbuf_add_text("f_freeflyspectate\n");
        }

        env.cls.netchan.write_string_cmd("ptrack");
        self.server_track = None;
        self.mode = CamMode::None;
        self.locked = false;
        tracing::debug!(time = env.cls.realtime, "camera unlock");
    }

    // ========================================================
    // Selection policies
    // ========================================================

    /// Move to the top fragger when unlocked or strictly out-fragged.
    pub fn check_high_target(&mut self, env: &mut CamEnv) {
        let Some(best) = env.cl.highest_fragger() else {
            self.unlock(env);
            return;
        };

        if self.locked && env.cl.players[best].frags <= env.cl.players[self.tracked_slot].frags {
            return;
        }
        // server already follows them, the vantage search just has not
        // succeeded yet
        if self.tracked_slot == best && self.server_track == Some(best) {
            return;
        }

        self.lock(env, best);
        self.ideal_slot = best;
    }

    /// Remember the tracked player across a map change.
    pub fn init_auto_retrack(&mut self, spectator: bool, now: f64) {
        if !spectator || self.mode != CamMode::Track || self.tracked_slot >= MAX_CLIENTS {
            return;
        }
        self.retrack = Some(AutoRetrackRequest {
            target_slot: self.tracked_slot,
            next_attempt_time: now + RETRACK_GRACE,
            first_attempt_time: None,
        });
        tracing::debug!(slot = self.tracked_slot, "retrack scheduled");
    }

    fn auto_retrack(&mut self, env: &mut CamEnv) {
        let Some(mut req) = self.retrack else {
            return;
        };
        let now = env.cls.realtime;
        if now < req.next_attempt_time {
            return;
        }

        // something else already locked on
        if self.mode == CamMode::Track && self.locked {
            self.retrack = None;
            return;
        }

        let target = req.target_slot;
        if env.cl.is_fresh(target) && env.cl.is_valid_target(target) {
            self.retrack = None;
            self.mode = CamMode::Track;
            self.lock(env, target);
            self.ideal_slot = target;
            return;
        }

        req.next_attempt_time = now + RETRACK_INTERVAL;
        let first = *req.first_attempt_time.get_or_insert(now);
        if now - first <= RETRACK_TIMEOUT {
            self.retrack = Some(req);
            return;
        }

        self.retrack = None;
        match env.cl.first_trackable() {
            Some(slot) => {
                tracing::info!(old_slot = target, slot, "retrack timed out, following first player");
                self.mode = CamMode::Track;
                self.lock(env, slot);
                self.ideal_slot = slot;
            }
            None => {
                com_printf("Auto-retrack: no players to track\n");
                self.unlock(env);
            }
        }
    }

    // ========================================================
    // Per-command tick
    // ========================================================

    /// Take over the command when tracking.
    pub fn cam_track(&mut self, env: &mut CamEnv, cmd: &mut UserCmd) {
        if !env.cl.spectator {
            return;
        }

        self.auto_retrack(env);

        self.cmddown = cmd.upmove < 0;

        if env.cls.state != ConnState::Active || self.mode != CamMode::Track {
            return;
        }

        let Some(slot) = self.resolve_target(env) else {
            return;
        };
        if !self.resolve_vantage(env, slot) {
            return;
        }
        self.emit_command(env, slot, cmd);
    }

    fn resolve_target(&mut self, env: &mut CamEnv) -> Option<usize> {
        if env.config.hightrack && !self.locked {
            self.check_high_target(env);
        }
        if self.mode != CamMode::Track {
            return None;
        }

        if self.locked && !env.cl.is_valid_target(self.tracked_slot) {
            tracing::debug!(slot = self.tracked_slot, "tracked player gone");
            self.locked = false;
            if env.config.hightrack {
                self.check_high_target(env);
            } else {
                self.unlock(env);
            }
            return None;
        }

        if env.cls.playback.is_mvd() {
            self.mvd_relock(env);
        }

        if !env.cl.is_valid_target(self.tracked_slot) {
            return None;
        }
        Some(self.tracked_slot)
    }

    fn mvd_relock(&mut self, env: &mut CamEnv) {
        let now = env.cls.realtime;
        if self.ideal_slot != self.tracked_slot
            && now - self.last_lock_time > MVD_RELOCK_INTERVAL
            && env.cl.is_current(self.ideal_slot)
        {
            self.lock(env, self.ideal_slot);
        }

        // a target missing from one frame is kept; two frames and it's gone
        let main = self.main_track_num(&*env.multiview);
        if env.cl.is_fresh(self.tracked_slot) && main == Some(self.ideal_slot) {
            return;
        }

        let found = (0..MAX_CLIENTS).find(|&i| env.cl.is_fresh(i) && env.cl.is_valid_target(i));
        match found {
            Some(slot) => {
                env.cls.findtrack = false;
                self.lock(env, slot);
            }
            None => env.cls.findtrack = true,
        }
    }

    /// Keep or find a vantage; returns whether the camera is locked.
    fn resolve_vantage(&mut self, env: &mut CamEnv, slot: usize) -> bool {
        let now = env.cls.realtime;
        let target = *env.cl.player_state(slot);

        if self.locked && is_visible(env.world, &target.origin, &self.desired_position) {
            self.last_view_time = now;
            return true;
        }
        if self.locked && now - self.last_view_time <= VIEW_SEARCH_INTERVAL {
            return true;
        }

        let self_origin = env.cl.self_origin();
        let found = find_flyby(env.world, &self_origin, &target.origin, &target.viewangles, true)
            .or_else(|| find_flyby(env.world, &self_origin, &target.origin, &target.viewangles, false));
        self.last_view_time = now;

        match found {
            Some(fly) => {
                if !self.locked {
                    tracing::debug!(slot, candidate = fly.candidate, distance = fly.distance, "vantage found");
                }
                self.locked = true;
                self.desired_position = fly.position;
            }
            None => {
                if self.locked {
                    tracing::debug!(slot, "vantage lost");
                }
                self.locked = false;
            }
        }
        self.locked
    }

    fn emit_command(&mut self, env: &mut CamEnv, slot: usize, cmd: &mut UserCmd) {
        let player = *env.cl.player_state(slot);
        let self_origin = env.cl.self_origin();

        cmd.clear_movement();

        if env.config.chasecam {
            if !env.config.thirdperson {
                env.cl.viewangles = player.viewangles;
            }
            self.desired_position = player.origin;
            if !vector_compare(&self.desired_position, &self_origin) {
                env.cls.netchan.write_tmove(self.desired_position);
                env.cl.set_self_origin(self.desired_position);
            }
        } else {
            let vec = vector_subtract(&self.desired_position, &self_origin);
            if vector_length(&vec) > ORBIT_TMOVE_DIST {
                env.cls.netchan.write_tmove(self.desired_position);
            }
            env.cl.set_self_origin(self.desired_position);

            let mut angles = vectoangles(&vector_subtract(&player.origin, &self.desired_position));
            angles[PITCH] = angle_delta(0.0, angles[PITCH]);
            env.cl.viewangles = angles;
        }
        env.cl.simorg = self.desired_position;
    }

    // ========================================================
    // Button handling
    // ========================================================

    fn jump_check(&mut self, cmd: &UserCmd) -> bool {
        if !cmd.buttons.contains(Buttons::JUMP) {
            self.oldbuttons.remove(Buttons::JUMP);
            return false;
        }
        if self.oldbuttons.contains(Buttons::JUMP) {
            return false; // don't pogo stick
        }
        self.oldbuttons.insert(Buttons::JUMP);
        true
    }

    fn move_down_check(&mut self) -> bool {
        if !self.cmddown {
            self.olddown = false;
            return false;
        }
        if self.olddown {
            return false;
        }
        self.olddown = true;
        true
    }

    /// First valid target scanning from `start` in steps of `inc`, wrapping.
    /// During MVD playback only players in the current frame qualify.
    pub fn cycle_from(cls: &ClientStatic, cl: &ClientState, start: usize, inc: i32) -> Option<usize> {
        let n = MAX_CLIENTS as i32;
        let mut i = start as i32 % n;
        for _ in 0..MAX_CLIENTS {
            let slot = i as usize;
            if cl.is_valid_target(slot) && (!cls.playback.is_mvd() || cl.is_current(slot)) {
                return Some(slot);
            }
            i = (i + inc).rem_euclid(n);
        }
        None
    }

    /// Step the tracked player forward (inc 1) or back (inc -1).
    pub fn cycle_target(&mut self, env: &mut CamEnv, inc: i32) -> Option<usize> {
        let n = MAX_CLIENTS as i32;
        let start = if self.locked {
            (self.ideal_slot as i32 + inc).rem_euclid(n) as usize
        } else {
            self.ideal_slot
        };
        let slot = Self::cycle_from(env.cls, env.cl, start, inc)?;
        self.lock(env, slot);
        self.ideal_slot = slot;
        Some(slot)
    }

    /// Attack cycles the mode; jump / move-down cycle the tracked player.
    pub fn cam_finish_move(&mut self, env: &mut CamEnv, cmd: &mut UserCmd) {
        if env.cls.state != ConnState::Active || !env.cl.spectator {
            return;
        }

        let mut pressed = false;
        if cmd.buttons.contains(Buttons::ATTACK) {
            if self.oldbuttons.contains(Buttons::ATTACK) {
                return;
            }
            self.oldbuttons.insert(Buttons::ATTACK);
            match self.mode.next() {
                Some(CamMode::Track) => {
                    self.mode = CamMode::Track;
                    pressed = true;
                }
                Some(mode) => {
                    self.mode = mode;
                    tracing::debug!(?mode, "camera mode");
                    return;
                }
                None => {
                    self.unlock(env);
                    cmd.angles = env.cl.viewangles;
                    return;
                }
            }
        } else {
            self.oldbuttons.remove(Buttons::ATTACK);
            if self.mode != CamMode::Track {
                return;
            }
        }

        if env.config.hightrack {
            self.check_high_target(env);
            if self.jump_check(cmd) {
                com_printf("cl_hightrack enabled. Unable to switch POV.\n");
            }
            return;
        }

        let jump = self.jump_check(cmd);
        let down = self.move_down_check();
        let inc = if down { -1 } else { 1 };

        if self.locked {
            if !jump && !down {
                return;
            }
            env.multiview.tracking_adjustment(inc);
        } else if !pressed
            && env.cl.is_valid_target(self.tracked_slot)
            && self.server_track == Some(self.tracked_slot)
        {
            // still searching a vantage for the current target
            return;
        }

        if self.cycle_target(env, inc).is_some() {
            return;
        }

        // stay on same guy?
        if env.cl.is_valid_target(self.ideal_slot) {
            let slot = self.ideal_slot;
            self.lock(env, slot);
            return;
        }

        com_printf("No target found ...\n");
        self.mode = CamMode::None;
        self.locked = false;
    }

    /// Demo playback: work out who the recording spectator was following by
    /// matching their view against each player's own command.
    pub fn cam_try_lock(&mut self, cls: &ClientStatic, cl: &ClientState) {
        if cl.validsequence == 0 {
            return;
        }
        if self.mode == CamMode::None {
            self.last_trylock_time = 0.0;
        }

        let old = (self.mode, self.tracked_slot);
        let me = cl.self_origin();

        for i in 0..MAX_CLIENTS {
            if !cl.is_valid_target(i) || !cl.is_current(i) {
                continue;
            }
            let state = cl.player_state(i);
            let pitch = angle_delta(state.command.angles[PITCH], cl.viewangles[PITCH]).abs();
            let yaw = angle_delta(state.command.angles[YAW], cl.viewangles[YAW]).abs();
            if pitch >= TRYLOCK_ANGLE || yaw >= TRYLOCK_ANGLE {
                continue;
            }
            if (0..3).any(|j| (state.origin[j] - me[j]).abs() > TRYLOCK_DIST) {
                continue; // too far
            }
            self.mode = CamMode::Track;
            self.tracked_slot = i;
            self.locked = true;
            self.last_trylock_time = cls.realtime;
            break;
        }

        if cls.realtime - self.last_trylock_time > TRYLOCK_TIMEOUT {
            // nobody matched for a while: the recorder went free flying
            self.mode = CamMode::FreeFly;
            self.tracked_slot = 0;
            self.locked = false;
        }

        if (self.mode, self.tracked_slot) != old {
            tracing::debug!(mode = ?self.mode, slot = self.tracked_slot, "demo camera changed");
        }
    }

    // ========================================================
    // Queries
    // ========================================================

    fn is_following(&self) -> bool {
        self.mode == CamMode::Track && self.locked
    }

    /// True when the camera writes the view angles itself, so mouse look
    /// would only be overwritten.
    pub fn controls_view(&self, cl: &ClientState, config: &CamConfig) -> bool {
        cl.spectator && self.is_following() && !(config.chasecam && config.thirdperson)
    }

    /// Slot the view is rendered from.
    pub fn set_view_player(&self, cl: &mut ClientState, config: &CamConfig) {
        cl.viewplayernum = if cl.spectator && self.is_following() && config.chasecam {
            self.tracked_slot
        } else {
            cl.playernum
        };
    }

    pub fn draw_view_model(&self, cl: &ClientState, config: &CamConfig) -> bool {
        if !cl.spectator {
            return true;
        }
        self.is_following() && config.chasecam
    }

    /// False for the player whose eyes we are looking through.
    pub fn draw_player(&self, cl: &ClientState, config: &CamConfig, playernum: usize) -> bool {
        !(cl.spectator && self.is_following() && self.tracked_slot == playernum && config.first_person())
    }

    /// Tracked player, or None when not in track mode.
    pub fn track_num(&self) -> Option<usize> {
        (self.mode == CamMode::Track).then_some(self.tracked_slot)
    }

    /// Player shown in the main view.
    pub fn main_track_num(&self, multiview: &dyn Multiview) -> Option<usize> {
        if multiview.inset_enabled() {
            return multiview.main_view();
        }
        self.track_num()
    }

    pub fn who_is_spectated(&self, cl: &ClientState) -> Option<usize> {
        if cl.spectator && self.mode == CamMode::Track && cl.players[self.tracked_slot].is_active() {
            Some(self.tracked_slot)
        } else {
            None
        }
    }

    /// Remember the killer when the followed player dies. In orbit mode the
    /// view stays on our own slot, so the tracked slot decides.
    pub fn set_killer(&mut self, cl: &ClientState, killer: usize, victim: usize) {
        let watched = if self.mode == CamMode::Track {
            self.tracked_slot
        } else {
            cl.viewplayernum
        };
        if victim != watched || killer >= MAX_CLIENTS {
            return;
        }
        self.killer = Some(killer);
    }
}
