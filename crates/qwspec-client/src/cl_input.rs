// cl_input.rs -- builds an intended movement command to send to the server
//
// Keyboard buttons and mouse motion turn into a UserCmd once per outgoing
// tick. Spectators hand the command to the camera between the base move and
// the button bits, and the camera sees the finished command last.

use qwspec_common::common::com_printf;
use qwspec_common::cvar::{CvarContext, CvarError};
use qwspec_common::q_shared::{Buttons, UserCmd, Vec3, CVAR_ARCHIVE, PITCH, ROLL, YAW};

use crate::cl_cam::{CamEnv, CameraTrackState};
use crate::cl_mouseaccel::{MouseAccel, MouseAccelConfig};
use crate::client::Playback;

pub const MIN_PITCH: f32 = -70.0;
pub const MAX_PITCH: f32 = 80.0;

// ===============================================================================
//
// KEY BUTTONS
//
// Continuous button event tracking is complicated by the fact that two different
// input sources (say, mouse button 1 and the control key) can both press the
// same button, but the button should only be released when both of the
// pressing key have been released.
//
// When a key event issues a button command (+forward, +attack, etc), it appends
// its key number as a parameter to the command so it can be matched up with
// the release.
//
// state bit 0 is the current state of the key
// state bit 1 is edge triggered on the up to down transition
// state bit 2 is edge triggered on the down to up transition
//
// ===============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct KButton {
    /// Key nums holding it down.
    pub down: [i32; 2],
    /// Msec timestamp.
    pub downtime: u32,
    /// Msec down this frame.
    pub msec: u32,
    pub state: i32,
}

impl KButton {
    pub fn is_down(&self) -> bool {
        self.state & 1 != 0
    }
}

/// All input button states.
#[derive(Debug, Default)]
pub struct InputButtons {
    pub in_left: KButton,
    pub in_right: KButton,
    pub in_forward: KButton,
    pub in_back: KButton,
    pub in_lookup: KButton,
    pub in_lookdown: KButton,
    pub in_moveleft: KButton,
    pub in_moveright: KButton,
    pub in_speed: KButton,
    pub in_use: KButton,
    pub in_attack: KButton,
    pub in_jump: KButton,
    pub in_up: KButton,
    pub in_down: KButton,
}

impl InputButtons {
    /// Button behind a `+name` / `-name` console command.
    pub fn by_name(&mut self, name: &str) -> Option<&mut KButton> {
        Some(match name {
            "left" => &mut self.in_left,
            "right" => &mut self.in_right,
            "forward" => &mut self.in_forward,
            "back" => &mut self.in_back,
            "lookup" => &mut self.in_lookup,
            "lookdown" => &mut self.in_lookdown,
            "moveleft" => &mut self.in_moveleft,
            "moveright" => &mut self.in_moveright,
            "speed" => &mut self.in_speed,
            "use" => &mut self.in_use,
            "attack" => &mut self.in_attack,
            "jump" => &mut self.in_jump,
            "moveup" => &mut self.in_up,
            "movedown" => &mut self.in_down,
            _ => return None,
        })
    }
}

/// Input-related cvars.
#[derive(Debug, Clone, PartialEq)]
pub struct InputCvars {
    pub cl_forwardspeed: f32,
    pub cl_backspeed: f32,
    pub cl_sidespeed: f32,
    pub cl_upspeed: f32,
    pub cl_movespeedkey: f32,
    pub cl_yawspeed: f32,
    pub cl_pitchspeed: f32,
    pub cl_anglespeedkey: f32,
    pub sensitivity: f32,
    pub m_yaw: f32,
    pub m_pitch: f32,
}

impl Default for InputCvars {
    fn default() -> Self {
        Self {
            cl_forwardspeed: 400.0,
            cl_backspeed: 400.0,
            cl_sidespeed: 400.0,
            cl_upspeed: 400.0,
            cl_movespeedkey: 2.0,
            cl_yawspeed: 140.0,
            cl_pitchspeed: 150.0,
            cl_anglespeedkey: 1.5,
            sensitivity: 12.0,
            m_yaw: 0.022,
            m_pitch: 0.022,
        }
    }
}

const INPUT_CVARS: &[(&str, &str)] = &[
    ("cl_forwardspeed", "400"),
    ("cl_backspeed", "400"),
    ("cl_sidespeed", "400"),
    ("cl_upspeed", "400"),
    ("cl_movespeedkey", "2.0"),
    ("cl_yawspeed", "140"),
    ("cl_pitchspeed", "150"),
    ("cl_anglespeedkey", "1.5"),
    ("sensitivity", "12"),
    ("m_yaw", "0.022"),
    ("m_pitch", "0.022"),
];

/// Register the movement and mouse cvars.
pub fn cl_init_input(cvars: &mut CvarContext) -> Result<(), CvarError> {
    for (name, default) in INPUT_CVARS {
        cvars.get(name, default, CVAR_ARCHIVE)?;
    }
    com_printf("CL_InitInput: input commands registered\n");
    Ok(())
}

impl InputCvars {
    pub fn from_cvars(cvars: &CvarContext) -> Self {
        let v = |name: &str| cvars.variable_value(name);
        Self {
            cl_forwardspeed: v("cl_forwardspeed").abs(),
            cl_backspeed: v("cl_backspeed").abs(),
            cl_sidespeed: v("cl_sidespeed").abs(),
            cl_upspeed: v("cl_upspeed").abs(),
            cl_movespeedkey: v("cl_movespeedkey").abs(),
            cl_yawspeed: v("cl_yawspeed"),
            cl_pitchspeed: v("cl_pitchspeed"),
            cl_anglespeedkey: v("cl_anglespeedkey"),
            sensitivity: v("sensitivity"),
            m_yaw: v("m_yaw"),
            m_pitch: v("m_pitch"),
        }
    }
}

/// Per-session input state.
#[derive(Debug, Default)]
pub struct InputState {
    pub buttons: InputButtons,
    /// Mouse counts accumulated since the last command.
    pub mouse_x: f32,
    pub mouse_y: f32,
    pub accel: MouseAccel,
    pub frame_msec: u32,
    old_sys_frame_time: u32,
    extramsec: f64,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mouse_event(&mut self, dx: f32, dy: f32) {
        self.mouse_x += dx;
        self.mouse_y += dy;
    }
}

/// Process a key-down event for a button.
///
/// `k` is the key number (-1 if typed manually at console for continuous down).
/// `time` is the timestamp from the key event.
pub fn key_down(b: &mut KButton, k: i32, time: u32, sys_frame_time: u32) {
    if k == b.down[0] || k == b.down[1] {
        return; // repeating key
    }

    if b.down[0] == 0 {
        b.down[0] = k;
    } else if b.down[1] == 0 {
        b.down[1] = k;
    } else {
        com_printf("Three keys down for a button!\n");
        return;
    }

    if b.state & 1 != 0 {
        return; // still down
    }

    b.downtime = if time != 0 {
        time
    } else {
        sys_frame_time.wrapping_sub(100)
    };

    b.state |= 1 + 2; // down + impulse down
}

/// Process a key-up event for a button.
///
/// `k` is the key number (-1 if typed manually, which clears all).
pub fn key_up(b: &mut KButton, k: i32, time: u32) {
    if k == -1 {
        // typed manually at the console, assume for unsticking, so clear all
        b.down = [0, 0];
        b.state = 4; // impulse up
        return;
    }

    if b.down[0] == k {
        b.down[0] = 0;
    } else if b.down[1] == k {
        b.down[1] = 0;
    } else {
        return; // key up without corresponding down (menu pass through)
    }

    if b.down[0] != 0 || b.down[1] != 0 {
        return; // some other key is still holding it down
    }

    if b.state & 1 == 0 {
        return; // still up (this should not happen)
    }

    if time != 0 {
        b.msec += time.wrapping_sub(b.downtime);
    } else {
        b.msec += 10;
    }

    b.state &= !1; // now up
    b.state |= 4; // impulse up
}

/// `+name [key] [time]` / `-name [key] [time]` from the console.
/// Returns false when `name` is not a button.
pub fn in_button_command(
    buttons: &mut InputButtons,
    command: &str,
    key: &str,
    time: &str,
    sys_frame_time: u32,
) -> bool {
    let (down, name) = if let Some(name) = command.strip_prefix('+') {
        (true, name)
    } else if let Some(name) = command.strip_prefix('-') {
        (false, name)
    } else {
        return false;
    };
    let Some(b) = buttons.by_name(name) else {
        return false;
    };
    let k = key.parse::<i32>().unwrap_or(-1);
    let time = time.parse::<u32>().unwrap_or(0);
    if down {
        key_down(b, k, time, sys_frame_time);
    } else {
        key_up(b, k, time);
    }
    true
}

/// Returns the fraction of the frame that the key was down.
pub fn cl_key_state(key: &mut KButton, sys_frame_time: u32, frame_msec: u32) -> f32 {
    key.state &= 1; // clear impulses

    let mut msec = key.msec as i64;
    key.msec = 0;

    if key.state != 0 {
        // still down
        msec += sys_frame_time.wrapping_sub(key.downtime) as i64;
        key.downtime = sys_frame_time;
    }

    (msec as f32 / frame_msec.max(1) as f32).clamp(0.0, 1.0)
}

fn clamp_pitch(viewangles: &mut Vec3) {
    viewangles[PITCH] = viewangles[PITCH].clamp(MIN_PITCH, MAX_PITCH);
    viewangles[ROLL] = viewangles[ROLL].clamp(-50.0, 50.0);
}

/// Moves the local angle positions.
pub fn cl_adjust_angles(
    viewangles: &mut Vec3,
    buttons: &mut InputButtons,
    cvars: &InputCvars,
    frametime: f32,
    sys_frame_time: u32,
    frame_msec: u32,
) {
    let basespeed = if buttons.in_speed.is_down() {
        cvars.cl_anglespeedkey
    } else {
        1.0
    };

    let speed = basespeed * cvars.cl_yawspeed * frametime;
    viewangles[YAW] -= speed * cl_key_state(&mut buttons.in_right, sys_frame_time, frame_msec);
    viewangles[YAW] += speed * cl_key_state(&mut buttons.in_left, sys_frame_time, frame_msec);
    if viewangles[YAW] < 0.0 {
        viewangles[YAW] += 360.0;
    } else if viewangles[YAW] > 360.0 {
        viewangles[YAW] -= 360.0;
    }

    let speed = basespeed * cvars.cl_pitchspeed * frametime;
    viewangles[PITCH] -= speed * cl_key_state(&mut buttons.in_lookup, sys_frame_time, frame_msec);
    viewangles[PITCH] += speed * cl_key_state(&mut buttons.in_lookdown, sys_frame_time, frame_msec);

    clamp_pitch(viewangles);
}

/// Build the intended movement command from keyboard state.
pub fn cl_base_move(
    cmd: &mut UserCmd,
    viewangles: &mut Vec3,
    buttons: &mut InputButtons,
    cvars: &InputCvars,
    frametime: f32,
    sys_frame_time: u32,
    frame_msec: u32,
) {
    cl_adjust_angles(viewangles, buttons, cvars, frametime, sys_frame_time, frame_msec);

    *cmd = UserCmd::default();
    cmd.angles = *viewangles;

    let key = |b: &mut KButton| cl_key_state(b, sys_frame_time, frame_msec);

    let side = cvars.cl_sidespeed * key(&mut buttons.in_moveright)
        - cvars.cl_sidespeed * key(&mut buttons.in_moveleft);
    let up = cvars.cl_upspeed * key(&mut buttons.in_up) - cvars.cl_upspeed * key(&mut buttons.in_down);
    let forward = cvars.cl_forwardspeed * key(&mut buttons.in_forward)
        - cvars.cl_backspeed * key(&mut buttons.in_back);

    // adjust for speed key
    let scale = if buttons.in_speed.is_down() {
        cvars.cl_movespeedkey
    } else {
        1.0
    };

    cmd.sidemove = (side * scale) as i16;
    cmd.upmove = (up * scale) as i16;
    cmd.forwardmove = (forward * scale) as i16;
}

/// Apply accumulated mouse motion to the view. The accumulator is always
/// drained; `apply` is false while the camera owns the view.
pub fn cl_mouse_move(
    input: &mut InputState,
    viewangles: &mut Vec3,
    cvars: &InputCvars,
    accel_cfg: &MouseAccelConfig,
    frametime: f64,
    apply: bool,
) {
    let (mx, my) = (input.mouse_x, input.mouse_y);
    input.mouse_x = 0.0;
    input.mouse_y = 0.0;

    if !apply || (mx == 0.0 && my == 0.0) {
        return;
    }

    let scale = input.accel.scale(
        accel_cfg,
        mx as f64,
        my as f64,
        frametime,
        cvars.sensitivity as f64,
    ) as f32;

    viewangles[YAW] -= cvars.m_yaw * mx * scale;
    viewangles[PITCH] += cvars.m_pitch * my * scale;
    clamp_pitch(viewangles);
}

/// Fill in the button bits and timing after movement and mouse input.
pub fn cl_finish_move(
    cmd: &mut UserCmd,
    input: &mut InputState,
    viewangles: &Vec3,
    frametime: f64,
) {
    let buttons = &mut input.buttons;

    // figure button bits
    if buttons.in_attack.state & 3 != 0 {
        cmd.buttons |= Buttons::ATTACK;
    }
    buttons.in_attack.state &= !2;

    if buttons.in_jump.state & 3 != 0 {
        cmd.buttons |= Buttons::JUMP;
    }
    buttons.in_jump.state &= !2;

    if buttons.in_use.state & 3 != 0 {
        cmd.buttons |= Buttons::USE;
    }
    buttons.in_use.state &= !2;

    // send milliseconds of time to apply the move
    input.extramsec += frametime * 1000.0;
    let mut ms = input.extramsec as i32;
    input.extramsec -= ms as f64;
    if ms > 250 {
        ms = 100; // time was unreasonable
    }
    cmd.msec = ms.clamp(0, 255) as u8;

    cmd.angles = *viewangles;
}

// ============================================================
// CL_SendCmd
// ============================================================

/// Build this tick's command. Spectators run the camera on it. Returns None
/// during plain demo playback, where commands come from the recording.
pub fn cl_send_cmd(
    input: &mut InputState,
    cvars: &InputCvars,
    accel_cfg: &MouseAccelConfig,
    cam: &mut CameraTrackState,
    env: &mut CamEnv,
    sys_frame_time: u32,
) -> Option<UserCmd> {
    if env.cls.playback == Playback::Demo {
        input.mouse_x = 0.0;
        input.mouse_y = 0.0;
        return None;
    }

    input.frame_msec = sys_frame_time
        .wrapping_sub(input.old_sys_frame_time)
        .clamp(1, 200);
    input.old_sys_frame_time = sys_frame_time;

    let frametime = env.cls.frametime;
    let mut cmd = UserCmd::default();

    // get basic movement from keyboard
    cl_base_move(
        &mut cmd,
        &mut env.cl.viewangles,
        &mut input.buttons,
        cvars,
        frametime as f32,
        sys_frame_time,
        input.frame_msec,
    );

    // allow mice to add to the move
    let apply = !cam.controls_view(env.cl, &env.config);
    cl_mouse_move(input, &mut env.cl.viewangles, cvars, accel_cfg, frametime, apply);

    // if we are spectator, try autocam
    if env.cl.spectator {
        cam.cam_track(env, &mut cmd);
    }

    cl_finish_move(&mut cmd, input, &env.cl.viewangles, frametime);

    cam.cam_finish_move(env, &mut cmd);

    Some(cmd)
}
