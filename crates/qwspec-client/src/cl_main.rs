// cl_main.rs -- client session
//
// One ClientSession owns everything a spectator client keeps between
// frames: connection and player state, the camera, console variables and
// commands, input. The caller feeds it server events and calls frame() with
// a clock; outgoing messages are drained with take_outgoing().

use qwspec_common::cmd::{cmd_tokenize_string, CmdArgs, CmdContext};
use qwspec_common::common::com_printf;
use qwspec_common::cvar::{CvarContext, CvarError};
use qwspec_common::q_shared::{UserCmd, Vec3, CVAR_NOSET};

use crate::cl_cam::{cam_init, CamConfig, CamEnv, CamMode, CameraTrackState};
use crate::cl_cam_cmds::autotrack_f;
use crate::cl_input::{cl_init_input, cl_send_cmd, in_button_command, InputCvars, InputState};
use crate::cl_mouseaccel::{mouse_accel_init, MouseAccelConfig};
use crate::cl_multiview::Multiview;
use crate::cl_timing::{Clock, ClientTiming};
use crate::cl_trace::TraceOracle;
use crate::client::{ClcMessage, ClientState, ClientStatic, ConnState, Playback};

/// What a renderer needs to draw the spectator's view.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraView {
    pub origin: Vec3,
    pub angles: Vec3,
    /// Slot whose eyes the view is drawn from.
    pub viewplayer: usize,
    pub mode: CamMode,
    pub tracked: Option<usize>,
    pub locked: bool,
    pub realtime: f64,
}

pub struct ClientSession {
    pub cls: ClientStatic,
    pub cl: ClientState,
    pub cam: CameraTrackState,
    pub cvars: CvarContext,
    pub cmds: CmdContext,
    pub multiview: Box<dyn Multiview>,
    pub world: Box<dyn TraceOracle>,
    pub input: InputState,
    pub timing: ClientTiming,
    /// Last command handed to the network layer.
    pub last_cmd: UserCmd,
    last_send_time: Option<f64>,
}

impl ClientSession {
    pub fn new(world: Box<dyn TraceOracle>, multiview: Box<dyn Multiview>) -> Result<Self, CvarError> {
        let mut cvars = CvarContext::new();
        cam_init(&mut cvars)?;
        mouse_accel_init(&mut cvars)?;
        cl_init_input(&mut cvars)?;
        cvars.get("cl_maxfps", "72", 0)?;
        cvars.get("version", concat!("qwspec ", env!("CARGO_PKG_VERSION")), CVAR_NOSET)?;

        Ok(Self {
            cls: ClientStatic::default(),
            cl: ClientState::new(),
            cam: CameraTrackState::new(),
            cvars,
            cmds: CmdContext::new(),
            multiview,
            world,
            input: InputState::new(),
            timing: ClientTiming::new(),
            last_cmd: UserCmd::default(),
            last_send_time: None,
        })
    }

    pub fn cam_config(&self) -> CamConfig {
        CamConfig::from_cvars(&self.cvars)
    }

    /// Run `f` with the camera and everything it borrows.
    fn with_cam<R>(&mut self, f: impl FnOnce(&mut CameraTrackState, &mut CamEnv) -> R) -> R {
        let config = CamConfig::from_cvars(&self.cvars);
        let mut env = CamEnv {
            cls: &mut self.cls,
            cl: &mut self.cl,
            cbuf: &mut self.cmds,
            multiview: &mut *self.multiview,
            world: &*self.world,
            config,
        };
        f(&mut self.cam, &mut env)
    }

    // ========================================================
    // Connection
    // ========================================================

    /// Join as `playernum`. A demo or MVD is entered already active.
    pub fn connect(&mut self, playernum: usize, spectator: bool, playback: Playback) {
        self.cls.state = ConnState::Active;
        self.cls.playback = playback;
        self.cl = ClientState::new();
        self.cl.playernum = playernum;
        self.cl.viewplayernum = playernum;
        self.cl.spectator = spectator;
        tracing::info!(playernum, spectator, ?playback, "connected");
    }

    pub fn disconnect(&mut self) {
        if self.cls.state == ConnState::Disconnected {
            return;
        }
        self.cam.reset();
        self.cam.retrack = None;
        self.cam.server_track = None;
        self.cam.killer = None;
        self.cls.state = ConnState::Disconnected;
        self.cls.playback = Playback::Live;
        self.cls.findtrack = false;
        self.cl = ClientState::new();
        self.timing.reset();
        self.last_send_time = None;
        tracing::info!("disconnected");
    }

    /// The server changed level. Client state is wiped; the camera keeps
    /// who it was following and tries to pick them up again.
    pub fn new_map(&mut self) {
        self.cam.init_auto_retrack(self.cl.spectator, self.cls.realtime);
        self.cam.reset();
        self.cam.server_track = None;
        self.cam.killer = None;

        let (playernum, spectator) = (self.cl.playernum, self.cl.spectator);
        self.cl = ClientState::new();
        self.cl.playernum = playernum;
        self.cl.viewplayernum = playernum;
        self.cl.spectator = spectator;
        self.timing.reset();
        self.last_send_time = None;
        tracing::info!("map change");
    }

    // ========================================================
    // Server updates
    // ========================================================

    pub fn begin_frame(&mut self) {
        self.cl.begin_frame();
    }

    pub fn update_player(&mut self, slot: usize, origin: Vec3, viewangles: Vec3, command: UserCmd) {
        self.cl.update_player(slot, origin, viewangles, command);
    }

    pub fn update_user_info(&mut self, slot: usize, userid: i32, name: &str, spectator: bool) {
        self.cl.update_user_info(slot, userid, name, spectator);
    }

    pub fn remove_player(&mut self, slot: usize) {
        self.cl.remove_player(slot);
    }

    pub fn set_frags(&mut self, slot: usize, frags: i32) {
        self.cl.set_frags(slot, frags);
    }

    /// `killer` fragged `victim`.
    pub fn obituary(&mut self, killer: usize, victim: usize) {
        self.cam.set_killer(&self.cl, killer, victim);
    }

    // ========================================================
    // Console
    // ========================================================

    /// Queue text and run it.
    pub fn execute_text(&mut self, text: &str) {
        self.cmds.cbuf_add_text(text);
        self.cbuf_execute();
    }

    pub fn cbuf_execute(&mut self) {
        self.cmds.alias_count = 0;
        while let Some(line) = self.cmds.cbuf_next_line() {
            self.execute_line(&line);
        }
    }

    pub fn execute_line(&mut self, line: &str) {
        let args = cmd_tokenize_string(line);
        if args.argc() == 0 {
            return;
        }

        match args.argv(0) {
            "track" => self.with_cam(|cam, env| cam.track_f(env, None, &args)),
            name @ ("track1" | "track2" | "track3" | "track4") => {
                let view = (name.as_bytes()[5] - b'1') as usize;
                self.with_cam(|cam, env| cam.track_f(env, Some(view), &args));
            }
            "trackkiller" => self.cam.track_killer_f(&self.cl, &mut self.cmds),
            "autotrack" => autotrack_f(&self.cls, &self.cl, &mut self.cvars, &mut self.cmds),
            "cam_pos" => self.with_cam(|cam, env| cam.cam_pos_f(env, &args)),
            "cam_angles" => self.with_cam(|cam, env| cam.cam_angles_f(env, &args)),
            "alias" => self.cmds.cmd_alias_f(&args),
            "set" => {
                let argv = args.argv_slice();
                self.cvars.set_f(&argv[1..]);
            }
            "cvarlist" => {
                let prefix = (args.argc() > 1).then(|| args.argv(1));
                self.cvars.list(prefix);
            }
            _ => self.execute_other(&args),
        }
    }

    /// Buttons, then aliases, then cvars; anything left goes to the server.
    fn execute_other(&mut self, args: &CmdArgs) {
        let name = args.argv(0);
        let sys_frame_time = (self.cls.realtime * 1000.0) as u32;

        if in_button_command(&mut self.input.buttons, name, args.argv(1), args.argv(2), sys_frame_time) {
            return;
        }
        if self.cmds.cmd_find_alias(name).is_some() {
            self.cmds.cmd_expand_alias(name);
            return;
        }
        if self.cvars.command(&args.argv_slice()) {
            return;
        }
        self.forward_to_server(args);
    }

    fn forward_to_server(&mut self, args: &CmdArgs) {
        if !matches!(self.cls.state, ConnState::Connected | ConnState::Active) {
            com_printf(&format!("Can't \"{}\", not connected\n", args.argv(0)));
            return;
        }
        if args.argc() > 1 {
            self.cls
                .netchan
                .write_string_cmd(&format!("{} {}", args.argv(0), args.args()));
        } else {
            self.cls.netchan.write_string_cmd(args.argv(0));
        }
    }

    // ========================================================
    // Frame
    // ========================================================

    /// One client frame. Returns the command built this frame, if one was
    /// due.
    pub fn frame(&mut self, clock: &dyn Clock) -> Option<UserCmd> {
        let now = clock.now();
        self.timing.update(now);
        self.cls.realtime = now;

        self.cbuf_execute();

        if self.cvars.take_modified("m_accel_custom_points") {
            let text = self.cvars.variable_string("m_accel_custom_points").to_string();
            self.input.accel.update_custom_curve(&text);
        }

        if self.cls.playback == Playback::Demo {
            self.cam.cam_try_lock(&self.cls, &self.cl);
        }

        let cl_maxfps = self.cvars.variable_value("cl_maxfps");
        if !self.timing.should_send_command(cl_maxfps) {
            return None;
        }

        self.cls.frametime = self.last_send_time.map_or(0.0, |t| (now - t).max(0.0));
        self.last_send_time = Some(now);

        let cmd = self.send_cmd();

        let config = self.cam_config();
        self.cam.set_view_player(&mut self.cl, &config);
        cmd
    }

    fn send_cmd(&mut self) -> Option<UserCmd> {
        let cvars = InputCvars::from_cvars(&self.cvars);
        let accel = MouseAccelConfig::from_cvars(&self.cvars);
        let sys_frame_time = (self.cls.realtime * 1000.0) as u32;
        let config = CamConfig::from_cvars(&self.cvars);

        let mut env = CamEnv {
            cls: &mut self.cls,
            cl: &mut self.cl,
            cbuf: &mut self.cmds,
            multiview: &mut *self.multiview,
            world: &*self.world,
            config,
        };
        let cmd = cl_send_cmd(
            &mut self.input,
            &cvars,
            &accel,
            &mut self.cam,
            &mut env,
            sys_frame_time,
        )?;
        self.last_cmd = cmd;
        Some(cmd)
    }

    /// Drain messages queued for the server.
    pub fn take_outgoing(&mut self) -> Vec<ClcMessage> {
        self.cls.netchan.take()
    }

    pub fn view(&self) -> CameraView {
        CameraView {
            origin: self.cl.simorg,
            angles: self.cl.viewangles,
            viewplayer: self.cl.viewplayernum,
            mode: self.cam.mode,
            tracked: self.cam.track_num(),
            locked: self.cam.locked,
            realtime: self.cls.realtime,
        }
    }
}
