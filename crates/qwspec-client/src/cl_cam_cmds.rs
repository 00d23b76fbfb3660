// cl_cam_cmds.rs — camera console commands
//
// track, track1..track4, trackkiller, autotrack, cam_pos, cam_angles.

use qwspec_common::cmd::{cmd_tokenize_string, CmdArgs, CmdContext};
use qwspec_common::common::com_printf;
use qwspec_common::cvar::CvarContext;
use qwspec_common::q_shared::{com_ftos, q_atof, q_atoi, Vec3};

use crate::cl_cam::{CamEnv, CamMode, CameraTrackState};
use crate::cl_multiview::MV_VIEWS;
use crate::client::{ClientState, ClientStatic, ConnState};

/// Why a track command was refused. Nothing is changed when one of these
/// comes back.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrackError {
    #[error("You must be connected to track")]
    NotConnected,
    #[error("You can only track in spectator mode")]
    NotSpectator,
    #[error("Usage: {0} <userid> | <name>")]
    Usage(String),
    #[error("Usage: {0} <userid> | <name> | <off>")]
    MultiviewUsage(String),
    #[error("{cmd} : no such player {name}")]
    NoSuchName { cmd: String, name: String },
    #[error("{cmd} : no player with userid {userid}")]
    NoSuchUserid { cmd: String, userid: i32 },
    #[error("You cannot track a spectator")]
    Spectator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    Tracking(usize),
    /// The main view already shows this player.
    AlreadyTracking(usize),
    /// A multiview slot went back to its default.
    ViewReset(usize),
}

/// Resolve a track argument: all digits is a userid, anything else a name.
pub fn player_slot(cl: &ClientState, cmd: &str, arg: &str) -> Result<usize, TrackError> {
    let numeric = !arg.is_empty() && arg.bytes().all(|b| b.is_ascii_digit());
    if numeric {
        let userid = q_atoi(arg);
        return cl
            .slot_for_userid(userid)
            .ok_or_else(|| TrackError::NoSuchUserid {
                cmd: cmd.to_string(),
                userid,
            });
    }
    cl.slot_for_name(arg).ok_or_else(|| TrackError::NoSuchName {
        cmd: cmd.to_string(),
        name: arg.to_string(),
    })
}

/// Coordinates only mean something to spectators and demo viewers.
fn cam_ftos(cls: &ClientStatic, cl: &ClientState, f: f32) -> String {
    if !cls.playback.is_demo() && !cl.spectator {
        return "?".to_string();
    }
    com_ftos(f)
}

fn format_vec(cls: &ClientStatic, cl: &ClientState, v: &Vec3) -> String {
    format!(
        "\"{} {} {}\"",
        cam_ftos(cls, cl, v[0]),
        cam_ftos(cls, cl, v[1]),
        cam_ftos(cls, cl, v[2])
    )
}

impl CameraTrackState {
    /// Change what player we are tracking. `trackview` names a multiview
    /// slot for track1..track4.
    pub fn track(
        &mut self,
        env: &mut CamEnv,
        trackview: Option<usize>,
        args: &CmdArgs,
    ) -> Result<TrackOutcome, TrackError> {
        if !matches!(env.cls.state, ConnState::Connected | ConnState::Active) {
            return Err(TrackError::NotConnected);
        }
        if !env.cl.spectator {
            return Err(TrackError::NotSpectator);
        }

        let trackview = trackview.map(|v| v.min(MV_VIEWS - 1));

        if let Some(view) = trackview {
            if args.args() == "off" {
                env.multiview.set_track_slot(Some(view), None);
                return Ok(TrackOutcome::ViewReset(view));
            }
        }

        if args.argc() != 2 {
            let cmd = args.argv(0).to_string();
            return Err(match trackview {
                Some(_) => TrackError::MultiviewUsage(cmd),
                None => TrackError::Usage(cmd),
            });
        }

        let slot = player_slot(env.cl, args.argv(0), args.argv(1))?;
        if env.cl.players[slot].spectator {
            return Err(TrackError::Spectator);
        }

        if trackview.is_none() && self.main_track_num(&*env.multiview) == Some(slot) {
            return Ok(TrackOutcome::AlreadyTracking(slot));
        }

        self.mode = CamMode::Track;
        self.lock(env, slot);
        self.ideal_slot = slot;
        if let Some(view) = trackview {
            env.multiview.set_track_slot(Some(view), Some(slot));
        }
        Ok(TrackOutcome::Tracking(slot))
    }

    /// Console entry for track / trackN.
    pub fn track_f(&mut self, env: &mut CamEnv, trackview: Option<usize>, args: &CmdArgs) {
        match self.track(env, trackview, args) {
            Ok(TrackOutcome::ViewReset(view)) => {
                com_printf(&format!("Track {} resetting to default\n", view));
            }
            Ok(_) => {}
            Err(e) => com_printf(&format!("{}\n", e)),
        }
    }

    /// Queue "track <userid>" for whoever killed the viewed player.
    pub fn track_killer_f(&self, cl: &ClientState, cbuf: &mut CmdContext) {
        if let Some(killer) = self.killer {
            cbuf.cbuf_add_text(&format!("track {}\n", cl.players[killer].userid));
        }
    }

    /// cam_pos [x y z]: show or set the camera origin.
    pub fn cam_pos_f(&mut self, env: &mut CamEnv, args: &CmdArgs) {
        if args.argc() == 1 {
            com_printf(&format!("{}\n", format_vec(env.cls, env.cl, &env.cl.simorg)));
            return;
        }

        // cam_pos "x y z"  -->  cam_pos x y z
        let retokenized;
        let args = if args.argc() == 2 {
            retokenized = cmd_tokenize_string(&format!("cam_pos {}", args.argv(1)));
            &retokenized
        } else {
            args
        };

        if args.argc() != 4 {
            com_printf("usage:\ncam_pos - show current coordinates\ncam_pos x y z - set new coordinates\n");
            return;
        }

        if !env.cls.playback.is_demo() && !env.cl.spectator {
            return;
        }

        self.reset();
        let origin = [q_atof(args.argv(1)), q_atof(args.argv(2)), q_atof(args.argv(3))];
        env.cl.simorg = origin;
        env.cl.set_self_origin(origin);
        if env.cls.state == ConnState::Active && !env.cls.playback.is_demo() {
            env.cls.netchan.write_tmove(origin);
        }
    }

    /// cam_angles [pitch yaw [roll]]: show or set the view angles.
    pub fn cam_angles_f(&mut self, env: &mut CamEnv, args: &CmdArgs) {
        if args.argc() == 1 {
            com_printf(&format!("{}\n", format_vec(env.cls, env.cl, &env.cl.viewangles)));
            return;
        }

        // cam_angles "pitch yaw roll"  -->  cam_angles pitch yaw roll
        let retokenized;
        let args = if args.argc() == 2 {
            retokenized = cmd_tokenize_string(&format!("cam_angles {}", args.argv(1)));
            &retokenized
        } else {
            args
        };

        if args.argc() != 3 && args.argc() != 4 {
            com_printf("usage:\ncam_angles - show current angles\ncam_angles pitch yaw [roll] - set new angles\n");
            return;
        }

        if !env.cls.playback.is_demo() && !env.cl.spectator {
            return;
        }

        let angles = [q_atof(args.argv(1)), q_atof(args.argv(2)), q_atof(args.argv(3))];
        env.cl.simangles = angles;
        env.cl.viewangles = angles;
    }
}

fn set_cvar(cvars: &mut CvarContext, name: &str, value: &str) {
    if let Err(e) = cvars.set(name, value) {
        com_printf(&format!("{}\n", e));
    }
}

/// Auto-tracking lives in three places: the server, the client (for a
/// demo), and recorded in a demo. Toggle whichever one applies.
pub fn autotrack_f(cls: &ClientStatic, cl: &ClientState, cvars: &mut CvarContext, cbuf: &mut CmdContext) {
    let mvda = cvars.variable_integer("mvd_autotrack") != 0;
    let demoa = cvars.variable_integer("demo_autotrack") != 0;
    let hightrack = cvars.variable_integer("cl_hightrack") != 0;

    if cls.playback.is_demo() {
        if !cls.playback.is_mvd() {
            com_printf("Only one point of view is recorded in this demo\n");
            return;
        }

        if hightrack {
            set_cvar(cvars, "cl_hightrack", "0");
        }

        match (mvda, demoa) {
            (false, false) => {
                // demo_autotrack info in the stream turns mvd_autotrack off
                set_cvar(cvars, "mvd_autotrack", "4");
                set_cvar(cvars, "demo_autotrack", "1");
                com_printf("MVD Autotracking on\n");
            }
            (true, false) => {
                com_printf("MVD Autotracking off\n");
                set_cvar(cvars, "mvd_autotrack", "0");
            }
            (false, true) => {
                com_printf("Demo Autotracking off\n");
                set_cvar(cvars, "demo_autotrack", "0");
            }
            (true, true) => {
                com_printf("Autotracking off\n");
                set_cvar(cvars, "mvd_autotrack", "0");
                set_cvar(cvars, "demo_autotrack", "0");
            }
        }
        return;
    }

    if !cl.spectator {
        return;
    }

    if let Some(value) = cbuf.cmd_find_alias("autotrack").map(|a| a.value.clone()) {
        // server side autotrack; it and hightrack fight each other
        cbuf.cbuf_add_text(&format!("{}\n", value));
        if hightrack {
            set_cvar(cvars, "cl_hightrack", "0");
            com_printf("Hightrack off\n");
        }
    } else if !hightrack {
        com_printf("Autotrack not supported here, tracking top fragger (Hightrack on)\n");
        set_cvar(cvars, "cl_hightrack", "1");
    } else {
        com_printf("Hightrack off\n");
        set_cvar(cvars, "cl_hightrack", "0");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl_cam::cam_init;
    use crate::cl_cam::tests::Rig;
    use crate::cl_multiview::{Multiview, MultiviewSlots};
    use crate::client::{ClcMessage, Playback};
    use qwspec_common::common::com_capture;

    fn track(rig: &mut Rig, line: &str) -> Result<TrackOutcome, TrackError> {
        let args = cmd_tokenize_string(line);
        let (mut env, cam) = rig.env();
        cam.track(&mut env, None, &args)
    }

    #[test]
    fn test_track_by_name_and_userid() {
        let mut rig = Rig::new();
        assert_eq!(track(&mut rig, "track bravo"), Ok(TrackOutcome::Tracking(3)));
        assert_eq!(rig.cam.mode, CamMode::Track);
        assert_eq!(rig.cam.tracked_slot, 3);
        assert_eq!(rig.cam.ideal_slot, 3);
        assert!(!rig.cam.locked);
        assert_eq!(rig.sent(), vec![ClcMessage::StringCmd("ptrack 3".into())]);

        assert_eq!(track(&mut rig, "track 106"), Ok(TrackOutcome::Tracking(6)));
        assert_eq!(rig.cam.tracked_slot, 6);
    }

    #[test]
    fn test_track_same_player_is_noop() {
        let mut rig = Rig::new();
        track(&mut rig, "track Alpha").unwrap();
        rig.sent();
        assert_eq!(track(&mut rig, "track Alpha"), Ok(TrackOutcome::AlreadyTracking(1)));
        assert!(rig.sent().is_empty());
    }

    #[test]
    fn test_track_errors_leave_state_alone() {
        let mut rig = Rig::new();
        let before = (rig.cam.mode, rig.cam.tracked_slot, rig.cam.locked);

        assert_eq!(
            track(&mut rig, "track nobody"),
            Err(TrackError::NoSuchName {
                cmd: "track".into(),
                name: "nobody".into()
            })
        );
        assert_eq!(
            track(&mut rig, "track 555"),
            Err(TrackError::NoSuchUserid {
                cmd: "track".into(),
                userid: 555
            })
        );
        assert_eq!(track(&mut rig, "track Watcher"), Err(TrackError::Spectator));
        assert_eq!(track(&mut rig, "track"), Err(TrackError::Usage("track".into())));

        assert_eq!(before, (rig.cam.mode, rig.cam.tracked_slot, rig.cam.locked));
        assert!(rig.sent().is_empty());
    }

    #[test]
    fn test_track_requires_connected_spectator() {
        let mut rig = Rig::new();
        rig.cls.state = ConnState::Disconnected;
        assert_eq!(track(&mut rig, "track Alpha"), Err(TrackError::NotConnected));
        rig.cls.state = ConnState::Active;
        rig.cl.spectator = false;
        assert_eq!(track(&mut rig, "track Alpha"), Err(TrackError::NotSpectator));
    }

    #[test]
    fn test_track_error_messages() {
        assert_eq!(
            TrackError::NoSuchName {
                cmd: "track".into(),
                name: "bob".into()
            }
            .to_string(),
            "track : no such player bob"
        );
        assert_eq!(
            TrackError::MultiviewUsage("track2".into()).to_string(),
            "Usage: track2 <userid> | <name> | <off>"
        );
    }

    #[test]
    fn test_track_f_prints_error() {
        let mut rig = Rig::new();
        let args = cmd_tokenize_string("track Watcher");
        let (_, text) = com_capture(|| {
            let (mut env, cam) = rig.env();
            cam.track_f(&mut env, None, &args);
        });
        assert_eq!(text, "You cannot track a spectator\n");
    }

    #[test]
    fn test_multiview_track_and_off() {
        let mut rig = Rig::new();
        let mut mv = MultiviewSlots::new(4, false);
        let mut env = CamEnv {
            cls: &mut rig.cls,
            cl: &mut rig.cl,
            cbuf: &mut rig.cbuf,
            multiview: &mut mv,
            world: &rig.world,
            config: rig.config,
        };

        let args = cmd_tokenize_string("track3 Charlie");
        assert_eq!(rig.cam.track(&mut env, Some(2), &args), Ok(TrackOutcome::Tracking(6)));
        let args = cmd_tokenize_string("track3 off");
        let (_, text) = com_capture(|| rig.cam.track_f(&mut env, Some(2), &args));
        assert_eq!(text, "Track 2 resetting to default\n");
        let args = cmd_tokenize_string("track3");
        assert_eq!(
            rig.cam.track(&mut env, Some(2), &args),
            Err(TrackError::MultiviewUsage("track3".into()))
        );
        drop(env);
        assert_eq!(mv.view_slot(2), None);
        // lock assigned the current view too
        assert_eq!(mv.main_view(), Some(6));
    }

    #[test]
    fn test_trackkiller_queues_track_command() {
        let mut rig = Rig::new();
        rig.cl.viewplayernum = 1;
        rig.cam.track_killer_f(&rig.cl, &mut rig.cbuf);
        assert!(rig.cbuf.cbuf_is_empty());

        rig.cam.set_killer(&rig.cl, 6, 1);
        rig.cam.track_killer_f(&rig.cl, &mut rig.cbuf);
        assert_eq!(rig.cbuf.cbuf_next_line().as_deref(), Some("track 106"));
    }

    #[test]
    fn test_cam_pos_show_and_set() {
        let mut rig = Rig::new();
        rig.cl.simorg = [1.5, -2.0, 0.0];
        let (_, text) = com_capture(|| {
            let (mut env, cam) = rig.env();
            cam.cam_pos_f(&mut env, &cmd_tokenize_string("cam_pos"));
        });
        assert_eq!(text, "\"1.5 -2 0\"\n");

        rig.cam.mode = CamMode::Track;
        let (mut env, cam) = rig.env();
        cam.cam_pos_f(&mut env, &cmd_tokenize_string("cam_pos \"10 20 30\""));
        assert_eq!(cam.mode, CamMode::None);
        assert_eq!(rig.cl.simorg, [10.0, 20.0, 30.0]);
        assert_eq!(rig.cl.self_origin(), [10.0, 20.0, 30.0]);
        assert_eq!(rig.sent(), vec![ClcMessage::TeleportMove([10.0, 20.0, 30.0])]);
    }

    #[test]
    fn test_cam_pos_demo_does_not_teleport() {
        let mut rig = Rig::new();
        rig.cls.playback = Playback::Demo;
        let (mut env, cam) = rig.env();
        cam.cam_pos_f(&mut env, &cmd_tokenize_string("cam_pos 1 2 3"));
        assert_eq!(rig.cl.simorg, [1.0, 2.0, 3.0]);
        assert!(rig.sent().is_empty());
    }

    #[test]
    fn test_cam_pos_usage_and_player_hidden() {
        let mut rig = Rig::new();
        let (_, text) = com_capture(|| {
            let (mut env, cam) = rig.env();
            cam.cam_pos_f(&mut env, &cmd_tokenize_string("cam_pos 1 2"));
        });
        assert!(text.starts_with("usage:"));

        rig.cl.spectator = false;
        let (_, text) = com_capture(|| {
            let (mut env, cam) = rig.env();
            cam.cam_pos_f(&mut env, &cmd_tokenize_string("cam_pos"));
        });
        assert_eq!(text, "\"? ? ?\"\n");
    }

    #[test]
    fn test_cam_angles_set_without_roll() {
        let mut rig = Rig::new();
        let (mut env, cam) = rig.env();
        cam.cam_angles_f(&mut env, &cmd_tokenize_string("cam_angles 10 270"));
        assert_eq!(rig.cl.viewangles, [10.0, 270.0, 0.0]);
        assert_eq!(rig.cl.simangles, [10.0, 270.0, 0.0]);
    }

    fn autotrack(rig: &mut Rig, cvars: &mut CvarContext) -> String {
        com_capture(|| autotrack_f(&rig.cls, &rig.cl, cvars, &mut rig.cbuf)).1
    }

    #[test]
    fn test_autotrack_live_toggles_hightrack() {
        let mut rig = Rig::new();
        let mut cvars = CvarContext::new();
        cam_init(&mut cvars).unwrap();

        let text = autotrack(&mut rig, &mut cvars);
        assert!(text.contains("Hightrack on"));
        assert_eq!(cvars.variable_integer("cl_hightrack"), 1);

        let text = autotrack(&mut rig, &mut cvars);
        assert_eq!(text, "Hightrack off\n");
        assert_eq!(cvars.variable_integer("cl_hightrack"), 0);
    }

    #[test]
    fn test_autotrack_live_runs_alias() {
        let mut rig = Rig::new();
        let mut cvars = CvarContext::new();
        cam_init(&mut cvars).unwrap();
        cvars.set("cl_hightrack", "1").unwrap();
        rig.cbuf.cmd_alias_set("autotrack", "impulse 154");

        autotrack(&mut rig, &mut cvars);
        assert_eq!(rig.cbuf.cbuf_next_line().as_deref(), Some("impulse 154"));
        assert_eq!(cvars.variable_integer("cl_hightrack"), 0);
    }

    #[test]
    fn test_autotrack_mvd_cycles() {
        let mut rig = Rig::new();
        rig.cls.playback = Playback::Mvd;
        let mut cvars = CvarContext::new();
        cam_init(&mut cvars).unwrap();
        cvars.set("cl_hightrack", "1").unwrap();

        assert_eq!(autotrack(&mut rig, &mut cvars), "MVD Autotracking on\n");
        assert_eq!(cvars.variable_integer("mvd_autotrack"), 4);
        assert_eq!(cvars.variable_integer("demo_autotrack"), 1);
        assert_eq!(cvars.variable_integer("cl_hightrack"), 0);

        assert_eq!(autotrack(&mut rig, &mut cvars), "Autotracking off\n");
        assert_eq!(cvars.variable_integer("mvd_autotrack"), 0);
        assert_eq!(cvars.variable_integer("demo_autotrack"), 0);

        cvars.set("demo_autotrack", "1").unwrap();
        assert_eq!(autotrack(&mut rig, &mut cvars), "Demo Autotracking off\n");
        cvars.set("mvd_autotrack", "2").unwrap();
        assert_eq!(autotrack(&mut rig, &mut cvars), "MVD Autotracking off\n");
    }

    #[test]
    fn test_autotrack_single_pov_demo() {
        let mut rig = Rig::new();
        rig.cls.playback = Playback::Demo;
        let mut cvars = CvarContext::new();
        cam_init(&mut cvars).unwrap();
        assert_eq!(
            autotrack(&mut rig, &mut cvars),
            "Only one point of view is recorded in this demo\n"
        );
    }
}
