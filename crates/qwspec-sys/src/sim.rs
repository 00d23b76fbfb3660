// sim.rs — scripted arena for driving a spectator session without a server
//
// Players run circuits around fixed centers inside a walled room with a
// pillar in the middle, so the camera has to search around occluders.

use qwspec_client::cl_main::ClientSession;
use qwspec_client::cl_trace::BoxWorld;
use qwspec_common::q_shared::{vectoangles, UserCmd, Vec3};

/// Half width of the arena floor.
pub const ARENA_HALF: f32 = 1024.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedPlayer {
    pub slot: usize,
    pub userid: i32,
    pub name: String,
    pub center: Vec3,
    pub radius: f32,
    /// Radians per second; negative runs clockwise.
    pub rate: f32,
    pub phase: f32,
}

impl ScriptedPlayer {
    pub fn new(slot: usize, userid: i32, name: &str, center: Vec3, radius: f32, rate: f32) -> Self {
        Self {
            slot,
            userid,
            name: name.to_string(),
            center,
            radius,
            rate,
            phase: slot as f32,
        }
    }

    pub fn origin_at(&self, t: f64) -> Vec3 {
        let a = self.phase + self.rate * t as f32;
        [
            self.center[0] + self.radius * a.cos(),
            self.center[1] + self.radius * a.sin(),
            self.center[2],
        ]
    }

    /// Players look along their direction of travel.
    pub fn angles_at(&self, t: f64) -> Vec3 {
        let a = self.phase + self.rate * t as f32;
        let dir = [-a.sin() * self.rate.signum(), a.cos() * self.rate.signum(), 0.0];
        vectoangles(&dir)
    }
}

pub struct Arena {
    pub players: Vec<ScriptedPlayer>,
    /// Frags handed out every `frag_interval` seconds, round robin.
    pub frag_interval: f64,
    frags: Vec<i32>,
    next_frag_time: f64,
    next_fragger: usize,
}

impl Arena {
    pub fn new(players: Vec<ScriptedPlayer>, frag_interval: f64) -> Self {
        let frags = vec![0; players.len()];
        Self {
            players,
            frag_interval,
            frags,
            next_frag_time: frag_interval,
            next_fragger: 0,
        }
    }

    /// Three players around a pillar.
    pub fn standard() -> Self {
        Self::new(
            vec![
                ScriptedPlayer::new(1, 101, "Alpha", [-400.0, 0.0, 24.0], 200.0, 1.0),
                ScriptedPlayer::new(3, 103, "Bravo", [400.0, 0.0, 24.0], 250.0, -0.8),
                ScriptedPlayer::new(6, 106, "Charlie", [0.0, 500.0, 24.0], 150.0, 1.5),
            ],
            5.0,
        )
    }

    /// Walls, floor and ceiling, plus a pillar at the origin.
    pub fn world() -> BoxWorld {
        let mut world = BoxWorld::enclosure([0.0, 0.0, 256.0], ARENA_HALF, 32.0);
        world.add_solid([-64.0, -64.0, -256.0], [64.0, 64.0, 512.0]);
        world
    }

    /// Tell the session who is on the server.
    pub fn introduce(&self, session: &mut ClientSession) {
        for p in &self.players {
            session.update_user_info(p.slot, p.userid, &p.name, false);
        }
    }

    /// Emit one server frame at time `t`. Returns (killer, victim) when a
    /// frag happened.
    pub fn step(&mut self, session: &mut ClientSession, t: f64) -> Option<(usize, usize)> {
        session.begin_frame();
        for p in &self.players {
            let angles = p.angles_at(t);
            let command = UserCmd {
                angles,
                ..UserCmd::default()
            };
            session.update_player(p.slot, p.origin_at(t), angles, command);
        }

        if self.players.len() < 2 || t < self.next_frag_time {
            return None;
        }
        self.next_frag_time += self.frag_interval;

        let k = self.next_fragger % self.players.len();
        let v = (k + 1) % self.players.len();
        self.next_fragger += 1;
        self.frags[k] += 1;

        let (killer, victim) = (self.players[k].slot, self.players[v].slot);
        session.set_frags(killer, self.frags[k]);
        session.obituary(killer, victim);
        tracing::info!(killer = %self.players[k].name, victim = %self.players[v].name, "frag");
        Some((killer, victim))
    }
}

/// Split the command line into console text. `+set` pairs are returned
/// first so they are in place before any other command runs; every other
/// `+name args...` becomes a line of its own.
pub fn startup_commands(args: &[String]) -> (String, String) {
    let mut early = String::new();
    let mut late = String::new();

    let mut i = 0;
    while i < args.len() {
        let Some(name) = args[i].strip_prefix('+') else {
            i += 1;
            continue;
        };
        let mut j = i + 1;
        while j < args.len() && !args[j].starts_with('+') {
            j += 1;
        }
        let rest = &args[i + 1..j];

        if name == "set" && rest.len() >= 2 {
            early.push_str(&format!("set {} \"{}\"\n", rest[0], rest[1..].join(" ")));
        } else if !name.is_empty() {
            let mut line = name.to_string();
            for a in rest {
                line.push(' ');
                line.push_str(a);
            }
            late.push_str(&line);
            late.push('\n');
        }
        i = j;
    }
    (early, late)
}
