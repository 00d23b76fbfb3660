// client.rs — primary header for client
//
// ClientStatic survives map changes (connection, clock, reliable queue).
// ClientState is wiped on every map change and carries the player registry:
// scoreboard info per slot plus a ring of parsed frames holding per-tick
// player states.

use qwspec_common::q_shared::{UserCmd, Vec3, MAX_CLIENTS};

/// Copies of parsed frames to keep buffered, must be power of two.
pub const UPDATE_BACKUP: usize = 64;
pub const UPDATE_MASK: usize = UPDATE_BACKUP - 1;

// ============================================================
// Connection / playback state
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnState {
    #[default]
    Disconnected, // not talking to a server
    Connecting,   // sending request packets to the server
    Connected,    // netchan established, waiting for serverdata
    Active,       // game views should be displayed
}

/// What is feeding the frame ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Playback {
    #[default]
    Live,
    /// Recorded from a single client's point of view.
    Demo,
    /// Multi-view demo: every player's state is in the stream.
    Mvd,
}

impl Playback {
    pub fn is_demo(self) -> bool {
        self != Playback::Live
    }

    pub fn is_mvd(self) -> bool {
        self == Playback::Mvd
    }
}

// ============================================================
// Outgoing reliable messages
// ============================================================

/// Reliable client-to-server messages queued during a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ClcMessage {
    /// Console command executed on the server ("ptrack 3").
    StringCmd(String),
    /// Spectator teleport to an absolute origin.
    TeleportMove(Vec3),
}

#[derive(Debug, Default)]
pub struct NetChan {
    pub message: Vec<ClcMessage>,
}

impl NetChan {
    pub fn write_string_cmd(&mut self, text: &str) {
        self.message.push(ClcMessage::StringCmd(text.to_string()));
    }

    pub fn write_tmove(&mut self, origin: Vec3) {
        self.message.push(ClcMessage::TeleportMove(origin));
    }

    /// Drain everything queued since the last send.
    pub fn take(&mut self) -> Vec<ClcMessage> {
        std::mem::take(&mut self.message)
    }

    /// String commands currently queued, oldest first.
    pub fn string_cmds(&self) -> Vec<&str> {
        self.message
            .iter()
            .filter_map(|m| match m {
                ClcMessage::StringCmd(s) => Some(s.as_str()),
                ClcMessage::TeleportMove(_) => None,
            })
            .collect()
    }
}

/// The client_static_t structure is persistent through an arbitrary number
/// of server connections.
#[derive(Debug, Default)]
pub struct ClientStatic {
    pub state: ConnState,
    pub playback: Playback,

    /// Seconds, always increasing, set from the session clock each frame.
    pub realtime: f64,
    pub frametime: f64,

    /// MVD playback: no fresh player was found for the main view.
    pub findtrack: bool,

    pub netchan: NetChan,
}

// ============================================================
// Player registry
// ============================================================

/// Scoreboard data for one slot, updated by userinfo and frag messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerInfo {
    pub userid: i32,
    /// Empty when the slot is unused.
    pub name: String,
    pub frags: i32,
    pub spectator: bool,
}

impl PlayerInfo {
    pub fn is_active(&self) -> bool {
        !self.name.is_empty()
    }

    /// Named and playing: the only kind of slot a camera may follow.
    pub fn is_trackable(&self) -> bool {
        self.is_active() && !self.spectator
    }
}

/// Per-frame state of one player.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerState {
    /// parsecount of the frame that last carried this player.
    pub messagenum: i32,
    pub origin: Vec3,
    pub viewangles: Vec3,
    /// Last user command the player sent (demo streams carry it).
    pub command: UserCmd,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub playerstate: [PlayerState; MAX_CLIENTS],
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            playerstate: [PlayerState::default(); MAX_CLIENTS],
        }
    }
}

/// The client_state_t structure is wiped completely at every server map
/// change.
#[derive(Debug, Clone)]
pub struct ClientState {
    pub spectator: bool,
    /// Our own slot.
    pub playernum: usize,
    /// Slot the view is rendered from.
    pub viewplayernum: usize,

    pub players: Vec<PlayerInfo>,
    pub frames: Vec<Frame>,

    /// Incremented for every parsed frame.
    pub parsecount: i32,
    pub oldparsecount: i32,
    /// Last frame that parsed completely, 0 until the first one.
    pub validsequence: i32,

    pub viewangles: Vec3,
    pub simorg: Vec3,
    pub simangles: Vec3,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            spectator: false,
            playernum: 0,
            viewplayernum: 0,
            players: vec![PlayerInfo::default(); MAX_CLIENTS],
            frames: vec![Frame::default(); UPDATE_BACKUP],
            parsecount: 0,
            oldparsecount: 0,
            validsequence: 0,
            viewangles: [0.0; 3],
            simorg: [0.0; 3],
            simangles: [0.0; 3],
        }
    }
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================
    // Frame ring
    // ========================================================

    pub fn current_frame(&self) -> &Frame {
        &self.frames[self.validsequence as usize & UPDATE_MASK]
    }

    pub fn current_frame_mut(&mut self) -> &mut Frame {
        let idx = self.validsequence as usize & UPDATE_MASK;
        &mut self.frames[idx]
    }

    /// Start parsing a new frame. Player states carry over from the previous
    /// frame with their old messagenum, so players missing from this frame
    /// read as stale.
    pub fn begin_frame(&mut self) {
        let prev = self.frames[self.parsecount as usize & UPDATE_MASK].clone();
        self.oldparsecount = self.parsecount;
        self.parsecount += 1;
        self.frames[self.parsecount as usize & UPDATE_MASK] = prev;
        self.validsequence = self.parsecount;
    }

    /// Record a player's state in the frame being parsed.
    pub fn update_player(&mut self, slot: usize, origin: Vec3, viewangles: Vec3, command: UserCmd) {
        if slot >= MAX_CLIENTS {
            return;
        }
        let parsecount = self.parsecount;
        let state = &mut self.frames[parsecount as usize & UPDATE_MASK].playerstate[slot];
        state.messagenum = parsecount;
        state.origin = origin;
        state.viewangles = viewangles;
        state.command = command;
    }

    pub fn player_state(&self, slot: usize) -> &PlayerState {
        &self.current_frame().playerstate[slot]
    }

    /// Carried by the newest parsed frame.
    pub fn is_current(&self, slot: usize) -> bool {
        slot < MAX_CLIENTS
            && self.validsequence != 0
            && self.player_state(slot).messagenum == self.parsecount
    }

    /// Carried by either of the two newest parsed frames.
    pub fn is_fresh(&self, slot: usize) -> bool {
        if slot >= MAX_CLIENTS || self.validsequence == 0 {
            return false;
        }
        let num = self.player_state(slot).messagenum;
        num == self.parsecount || num == self.oldparsecount
    }

    pub fn self_origin(&self) -> Vec3 {
        self.player_state(self.playernum).origin
    }

    pub fn set_self_origin(&mut self, origin: Vec3) {
        let playernum = self.playernum;
        self.current_frame_mut().playerstate[playernum].origin = origin;
    }

    // ========================================================
    // Scoreboard
    // ========================================================

    pub fn update_user_info(&mut self, slot: usize, userid: i32, name: &str, spectator: bool) {
        if let Some(info) = self.players.get_mut(slot) {
            info.userid = userid;
            info.name = name.to_string();
            info.spectator = spectator;
        }
    }

    pub fn remove_player(&mut self, slot: usize) {
        if let Some(info) = self.players.get_mut(slot) {
            *info = PlayerInfo::default();
        }
    }

    pub fn set_frags(&mut self, slot: usize, frags: i32) {
        if let Some(info) = self.players.get_mut(slot) {
            info.frags = frags;
        }
    }

    /// A slot the camera may follow: named and not a spectator.
    pub fn is_valid_target(&self, slot: usize) -> bool {
        self.players.get(slot).is_some_and(PlayerInfo::is_trackable)
    }

    pub fn first_trackable(&self) -> Option<usize> {
        (0..MAX_CLIENTS).find(|&i| self.is_valid_target(i))
    }

    /// Trackable slot with the most frags; the lowest slot wins ties.
    pub fn highest_fragger(&self) -> Option<usize> {
        let mut best = None;
        let mut max = -9999;
        for (i, info) in self.players.iter().enumerate() {
            if info.is_trackable() && info.frags > max {
                max = info.frags;
                best = Some(i);
            }
        }
        best
    }

    pub fn slot_for_userid(&self, userid: i32) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.is_active() && p.userid == userid)
    }

    pub fn slot_for_name(&self, name: &str) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.is_active() && p.name.eq_ignore_ascii_case(name))
    }
}
