// Entry point — headless spectator simulation
//
// Runs a ClientSession against a scripted arena:
//   1. Parse +set / +command arguments into console text
//   2. Connect as a spectator and run the startup commands
//   3. Step the arena and the client once per tick, publishing the camera
//      view to the view thread
//   4. Change map a third of the way in, drop and rejoin at two thirds
//
// Try: qwspec-sim +set cl_hightrack 1 +set sim_seconds 20
//      qwspec-sim +track charlie +set cl_chasecam 0

use std::time::Duration;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use qwspec_client::cl_main::ClientSession;
use qwspec_client::cl_multiview::NoMultiview;
use qwspec_client::cl_timing::{Clock, ManualClock};
use qwspec_client::client::{ClcMessage, Playback};
use qwspec_common::common::com_printf;
use qwspec_common::cvar::CvarError;
use qwspec_sys::sim::{startup_commands, Arena};
use qwspec_sys::view_thread::ViewThread;

const SPECTATOR_SLOT: usize = 0;
const SPECTATOR_USERID: i32 = 100;
/// Server frame rate of the scripted arena.
const TICK_RATE: f64 = 72.0;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn register_sim_cvars(session: &mut ClientSession) -> Result<(), CvarError> {
    session.cvars.get("sim_seconds", "30", 0)?;
    // 1 = sleep between ticks so the run takes wall-clock time
    session.cvars.get("sim_realtime", "0", 0)?;
    Ok(())
}

fn join(session: &mut ClientSession, arena: &Arena) {
    session.connect(SPECTATOR_SLOT, true, Playback::Live);
    session.update_user_info(SPECTATOR_SLOT, SPECTATOR_USERID, "sim", true);
    arena.introduce(session);
}

fn log_outgoing(session: &mut ClientSession) {
    for msg in session.take_outgoing() {
        match msg {
            ClcMessage::StringCmd(text) => tracing::info!(%text, "clc_stringcmd"),
            ClcMessage::TeleportMove(origin) => tracing::trace!(?origin, "clc_tmove"),
        }
    }
}

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (early, late) = startup_commands(&args);

    let mut session = match ClientSession::new(Box::new(Arena::world()), Box::new(NoMultiview)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("client init failed: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = register_sim_cvars(&mut session) {
        tracing::error!("sim init failed: {}", e);
        std::process::exit(1);
    }
    session.execute_text(&early);

    let mut arena = Arena::standard();
    join(&mut session, &arena);
    session.execute_text(&late);

    let mut view_thread = match ViewThread::spawn() {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("couldn't start view thread: {}", e);
            std::process::exit(1);
        }
    };

    let duration = session.cvars.variable_value("sim_seconds").max(1.0) as f64;
    let realtime = session.cvars.variable_integer("sim_realtime") != 0;
    let map_change_at = duration / 3.0;
    let rejoin_at = duration * 2.0 / 3.0;
    let mut map_changed = false;
    let mut rejoined = false;

    let clock = ManualClock::new(0.0);
    let dt = 1.0 / TICK_RATE;
    tracing::info!(duration, "simulation start");

    while clock.now() < duration {
        clock.advance(dt);
        let t = clock.now();

        if !map_changed && t >= map_change_at {
            map_changed = true;
            session.new_map();
            arena.introduce(&mut session);
        }
        if !rejoined && t >= rejoin_at {
            rejoined = true;
            session.disconnect();
            join(&mut session, &arena);
            session.execute_text(&late);
        }

        arena.step(&mut session, t);
        session.frame(&clock);
        log_outgoing(&mut session);
        view_thread.publish(session.view());

        if realtime {
            std::thread::sleep(Duration::from_secs_f64(dt));
        }
    }

    let stats = view_thread.shutdown();
    com_printf(&format!(
        "{} frames drawn, {} dropped, {} camera cuts\n",
        stats.frames, stats.dropped, stats.cuts
    ));
    if let Some(last) = stats.last {
        com_printf(&format!(
            "final view: player {} mode {:?} locked {}\n",
            last.viewplayer, last.mode, last.locked
        ));
    }
}
