// view_thread.rs — renderer stand-in fed camera snapshots from the client
//
// The client thread publishes one CameraView per frame. The view thread keeps
// only the newest one; if it falls behind, older snapshots are dropped.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use qwspec_client::cl_cam::CamMode;
use qwspec_client::cl_main::CameraView;

/// What the view thread has drawn so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewStats {
    pub frames: u64,
    /// Snapshots dropped because the view thread was busy.
    pub dropped: u64,
    /// Times the drawn player or camera mode changed.
    pub cuts: u64,
    pub last: Option<CameraView>,
}

pub struct ViewThread {
    sender: Option<Sender<CameraView>>,
    handle: Option<JoinHandle<()>>,
    pub stats: Arc<Mutex<ViewStats>>,
}

impl ViewThread {
    pub fn spawn() -> io::Result<Self> {
        let (sender, receiver) = channel::bounded(1);
        let stats = Arc::new(Mutex::new(ViewStats::default()));
        let thread_stats = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name("view".into())
            .spawn(move || view_loop(receiver, thread_stats))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            stats,
        })
    }

    /// Hand a snapshot to the view thread without blocking.
    pub fn publish(&self, view: CameraView) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(view) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.stats.lock().dropped += 1,
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("view thread is gone");
            }
        }
    }

    /// Close the channel and wait for the thread to drain it.
    pub fn shutdown(&mut self) -> ViewStats {
        self.sender = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("view thread panicked");
            }
        }
        self.stats.lock().clone()
    }
}

impl Drop for ViewThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn view_loop(receiver: Receiver<CameraView>, stats: Arc<Mutex<ViewStats>>) {
    while let Ok(view) = receiver.recv() {
        let mut stats = stats.lock();
        let cut = stats
            .last
            .as_ref()
            .is_some_and(|last| last.viewplayer != view.viewplayer || last.mode != view.mode);
        if cut {
            stats.cuts += 1;
            tracing::info!(
                viewplayer = view.viewplayer,
                mode = ?view.mode,
                locked = view.locked,
                t = view.realtime,
                "camera cut"
            );
        }
        if view.mode == CamMode::Track && !view.locked {
            tracing::trace!(t = view.realtime, "searching vantage");
        }
        stats.frames += 1;
        stats.last = Some(view);
    }
    tracing::debug!("view thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_frames_and_cuts() {
        let mut vt = ViewThread::spawn().unwrap();
        let mut view = CameraView::default();
        vt.publish(view);
        // wait for the slot to free up so nothing is dropped
        while vt.stats.lock().frames < 1 {
            thread::yield_now();
        }
        view.viewplayer = 3;
        view.mode = CamMode::Track;
        vt.publish(view);

        let stats = vt.shutdown();
        assert_eq!(stats.frames + stats.dropped, 2);
        if stats.frames == 2 {
            assert_eq!(stats.cuts, 1);
            assert_eq!(stats.last.map(|v| v.viewplayer), Some(3));
        }
    }

    #[test]
    fn test_shutdown_twice() {
        let mut vt = ViewThread::spawn().unwrap();
        vt.shutdown();
        let stats = vt.shutdown();
        assert_eq!(stats.frames, 0);
        vt.publish(CameraView::default());
    }
}
