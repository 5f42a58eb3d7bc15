//! Music queue: FIFO track requests driving the crossfade slots, with an
//! end-of-track monitor that advances on its own.

use std::collections::VecDeque;

use super::engine::{AudioEngine, EngineTask};
use super::scheduler::{Poll, TaskId};
use crate::backend::AudioBackend;
use crate::definitions::TrackRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Nothing queued and nothing current.
    Idle,
    Playing,
    /// Between a track ending and the next one being picked.
    Advancing,
}

#[derive(Debug)]
pub struct TrackQueue {
    pending: VecDeque<TrackRef>,
    current: Option<TrackRef>,
    starting: Vec<TrackRef>,
    state: QueueState,
}

impl TrackQueue {
    pub fn new(starting: Vec<TrackRef>) -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
            starting,
            state: QueueState::Idle,
        }
    }

    fn reload_starting(&mut self) {
        self.pending.extend(self.starting.iter().cloned());
    }

    pub fn starting_tracks(&self) -> &[TrackRef] {
        &self.starting
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackRef> {
        self.pending.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonitorStage {
    Yield,
    AwaitStart,
    AwaitEnd,
}

/// Watches one load of one music slot until it stops playing.
#[derive(Debug, Clone)]
pub struct TrackMonitor {
    slot: usize,
    load: u64,
    stage: MonitorStage,
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Queue the starting playlist and play its first track.
    pub fn start(&mut self) {
        self.queue.reload_starting();
        log::info!("music start, {} tracks queued", self.queue.pending.len());
        self.play_next();
    }

    /// Append a track. Starts playback when the queue was idle.
    pub fn enqueue(&mut self, track: TrackRef) {
        self.queue.pending.push_back(track);
        if self.queue.state == QueueState::Idle {
            self.play_next();
        }
    }

    /// Put a track at the head of the queue. Starts playback when idle.
    pub fn enqueue_front(&mut self, track: TrackRef) {
        self.queue.pending.push_front(track);
        if self.queue.state == QueueState::Idle {
            self.play_next();
        }
    }

    /// Crossfade to the next queued track, or the starting playlist when the
    /// queue is empty. With nothing to move to, the current track keeps
    /// playing.
    pub fn skip_to_next(&mut self) {
        if self.queue.pending.is_empty() && self.queue.starting.is_empty() {
            log::debug!("nothing to skip to");
            return;
        }
        self.advance();
    }

    fn advance(&mut self) {
        if self.queue.pending.is_empty() {
            self.queue.reload_starting();
        }
        self.play_next();
    }

    /// Interrupt the current track with `track`; the rest of the queue is kept.
    pub fn play_now(&mut self, track: TrackRef) {
        self.queue.pending.push_front(track);
        self.play_next();
    }

    /// Drop every queued track. The current one keeps playing.
    pub fn clear_queue(&mut self) {
        self.queue.pending.clear();
    }

    pub fn queue_len(&self) -> usize {
        self.queue.pending.len()
    }

    pub fn is_queue_empty(&self) -> bool {
        self.queue.pending.is_empty()
    }

    pub fn current_track(&self) -> Option<&TrackRef> {
        self.queue.current.as_ref()
    }

    pub fn queue_state(&self) -> QueueState {
        self.queue.state
    }

    pub fn track_queue(&self) -> &TrackQueue {
        &self.queue
    }

    pub(crate) fn play_next(&mut self) {
        if let Some(old) = self.monitor.take() {
            self.tasks.cancel(old);
        }
        let Some(track) = self.queue.pending.pop_front() else {
            log::info!("music queue drained");
            self.queue.current = None;
            self.queue.state = QueueState::Idle;
            return;
        };

        log::info!("now playing {}", track.clip);
        let (slot, load) = self.crossfade_to(&track, self.default_crossfade);
        self.queue.current = Some(track);
        self.queue.state = QueueState::Playing;
        self.monitor = Some(self.tasks.spawn(EngineTask::TrackMonitor(TrackMonitor {
            slot,
            load,
            stage: MonitorStage::Yield,
        })));
    }

    pub(crate) fn poll_monitor(
        &mut self,
        id: TaskId,
        monitor: &mut TrackMonitor,
        paused: bool,
    ) -> Poll {
        if monitor.stage == MonitorStage::Yield {
            monitor.stage = MonitorStage::AwaitStart;
            return Poll::Pending;
        }
        if paused {
            return Poll::Pending;
        }

        let slot = self.slots.slot(monitor.slot);
        if slot.load() != monitor.load {
            // Someone else reloaded the slot; this track is gone.
            if self.monitor == Some(id) {
                self.monitor = None;
            }
            return Poll::Done;
        }
        let playing = self.backend.is_playing(slot.channel());

        match monitor.stage {
            MonitorStage::AwaitStart if playing => {
                monitor.stage = MonitorStage::AwaitEnd;
                Poll::Pending
            }
            MonitorStage::AwaitStart => {
                let landed = self.slots.active_index() == monitor.slot && !self.is_crossfading();
                if !landed {
                    return Poll::Pending;
                }
                log::warn!("track on slot {} never started, moving on", monitor.slot);
                self.on_track_end(id);
                Poll::Done
            }
            MonitorStage::AwaitEnd if playing => Poll::Pending,
            _ => {
                self.on_track_end(id);
                Poll::Done
            }
        }
    }

    fn on_track_end(&mut self, id: TaskId) {
        if self.monitor == Some(id) {
            self.monitor = None;
        }
        self.queue.state = QueueState::Advancing;
        if let Some(track) = &self.queue.current {
            log::debug!("{} finished", track.clip);
        }
        self.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::testing::{engine_with, run_for, FRAME};
    use crate::backend::VirtualBackend;
    use crate::definitions::MusicTrackDefinition;

    fn track(clip: &str) -> TrackRef {
        TrackRef::new(MusicTrackDefinition::new(clip))
    }

    fn backend() -> VirtualBackend {
        ["a", "b", "c", "x", "s"]
            .into_iter()
            .fold(VirtualBackend::new(), |b, clip| b.with_clip(clip, 1.0))
            .with_clip("blank", 0.0)
    }

    /// Run for `seconds`, recording every music start in order.
    fn played(engine: &mut AudioEngine<VirtualBackend>, seconds: f32) -> Vec<String> {
        let mut order: Vec<String> = engine
            .current_track()
            .map(|t| t.clip.as_str().to_owned())
            .into_iter()
            .collect();
        let mut starts = engine.backend().total_starts();
        let frames = (seconds / FRAME).round() as usize;
        for _ in 0..frames {
            engine.tick(FRAME);
            if engine.backend().total_starts() != starts {
                starts = engine.backend().total_starts();
                if let Some(track) = engine.current_track() {
                    order.push(track.clip.as_str().to_owned());
                }
            }
        }
        order
    }

    #[test]
    fn queue_plays_in_order_then_repeats_the_starting_playlist() {
        let mut engine = engine_with(backend(), vec![track("s")]);
        engine.enqueue(track("a"));
        engine.enqueue(track("b"));
        engine.enqueue(track("c"));
        assert_eq!(engine.queue_len(), 2);

        let order = played(&mut engine, 4.5);
        assert_eq!(order, ["a", "b", "c", "s", "s"]);
        assert_eq!(engine.queue_state(), QueueState::Playing);
    }

    #[test]
    fn enqueue_front_goes_after_the_current_track() {
        let mut engine = engine_with(backend(), Vec::new());
        engine.enqueue(track("a"));
        engine.enqueue(track("b"));
        run_for(&mut engine, 0.25);
        engine.enqueue_front(track("x"));

        let order = played(&mut engine, 3.5);
        assert_eq!(order, ["a", "x", "b"]);
    }

    #[test]
    fn drained_queue_without_starting_playlist_goes_idle() {
        let mut engine = engine_with(backend(), Vec::new());
        engine.enqueue(track("a"));
        run_for(&mut engine, 1.5);
        assert_eq!(engine.queue_state(), QueueState::Idle);
        assert!(engine.current_track().is_none());

        engine.enqueue(track("b"));
        assert_eq!(engine.current_track().unwrap().clip.as_str(), "b");
        assert_eq!(engine.queue_state(), QueueState::Playing);
    }

    #[test]
    fn enqueue_front_starts_an_idle_queue() {
        let mut engine = engine_with(backend(), Vec::new());
        assert_eq!(engine.queue_state(), QueueState::Idle);
        engine.enqueue_front(track("x"));
        assert_eq!(engine.current_track().unwrap().clip.as_str(), "x");
        assert_eq!(engine.queue_state(), QueueState::Playing);
        assert!(engine.is_queue_empty());
    }

    #[test]
    fn skip_with_nothing_queued_keeps_the_current_track() {
        let mut engine = engine_with(backend().with_clip("long", 30.0), Vec::new());
        engine.enqueue(track("long"));
        run_for(&mut engine, 1.0);

        engine.skip_to_next();
        run_for(&mut engine, 1.0);
        assert_eq!(engine.current_track().unwrap().clip.as_str(), "long");
        assert_eq!(engine.queue_state(), QueueState::Playing);
        assert!(engine.backend().is_playing(engine.slots().active().channel()));
        assert!(engine.pending_tasks() >= 1);
    }

    #[test]
    fn single_starting_track_loops() {
        let t1 = track("s");
        let mut engine = engine_with(backend(), vec![t1.clone()]);
        engine.start();
        assert!(TrackRef::ptr_eq(engine.current_track().unwrap(), &t1));
        let first = engine.slots().idle().channel();
        assert!(engine.backend().is_playing(first));

        let order = played(&mut engine, 2.5);
        assert_eq!(order, ["s", "s", "s"]);
        assert!(TrackRef::ptr_eq(engine.current_track().unwrap(), &t1));
        assert!(engine.is_queue_empty());
    }

    #[test]
    fn pause_suspends_end_of_track_detection() {
        let mut engine = engine_with(backend(), Vec::new());
        engine.enqueue(track("a"));
        engine.enqueue(track("b"));
        run_for(&mut engine, 0.75);

        engine.set_paused(true);
        let channel = engine.slots().active().channel();
        engine.backend_mut().stop(channel);
        run_for(&mut engine, 3.0);
        assert_eq!(engine.current_track().unwrap().clip.as_str(), "a");
        assert_eq!(engine.queue_len(), 1);

        engine.set_paused(false);
        engine.tick(FRAME);
        assert_eq!(engine.current_track().unwrap().clip.as_str(), "b");
        assert_eq!(engine.queue_len(), 0);
    }

    #[test]
    fn skip_and_play_now() {
        let mut engine = engine_with(backend(), vec![track("s")]);
        engine.enqueue(track("a"));
        engine.enqueue(track("b"));
        engine.enqueue(track("c"));

        engine.skip_to_next();
        assert_eq!(engine.current_track().unwrap().clip.as_str(), "b");

        engine.play_now(track("x"));
        assert_eq!(engine.current_track().unwrap().clip.as_str(), "x");
        assert_eq!(engine.queue_len(), 1);

        engine.clear_queue();
        engine.skip_to_next();
        assert_eq!(engine.current_track().unwrap().clip.as_str(), "s");
    }

    #[test]
    fn clear_keeps_the_current_track_and_its_monitor() {
        let mut engine = engine_with(backend(), vec![track("s")]);
        engine.enqueue(track("a"));
        engine.enqueue(track("b"));
        engine.clear_queue();
        assert_eq!(engine.current_track().unwrap().clip.as_str(), "a");

        let order = played(&mut engine, 1.5);
        assert_eq!(order, ["a", "s"]);
    }

    #[test]
    fn rapid_skips_leave_one_fade_and_one_monitor() {
        let mut engine = engine_with(backend(), vec![track("s")]);
        engine.start();
        for _ in 0..5 {
            engine.tick(FRAME);
            engine.skip_to_next();
        }
        assert_eq!(engine.pending_tasks(), 2);
        run_for(&mut engine, 0.75);
        assert_eq!(engine.pending_tasks(), 1);
    }

    #[test]
    fn track_that_never_starts_does_not_stall_the_queue() {
        let mut engine = engine_with(backend(), Vec::new());
        engine.enqueue(track("blank"));
        engine.enqueue(track("a"));
        run_for(&mut engine, 1.0);
        assert_eq!(engine.current_track().unwrap().clip.as_str(), "a");
    }
}
