//! Real-time reconstruction of a frame stream from unordered chunks.
//!
//! The live path has two independent timing domains. Inbound, the
//! transport calls [`LiveReconstructor::on_chunk_received`] as chunks
//! arrive, in whatever order the swarm delivers them; the reconstructor
//! tracks the next expected id, fills gaps from the chunk store, and runs
//! completed byte records through the frame codec into a ready-queue.
//! Outbound, a tokio tick task started by
//! [`LiveReconstructor::start_consuming`] pops at most one frame per
//! presentation slot at the configured frame rate; an empty slot is
//! counted as a missed frame and never made up, because playback cannot
//! rewind.
//!
//! Neither side blocks the other: receipt touches the reconstruction
//! state, the tick touches the ready-queue, and both critical sections
//! are short.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use swiftlet_core::{ChunkStore, EngineConfig};
//! use swiftlet_live::LiveReconstructor;
//!
//! # async fn run() -> swiftlet_live::Result<()> {
//! let store = Arc::new(ChunkStore::new());
//! let recon = LiveReconstructor::new(&EngineConfig::default(), store.clone())?;
//! recon.start_consuming()?;
//! // transport: store.put(id, bytes) then recon.on_chunk_received(id, &bytes)
//! let stats = recon.stop_consuming().await?;
//! println!("delivered {} missed {}", stats.frames_delivered, stats.frames_missed);
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use swiftlet_core::{
    AvFrame, AvFrameCodec, ChunkAvailability, ChunkId, EngineConfig, FrameCodec, Framer,
};

use crate::error::{LiveError, Result};
use crate::stats::SessionStats;

/// Default id of the first chunk of a live stream.
pub const DEFAULT_FIRST_CHUNK_ID: ChunkId = 1;

/// Frames delivered between periodic progress log lines.
const DELIVERY_LOG_EVERY: u64 = 25;

/// Receives each frame the tick task delivers.
pub type FrameSink = Box<dyn FnMut(AvFrame) + Send>;

/// Reconstruction cursor plus the framer it feeds.
struct ReconState {
    next_expected: ChunkId,
    highest_seen: Option<ChunkId>,
    framer: Framer,
}

/// State shared with the consumption tick task.
struct SharedState {
    ready: Mutex<VecDeque<AvFrame>>,
    stats: Mutex<SessionStats>,
    sink: Mutex<Option<FrameSink>>,
}

impl SharedState {
    /// One presentation slot: deliver a frame or record a miss.
    fn tick(&self) {
        let frame = self.ready.lock().pop_front();
        match frame {
            Some(frame) => {
                let delivered = {
                    let mut stats = self.stats.lock();
                    stats.frames_delivered += 1;
                    stats.frames_delivered
                };
                if delivered % DELIVERY_LOG_EVERY == 0 {
                    tracing::info!(
                        seq = frame.seq,
                        video_len = frame.video.len(),
                        audio_len = frame.audio.len(),
                        delivered,
                        "delivered frame"
                    );
                }
                if let Some(sink) = self.sink.lock().as_mut() {
                    sink(frame);
                }
            }
            None => {
                self.stats.lock().frames_missed += 1;
            }
        }
    }
}

/// Handle to the running tick task.
struct ConsumeTask {
    token: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

/// Live session pipeline: unordered chunks in, paced in-order frames out.
///
/// The transport stores each verified chunk in the shared store and then
/// notifies this reconstructor; the reconstructor only ever reads chunks
/// back through the gap-tolerant [`ChunkAvailability`] interface.
pub struct LiveReconstructor {
    store: Arc<dyn ChunkAvailability>,
    codec: Box<dyn FrameCodec>,
    frame_rate_hz: f64,
    recon: Mutex<ReconState>,
    /// Payloads completed by the framer callback, drained after each push.
    pending: Arc<Mutex<Vec<Vec<u8>>>>,
    shared: Arc<SharedState>,
    task: Mutex<Option<ConsumeTask>>,
}

impl LiveReconstructor {
    /// Create a session over `store`, expecting the first chunk at id
    /// [`DEFAULT_FIRST_CHUNK_ID`].
    ///
    /// # Errors
    ///
    /// Returns the validation error for an unusable configuration.
    pub fn new(config: &EngineConfig, store: Arc<dyn ChunkAvailability>) -> Result<Self> {
        config.validate()?;
        let pending: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
        let completed = Arc::clone(&pending);
        Ok(Self {
            store,
            codec: Box::new(AvFrameCodec),
            frame_rate_hz: config.frame_rate_hz,
            recon: Mutex::new(ReconState {
                next_expected: DEFAULT_FIRST_CHUNK_ID,
                highest_seen: None,
                framer: Framer::new(move |payload| completed.lock().push(payload)),
            }),
            pending,
            shared: Arc::new(SharedState {
                ready: Mutex::new(VecDeque::new()),
                stats: Mutex::new(SessionStats::default()),
                sink: Mutex::new(None),
            }),
            task: Mutex::new(None),
        })
    }

    /// Expect the stream to start at `first_id` instead of the default.
    /// Must be called before the first chunk is received.
    pub fn with_first_id(self, first_id: ChunkId) -> Self {
        {
            let mut state = self.recon.lock();
            state.next_expected = first_id;
            state.highest_seen = None;
        }
        self
    }

    /// Replace the frame codec. Must be called before the first chunk is
    /// received.
    pub fn with_codec(mut self, codec: Box<dyn FrameCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Install a sink receiving every frame the tick task delivers.
    /// Without one, delivered frames are accounted and dropped.
    pub fn with_sink<F>(self, sink: F) -> Self
    where
        F: FnMut(AvFrame) + Send + 'static,
    {
        *self.shared.sink.lock() = Some(Box::new(sink));
        self
    }

    /// Accept a chunk from the transport.
    ///
    /// Updates the highwater mark, feeds the chunk to the framer when it
    /// is the next expected one, then drains every consecutively available
    /// chunk out of the store. Ids below the cursor are late duplicates
    /// and ignored; ids above it wait in the store until the gap closes.
    /// Never blocks on anything but the internal locks.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::Core`] for framing or decode failures, both of
    /// which mean the byte stream is corrupt; the session owner decides
    /// whether to reset or tear down.
    pub fn on_chunk_received(&self, id: ChunkId, bytes: &[u8]) -> Result<()> {
        let mut state = self.recon.lock();
        state.highest_seen = Some(state.highest_seen.map_or(id, |h| h.max(id)));

        if id == state.next_expected {
            state.framer.push(bytes)?;
            state.next_expected += 1;
            tracing::trace!(id, "fed chunk");
        }
        while let Some(block) = self.store.chunk(state.next_expected) {
            let filled = state.next_expected;
            state.framer.push(&block)?;
            tracing::trace!(id = filled, "gap-filled chunk");
            // Chunks can land in the store without a notification; the
            // highwater mark must cover them once the cursor passes.
            state.highest_seen = Some(state.highest_seen.map_or(filled, |h| h.max(filled)));
            state.next_expected = filled + 1;
        }

        let payloads: Vec<Vec<u8>> = self.pending.lock().drain(..).collect();
        for payload in payloads {
            let frame = self.codec.decode(&payload)?;
            tracing::debug!(
                seq = frame.seq,
                len = payload.len(),
                "frame reconstructed"
            );
            self.shared.ready.lock().push_back(frame);
        }
        Ok(())
    }

    /// Start the paced consumption task at the configured frame rate.
    ///
    /// Each tick one presentation slot elapses: a frame is popped from the
    /// ready-queue, or the slot is counted as missed. The first slot lands
    /// one period after this call. Must run inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::AlreadyStarted`] if the task is running.
    pub fn start_consuming(&self) -> Result<()> {
        let mut slot = self.task.lock();
        if slot.is_some() {
            return Err(LiveError::AlreadyStarted);
        }

        let period = Duration::from_secs_f64(1.0 / self.frame_rate_hz);
        // Anchor the slot schedule at the start call, not at the task's
        // first poll.
        let first_slot = tokio::time::Instant::now() + period;
        let token = CancellationToken::new();
        let cancel = token.clone();
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_slot, period);
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        tracing::debug!("consumption loop cancelled");
                        break;
                    }
                    _ = ticker.tick() => shared.tick(),
                }
            }
        });
        *slot = Some(ConsumeTask { token, handle });

        tracing::info!(rate_hz = self.frame_rate_hz, "consumption started");
        Ok(())
    }

    /// Stop the consumption task and return the final stats snapshot.
    ///
    /// Cancels the tick loop and awaits the task, so an in-flight tick
    /// completes before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::NotStarted`] if no task is running.
    pub async fn stop_consuming(&self) -> Result<SessionStats> {
        let task = self.task.lock().take().ok_or(LiveError::NotStarted)?;
        task.token.cancel();
        if let Err(e) = task.handle.await {
            tracing::warn!(error = %e, "consumption task ended abnormally");
        }

        let stats = *self.shared.stats.lock();
        tracing::info!(
            delivered = stats.frames_delivered,
            missed = stats.frames_missed,
            delivered_pct = stats.delivered_pct(),
            missed_pct = stats.missed_pct(),
            "consumption stopped"
        );
        Ok(stats)
    }

    /// Whether the tick task is running.
    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }

    /// Pop the oldest completed frame without waiting for a tick.
    /// Unpaced consumption for callers that bring their own clock; not
    /// tracked in the delivery counters.
    pub fn pop_ready(&self) -> Option<AvFrame> {
        self.shared.ready.lock().pop_front()
    }

    /// Completed frames currently queued.
    pub fn ready_len(&self) -> usize {
        self.shared.ready.lock().len()
    }

    /// Snapshot of the delivery counters.
    pub fn stats(&self) -> SessionStats {
        *self.shared.stats.lock()
    }

    /// Id the reconstruction cursor is waiting for.
    pub fn next_expected(&self) -> ChunkId {
        self.recon.lock().next_expected
    }

    /// Highest chunk id seen so far, `None` before the first receipt.
    pub fn highest_seen(&self) -> Option<ChunkId> {
        self.recon.lock().highest_seen
    }
}

impl fmt::Debug for LiveReconstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveReconstructor")
            .field("frame_rate_hz", &self.frame_rate_hz)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Drop for LiveReconstructor {
    fn drop(&mut self) {
        // The task owns a clone of the shared state; cancel it so it does
        // not tick forever after the session handle is gone.
        if let Some(task) = self.task.lock().take() {
            task.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use swiftlet_core::{ChunkStore, CoreError};

    use super::*;

    fn test_frame(seq: u64) -> AvFrame {
        AvFrame {
            seq,
            video: vec![seq as u8; 24],
            audio: vec![!(seq as u8); 8],
        }
    }

    /// One record-aligned chunk carrying the frame with `seq`.
    fn record_chunk(seq: u64) -> Vec<u8> {
        Framer::encode_record(&AvFrameCodec.encode(&test_frame(seq)).unwrap()).unwrap()
    }

    /// What the transport does per chunk: admit to the store, then notify.
    fn deliver(recon: &LiveReconstructor, store: &ChunkStore, id: ChunkId, bytes: Vec<u8>) {
        store.put(id, bytes.clone()).unwrap();
        recon.on_chunk_received(id, &bytes).unwrap();
    }

    fn session() -> (LiveReconstructor, Arc<ChunkStore>) {
        let store = Arc::new(ChunkStore::new());
        let recon = LiveReconstructor::new(&EngineConfig::default(), store.clone()).unwrap();
        (recon, store)
    }

    fn drain_seqs(recon: &LiveReconstructor) -> Vec<u64> {
        let mut seqs = Vec::new();
        while let Some(frame) = recon.pop_ready() {
            seqs.push(frame.seq);
        }
        seqs
    }

    #[test]
    fn test_in_order_delivery() {
        let (recon, store) = session();
        for id in 1..=4 {
            deliver(&recon, &store, id, record_chunk(id));
        }
        assert_eq!(drain_seqs(&recon), vec![1, 2, 3, 4]);
        assert_eq!(recon.next_expected(), 5);
        assert_eq!(recon.highest_seen(), Some(4));
    }

    #[test]
    fn test_out_of_order_gap_fill() {
        let (recon, store) = session();
        for id in [3, 1, 2, 4] {
            deliver(&recon, &store, id, record_chunk(id));
        }
        assert_eq!(drain_seqs(&recon), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_gap_fill_reaches_highest_seen() {
        // 2,4,1,3: when 3 arrives the cursor must run all the way to 4,
        // even though 4 is the highest id seen.
        let (recon, store) = session();
        for id in [2, 4, 1, 3] {
            deliver(&recon, &store, id, record_chunk(id));
        }
        assert_eq!(drain_seqs(&recon), vec![1, 2, 3, 4]);
        assert_eq!(recon.next_expected(), 5);
    }

    #[test]
    fn test_gap_fill_tracks_highest_seen() {
        // Chunks that land in the store without a notification must still
        // move the highwater mark when the gap-fill walk consumes them.
        let (recon, store) = session();
        store.put(2, record_chunk(2)).unwrap();
        store.put(3, record_chunk(3)).unwrap();

        deliver(&recon, &store, 1, record_chunk(1));
        assert_eq!(drain_seqs(&recon), vec![1, 2, 3]);
        assert_eq!(recon.next_expected(), 4);
        assert_eq!(recon.highest_seen(), Some(3));
    }

    #[test]
    fn test_unclosed_gap_holds_later_frames() {
        let (recon, store) = session();
        deliver(&recon, &store, 1, record_chunk(1));
        deliver(&recon, &store, 3, record_chunk(3));
        deliver(&recon, &store, 4, record_chunk(4));
        // 2 never arrived; only frame 1 may come out.
        assert_eq!(drain_seqs(&recon), vec![1]);
        assert_eq!(recon.next_expected(), 2);
        assert_eq!(recon.highest_seen(), Some(4));

        deliver(&recon, &store, 2, record_chunk(2));
        assert_eq!(drain_seqs(&recon), vec![2, 3, 4]);
    }

    #[test]
    fn test_late_duplicate_is_ignored() {
        let (recon, store) = session();
        for id in 1..=3 {
            deliver(&recon, &store, id, record_chunk(id));
        }
        assert_eq!(drain_seqs(&recon), vec![1, 2, 3]);
        // Same chunk again: store accepts the idempotent put, the cursor
        // does not move, no frame is re-delivered.
        deliver(&recon, &store, 2, record_chunk(2));
        assert_eq!(drain_seqs(&recon), Vec::<u64>::new());
        assert_eq!(recon.next_expected(), 4);
    }

    #[test]
    fn test_frame_spanning_two_chunks() {
        let (recon, store) = session();
        let record = record_chunk(1);
        let (head, tail) = record.split_at(record.len() / 2);

        // Tail first: nothing completes until the gap closes.
        deliver(&recon, &store, 2, tail.to_vec());
        assert_eq!(recon.ready_len(), 0);
        deliver(&recon, &store, 1, head.to_vec());
        assert_eq!(drain_seqs(&recon), vec![1]);
    }

    #[test]
    fn test_two_frames_in_one_chunk() {
        let (recon, store) = session();
        let mut block = record_chunk(1);
        block.extend(record_chunk(2));
        deliver(&recon, &store, 1, block);
        assert_eq!(drain_seqs(&recon), vec![1, 2]);
    }

    #[test]
    fn test_custom_first_id() {
        let store = Arc::new(ChunkStore::new());
        let recon = LiveReconstructor::new(&EngineConfig::default(), store.clone())
            .unwrap()
            .with_first_id(0);
        deliver(&recon, &store, 0, record_chunk(7));
        assert_eq!(drain_seqs(&recon), vec![7]);
        assert_eq!(recon.next_expected(), 1);
    }

    #[test]
    fn test_corrupt_length_prefix_surfaces() {
        let (recon, _store) = session();
        let err = recon.on_chunk_received(1, &[0xFF; 8]).unwrap_err();
        assert!(matches!(
            err,
            LiveError::Core(CoreError::RecordTooLarge { .. })
        ));
    }

    #[test]
    fn test_undecodable_record_surfaces() {
        let (recon, _store) = session();
        // A well-framed record whose payload is shorter than a frame header.
        let block = Framer::encode_record(&[1, 2, 3]).unwrap();
        let err = recon.on_chunk_received(1, &block).unwrap_err();
        assert!(matches!(
            err,
            LiveError::Core(CoreError::FrameLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let store = Arc::new(ChunkStore::new());
        let config = EngineConfig {
            frame_rate_hz: 0.0,
            ..EngineConfig::default()
        };
        let result = LiveReconstructor::new(&config, store);
        assert!(matches!(
            result,
            Err(LiveError::Core(CoreError::InvalidFrameRate(_)))
        ));
    }

    #[tokio::test]
    async fn test_lifecycle_misuse() {
        let (recon, _store) = session();
        assert!(matches!(
            recon.stop_consuming().await.unwrap_err(),
            LiveError::NotStarted
        ));

        recon.start_consuming().unwrap();
        assert!(recon.is_running());
        assert!(matches!(
            recon.start_consuming().unwrap_err(),
            LiveError::AlreadyStarted
        ));

        recon.stop_consuming().await.unwrap();
        assert!(!recon.is_running());
        // Restart after a clean stop is allowed.
        recon.start_consuming().unwrap();
        recon.stop_consuming().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_ticks_count_as_missed() {
        let (recon, _store) = session();
        recon.start_consuming().unwrap();
        // Sleeping on the paused clock auto-advances through every slot
        // deadline in the window, so each tick fires in turn; a single
        // bulk advance would resolve the window before the first poll.
        tokio::time::sleep(Duration::from_millis(1001)).await;
        let stats = recon.stop_consuming().await.unwrap();
        assert_eq!(stats.frames_missed, 10);
        assert_eq!(stats.frames_delivered, 0);
    }
}
