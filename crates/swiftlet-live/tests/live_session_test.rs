//! End-to-end live session tests: transport-style chunk delivery plus the
//! paced consumption task, driven on tokio's paused test clock so a full
//! simulated second costs no wall time.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use swiftlet_core::{AvFrame, AvFrameCodec, ChunkStore, EngineConfig, FrameCodec, Framer};
use swiftlet_live::LiveReconstructor;

fn test_frame(seq: u64) -> AvFrame {
    AvFrame {
        seq,
        video: vec![seq as u8; 32],
        audio: vec![0x55; 8],
    }
}

/// One record-aligned chunk carrying the frame with `seq`.
fn record_chunk(seq: u64) -> Vec<u8> {
    Framer::encode_record(&AvFrameCodec.encode(&test_frame(seq)).unwrap()).unwrap()
}

/// What the transport does per chunk: admit to the store, then notify.
fn deliver(recon: &LiveReconstructor, store: &ChunkStore, id: u64, bytes: Vec<u8>) {
    store.put(id, bytes.clone()).unwrap();
    recon.on_chunk_received(id, &bytes).unwrap();
}

/// Let `dur` of simulated time elapse.
///
/// Sleeping on the paused clock auto-advances through every timer deadline
/// inside the window, so each consumption slot ticks in turn; a single bulk
/// `advance` would resolve the whole window before the tick task's first
/// poll. The extra millisecond keeps a tick that lands exactly on the
/// boundary inside the window.
async fn run_for(dur: Duration) {
    tokio::time::sleep(dur + Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_starved_session_records_only_misses() {
    let store = Arc::new(ChunkStore::new());
    let recon = LiveReconstructor::new(&EngineConfig::default(), store).unwrap();

    recon.start_consuming().unwrap();
    run_for(Duration::from_secs(1)).await;
    let stats = recon.stop_consuming().await.unwrap();

    // 10 Hz for one second with nothing delivered: every slot missed.
    assert_eq!(stats.frames_missed, 10);
    assert_eq!(stats.frames_delivered, 0);
    assert_eq!(stats.missed_pct(), 100.0);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_stream_is_delivered_in_order() {
    let store = Arc::new(ChunkStore::new());
    let delivered: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&delivered);
    let recon = LiveReconstructor::new(&EngineConfig::default(), store.clone())
        .unwrap()
        .with_sink(move |frame| sink.lock().push(frame.seq));

    for id in [2, 4, 1, 3] {
        deliver(&recon, &store, id, record_chunk(id));
    }

    recon.start_consuming().unwrap();
    // Four slots at 10 Hz: every queued frame goes out, no slot is empty.
    run_for(Duration::from_millis(400)).await;
    let stats = recon.stop_consuming().await.unwrap();

    assert_eq!(delivered.lock().as_slice(), &[1, 2, 3, 4]);
    assert_eq!(stats.frames_delivered, 4);
    assert_eq!(stats.frames_missed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stall_turns_into_misses_then_recovers() {
    let store = Arc::new(ChunkStore::new());
    let recon = LiveReconstructor::new(&EngineConfig::default(), store.clone()).unwrap();

    deliver(&recon, &store, 1, record_chunk(1));
    deliver(&recon, &store, 2, record_chunk(2));

    recon.start_consuming().unwrap();
    // Two frames available, five slots: 2 delivered, 3 missed.
    run_for(Duration::from_millis(500)).await;
    let mid = recon.stats();
    assert_eq!(mid.frames_delivered, 2);
    assert_eq!(mid.frames_missed, 3);

    // The stream resumes; the missed slots stay missed.
    deliver(&recon, &store, 3, record_chunk(3));
    run_for(Duration::from_millis(100)).await;
    let stats = recon.stop_consuming().await.unwrap();
    assert_eq!(stats.frames_delivered, 3);
    assert_eq!(stats.frames_missed, 3);
    assert_eq!(stats.total_slots(), 6);
    assert_eq!(stats.delivered_pct(), 50.0);
}

#[tokio::test(start_paused = true)]
async fn test_custom_frame_rate_paces_slots() {
    let store = Arc::new(ChunkStore::new());
    let config = EngineConfig {
        frame_rate_hz: 25.0,
        ..EngineConfig::default()
    };
    let recon = LiveReconstructor::new(&config, store).unwrap();

    recon.start_consuming().unwrap();
    run_for(Duration::from_secs(2)).await;
    let stats = recon.stop_consuming().await.unwrap();
    assert_eq!(stats.total_slots(), 50);
}

#[tokio::test(start_paused = true)]
async fn test_counters_accumulate_across_restart() {
    let store = Arc::new(ChunkStore::new());
    let recon = LiveReconstructor::new(&EngineConfig::default(), store.clone()).unwrap();

    recon.start_consuming().unwrap();
    run_for(Duration::from_millis(300)).await;
    let first = recon.stop_consuming().await.unwrap();
    assert_eq!(first.total_slots(), 3);

    deliver(&recon, &store, 1, record_chunk(1));
    recon.start_consuming().unwrap();
    run_for(Duration::from_millis(200)).await;
    let second = recon.stop_consuming().await.unwrap();
    assert_eq!(second.frames_delivered, 1);
    assert_eq!(second.total_slots(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_receipt_while_consuming() {
    // Chunks trickling in between ticks: each slot finds exactly one frame.
    let store = Arc::new(ChunkStore::new());
    let delivered: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&delivered);
    let recon = LiveReconstructor::new(&EngineConfig::default(), store.clone())
        .unwrap()
        .with_sink(move |frame| sink.lock().push(frame.seq));

    recon.start_consuming().unwrap();
    for id in 1..=5 {
        deliver(&recon, &store, id, record_chunk(id));
        run_for(Duration::from_millis(100)).await;
    }
    let stats = recon.stop_consuming().await.unwrap();

    assert_eq!(delivered.lock().as_slice(), &[1, 2, 3, 4, 5]);
    assert_eq!(stats.frames_delivered, 5);
    assert_eq!(stats.frames_missed, 0);
}
