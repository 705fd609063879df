//! Asynchronous caption decode pipeline.
//!
//! The feeder buffers raw data groups from the demuxer in a decode-time
//! index. The playback clock drives decoding: each [`CaptionFeeder::content`]
//! call hands every newly due segment to the worker task exactly once,
//! then floor-queries the presentation-time index for the active cue.
//! Resets (attach, detach, seek) drop both indices and the worker's
//! tokenizer session; stale in-flight work is discarded by generation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use b24::{
    C1Addressing, CaptionDataGroup, CaptionProfile, GroupPayload, ParsedToken, Parser, Tokenizer,
    replace_drcs,
};
use interval_index::IntervalIndex;

use crate::cue::{CaptionLanguage, Cue, RawSegment};
use crate::time::{CueDuration, Timestamp};

#[derive(Error, Debug)]
pub enum FeederError {
    /// The worker task is gone; the feeder was closed.
    #[error("caption feeder is closed")]
    Closed,
}

/// Decoding configuration, fixed for the lifetime of a feeder.
#[derive(Debug, Clone)]
pub struct FeederConfig {
    pub profile: CaptionProfile,
    pub c1_addressing: C1Addressing,
    /// Statement language id to decode (1..=15). Management records
    /// are always processed.
    pub language: u8,
    /// Seconds subtracted from the playback clock before the
    /// presentation-index lookup.
    pub timeshift: f64,
    /// Integer scale applied to the caption plane geometry.
    pub magnification: u32,
    /// DRCS bitmap digest to replacement text, applied before layout.
    pub drcs_replacement: HashMap<String, String>,
}

impl Default for FeederConfig {
    fn default() -> Self {
        FeederConfig {
            profile: CaptionProfile::default(),
            c1_addressing: C1Addressing::default(),
            language: 1,
            timeshift: 0.0,
            magnification: 1,
            drcs_replacement: HashMap::new(),
        }
    }
}

enum Command {
    Decode {
        generation: u64,
        seq: u64,
        segment: RawSegment,
    },
    /// Discard tokenizer session state (designators, DRCS registry).
    Reset,
}

struct Shared {
    decode: Mutex<IntervalIndex<Timestamp, RawSegment>>,
    presentation: Mutex<IntervalIndex<Timestamp, Cue>>,
    languages: Mutex<Vec<CaptionLanguage>>,
    /// Bumped on every reset; stale in-flight batches are discarded by
    /// the worker.
    generation: AtomicU64,
    /// Highest playback time already flushed to the worker. Segments
    /// at or before it are never flushed again.
    last_queried: Mutex<Option<Timestamp>>,
}

/// Caption decode pipeline handle.
pub struct CaptionFeeder {
    shared: Arc<Shared>,
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    processed: watch::Receiver<u64>,
    next_seq: AtomicU64,
    timeshift: f64,
    worker: JoinHandle<()>,
}

impl CaptionFeeder {
    /// Creates the feeder and spawns its decode worker on the current
    /// tokio runtime.
    pub fn new(config: FeederConfig) -> CaptionFeeder {
        let shared = Arc::new(Shared {
            decode: Mutex::new(IntervalIndex::new()),
            presentation: Mutex::new(IntervalIndex::new()),
            languages: Mutex::new(Vec::new()),
            generation: AtomicU64::new(0),
            last_queried: Mutex::new(None),
        });
        let (commands, rx) = mpsc::unbounded_channel();
        let (processed_tx, processed) = watch::channel(0u64);
        let cancel = CancellationToken::new();
        let timeshift = config.timeshift;

        let worker = tokio::spawn(run_worker(
            rx,
            Arc::clone(&shared),
            config,
            cancel.clone(),
            processed_tx,
        ));

        CaptionFeeder {
            shared,
            commands,
            cancel,
            processed,
            next_seq: AtomicU64::new(0),
            timeshift,
            worker,
        }
    }

    /// Buffers one segment from the demuxer. A segment whose decode
    /// time the playback clock has not reached yet waits in the decode
    /// index; one already at or behind the queried clock is handed to
    /// the worker right away.
    pub fn feed(&self, segment: RawSegment) {
        let mut decode = self.shared.decode.lock();
        let last_queried = self.shared.last_queried.lock();
        if last_queried.is_some_and(|watermark| segment.decode_time <= watermark) {
            self.send_decode(segment.clone());
        }
        decode.insert(segment.decode_time, segment);
    }

    /// The cue on screen at `playback_time`, if any.
    ///
    /// Every buffered segment whose decode time newly came due is
    /// first handed to the worker (exactly once per segment), then the
    /// presentation index is floor-queried at `playback_time` minus
    /// the timeshift. A later cue supersedes an earlier unbounded one
    /// because the lookup takes the latest start at or before the
    /// query time.
    pub fn content(&self, playback_time: Timestamp) -> Option<Cue> {
        self.flush_due(playback_time);

        let query = playback_time.offset_seconds(-self.timeshift);
        let presentation = self.shared.presentation.lock();
        let (_, cue) = presentation.floor(&query)?;
        cue.contains(query).then(|| cue.clone())
    }

    /// Sends segments with decode time in `(last_queried, up_to]` to
    /// the worker and advances the watermark. Segments at or behind the
    /// watermark were already sent, either by an earlier flush or by
    /// `feed` itself.
    fn flush_due(&self, up_to: Timestamp) {
        let decode = self.shared.decode.lock();
        let mut last_queried = self.shared.last_queried.lock();
        let from = match *last_queried {
            Some(t) if t >= up_to => return,
            Some(t) => t.next(),
            None => Timestamp::MIN,
        };

        let mut flushed = 0usize;
        for segment in decode.range(from, up_to.next()) {
            self.send_decode(segment.clone());
            flushed += 1;
        }
        if flushed > 0 {
            trace!(flushed, up_to = up_to.as_seconds(), "flushed due caption segments");
        }
        *last_queried = Some(up_to);
    }

    fn send_decode(&self, segment: RawSegment) {
        let generation = self.shared.generation.load(Ordering::Acquire);
        let seq = self.next_seq.fetch_add(1, Ordering::AcqRel) + 1;
        if self
            .commands
            .send(Command::Decode {
                generation,
                seq,
                segment,
            })
            .is_err()
        {
            warn!("caption decode worker is gone, dropping segment");
        }
    }

    /// The language table from the latest management record.
    pub fn languages(&self) -> Vec<CaptionLanguage> {
        self.shared.languages.lock().clone()
    }

    fn reset(&self) -> Result<(), FeederError> {
        // The bump precedes the clears so an in-flight batch is stale
        // before the indices empty; the worker rechecks at insert.
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.shared.decode.lock().clear();
        self.shared.presentation.lock().clear();
        self.shared.languages.lock().clear();
        *self.shared.last_queried.lock() = None;
        self.commands
            .send(Command::Reset)
            .map_err(|_| FeederError::Closed)
    }

    /// Binds to a new media source.
    pub fn on_attach(&self) -> Result<(), FeederError> {
        debug!("caption feeder attached");
        self.reset()
    }

    /// Unbinds from the current media source.
    pub fn on_detach(&self) -> Result<(), FeederError> {
        debug!("caption feeder detached");
        self.reset()
    }

    /// Handles a seek: nothing decoded or buffered before the seek may
    /// ever surface again; decoding restarts from whatever the demuxer
    /// feeds next.
    pub fn on_seeking(&self) -> Result<(), FeederError> {
        debug!("caption feeder reset by seek");
        self.reset()
    }

    /// Waits until the worker has processed everything flushed so far.
    pub async fn synchronize(&self) {
        let target = self.next_seq.load(Ordering::Acquire);
        let mut processed = self.processed.clone();
        while *processed.borrow() < target {
            if processed.changed().await.is_err() {
                break;
            }
        }
    }

    /// Cancels the worker and waits for it to finish.
    pub async fn close(self) {
        self.cancel.cancel();
        let _ = self.worker.await;
    }
}

/// Per-session decode state owned by the worker task.
struct Session {
    tokenizer: Tokenizer,
    parser: Parser,
    config: FeederConfig,
}

impl Session {
    fn new(config: &FeederConfig) -> Session {
        Session {
            tokenizer: Tokenizer::with_c1(config.profile.descriptor(), config.c1_addressing),
            parser: Parser::new(config.magnification),
            config: config.clone(),
        }
    }

    fn decode(&mut self, shared: &Shared, segment: &RawSegment) -> b24::Result<Option<Cue>> {
        let group = CaptionDataGroup::parse(&segment.data)?;
        let start = segment.presentation_time;

        match &group.payload {
            GroupPayload::Management(management) => {
                *shared.languages.lock() = management
                    .languages
                    .iter()
                    .map(|entry| CaptionLanguage {
                        tag: entry.tag,
                        iso_code: entry.iso_code.clone(),
                        display_mode: entry.display_mode,
                    })
                    .collect();
                // Registers any DRCS units the management record
                // carries.
                self.tokenizer.tokenize(&group)?;

                // A management record erases the display; modeled as an
                // empty cue so it supersedes an unbounded statement.
                Ok(Some(Cue {
                    presentation_time: start,
                    duration: CueDuration::Seconds(0.0),
                    initial_state: self.parser.initial_state(),
                    tokens: Vec::new(),
                    text: String::new(),
                    language: None,
                }))
            }
            GroupPayload::Statement(_) => {
                if group.language_id != self.config.language {
                    trace!(
                        language_id = group.language_id,
                        "skipping statement for unselected language"
                    );
                    return Ok(None);
                }
                let language = shared
                    .languages
                    .lock()
                    .iter()
                    .find(|entry| entry.tag + 1 == group.language_id)
                    .cloned();

                let mut tokens = self.tokenizer.tokenize(&group)?;
                replace_drcs(&mut tokens, &self.config.drcs_replacement);
                let initial_state = self.parser.initial_state();
                let parsed = self.parser.parse(&initial_state, &tokens);
                Ok(build_cue(start, initial_state, language, parsed))
            }
        }
    }
}

/// Splits layout output into one cue. A screen clear that follows
/// visible content bounds the cue at its elapsed offset; a clear with
/// nothing shown erases the display.
fn build_cue(
    start: Timestamp,
    initial_state: b24::ParserState,
    language: Option<CaptionLanguage>,
    parsed: Vec<ParsedToken>,
) -> Option<Cue> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut duration = CueDuration::Unbounded;
    let mut saw_clear = false;

    for token in parsed {
        match token {
            ParsedToken::ClearScreen { elapsed_time, .. } => {
                saw_clear = true;
                if !tokens.is_empty() {
                    duration = CueDuration::Seconds(elapsed_time);
                    break;
                }
            }
            ParsedToken::Character { text: ref t, .. } => {
                text.push_str(t);
                tokens.push(token);
            }
            ParsedToken::Drcs { .. } => tokens.push(token),
        }
    }

    if tokens.is_empty() && !saw_clear {
        return None;
    }
    let duration = if tokens.is_empty() {
        CueDuration::Seconds(0.0)
    } else {
        duration
    };

    Some(Cue {
        presentation_time: start,
        duration,
        initial_state,
        tokens,
        text,
        language,
    })
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Command>,
    shared: Arc<Shared>,
    config: FeederConfig,
    cancel: CancellationToken,
    processed: watch::Sender<u64>,
) {
    let mut session = Session::new(&config);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("caption decode worker cancelled");
                break;
            }
            command = rx.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Reset => session = Session::new(&config),
                    Command::Decode { generation, seq, segment } => {
                        if generation == shared.generation.load(Ordering::Acquire) {
                            match session.decode(&shared, &segment) {
                                Ok(Some(cue)) => {
                                    // A reset may have landed while the
                                    // segment decoded; recheck under the
                                    // index lock so a stale cue never
                                    // enters the cleared index.
                                    let mut presentation = shared.presentation.lock();
                                    if generation
                                        == shared.generation.load(Ordering::Acquire)
                                    {
                                        presentation.insert(cue.presentation_time, cue);
                                    } else {
                                        trace!(seq, "discarding cue decoded across a reset");
                                    }
                                }
                                Ok(None) => {}
                                Err(err) => warn!(
                                    error = %err,
                                    time = segment.decode_time.as_seconds(),
                                    "failed to decode caption segment"
                                ),
                            }
                        } else {
                            trace!(seq, "discarding stale caption batch");
                        }
                        processed.send_if_modified(|latest| {
                            if seq > *latest {
                                *latest = seq;
                                true
                            } else {
                                false
                            }
                        });
                    }
                }
            }
        }
    }
}
