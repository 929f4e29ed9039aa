//! Prometheus-compatible session metrics
//!
//! Counters are updated by the game loop after each tick. The optional
//! exporter serves them over plain HTTP.
//! Default endpoint: http://localhost:<METRICS_PORT>/metrics

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::game::session::{CueEvent, GamePhase, TickOutput};

/// Rolling window of tick durations kept for percentiles
const TICK_HISTORY: usize = 1000;

/// Metrics registry for a possession session
#[derive(Debug)]
pub struct Metrics {
    // Feed
    pub tick_count: AtomicU64,
    pub occluded_records: AtomicU64,
    pub glitches_suppressed: AtomicU64,

    // Gameplay
    pub crossings_to_positive: AtomicU64,
    pub crossings_to_negative: AtomicU64,
    pub games_started: AtomicU64,
    pub games_completed: AtomicU64,
    /// 0 = waiting, 1 = playing, 2 = terminated
    pub phase: AtomicU64,
    /// Latest displayed scores
    pub positive_score: AtomicU64,
    pub negative_score: AtomicU64,

    // Tick timing (microseconds)
    pub tick_time_us: AtomicU64,
    pub tick_time_p99_us: AtomicU64,

    start_time: Instant,
    tick_history: RwLock<VecDeque<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            occluded_records: AtomicU64::new(0),
            glitches_suppressed: AtomicU64::new(0),
            crossings_to_positive: AtomicU64::new(0),
            crossings_to_negative: AtomicU64::new(0),
            games_started: AtomicU64::new(0),
            games_completed: AtomicU64::new(0),
            phase: AtomicU64::new(0),
            positive_score: AtomicU64::new(50),
            negative_score: AtomicU64::new(50),
            tick_time_us: AtomicU64::new(0),
            tick_time_p99_us: AtomicU64::new(0),
            start_time: Instant::now(),
            tick_history: RwLock::new(VecDeque::with_capacity(TICK_HISTORY)),
        }
    }

    /// Fold one tick's output into the counters
    pub fn record_tick(&self, output: &TickOutput, duration: Duration) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);
        self.occluded_records
            .fetch_add(output.stats.occluded as u64, Ordering::Relaxed);
        self.glitches_suppressed
            .fetch_add(output.stats.glitches as u64, Ordering::Relaxed);

        self.record_cues(&output.cues);
        self.record_phase(output.payload.phase);

        if let Some(scores) = output.payload.scores {
            self.positive_score
                .store(u64::from(scores.positive), Ordering::Relaxed);
            self.negative_score
                .store(u64::from(scores.negative), Ordering::Relaxed);
        }

        self.record_tick_time(duration);
    }

    pub fn record_cues(&self, cues: &[CueEvent]) {
        for cue in cues {
            let counter = match cue {
                CueEvent::CountdownStart => &self.games_started,
                CueEvent::SwooshToPositive => &self.crossings_to_positive,
                CueEvent::SwooshToNegative => &self.crossings_to_negative,
                CueEvent::GameOver => &self.games_completed,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_phase(&self, phase: GamePhase) {
        let value = match phase {
            GamePhase::Waiting => 0,
            GamePhase::Playing => 1,
            GamePhase::Terminated => 2,
        };
        self.phase.store(value, Ordering::Relaxed);
    }

    /// Record a tick time and update the p99
    pub fn record_tick_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.tick_time_us.store(us, Ordering::Relaxed);

        let mut history = self.tick_history.write();
        history.push_back(us);
        while history.len() > TICK_HISTORY {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();
            let p99_idx = (sorted.len() as f32 * 0.99) as usize;
            self.tick_time_p99_us
                .store(sorted[p99_idx.min(sorted.len() - 1)], Ordering::Relaxed);
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        metric!("possession_ticks_total", "Total ticks processed", "counter",
            self.tick_count.load(Ordering::Relaxed));
        metric!("possession_occluded_records_total", "Object updates skipped due to occlusion", "counter",
            self.occluded_records.load(Ordering::Relaxed));
        metric!("possession_glitches_suppressed_total", "Moves over the glitch threshold", "counter",
            self.glitches_suppressed.load(Ordering::Relaxed));
        metric!("possession_crossings_positive_total", "Crossings onto the positive side", "counter",
            self.crossings_to_positive.load(Ordering::Relaxed));
        metric!("possession_crossings_negative_total", "Crossings onto the negative side", "counter",
            self.crossings_to_negative.load(Ordering::Relaxed));
        metric!("possession_games_started_total", "Games started", "counter",
            self.games_started.load(Ordering::Relaxed));
        metric!("possession_games_completed_total", "Games played to the end", "counter",
            self.games_completed.load(Ordering::Relaxed));
        metric!("possession_phase", "Game phase (0=waiting, 1=playing, 2=terminated)", "gauge",
            self.phase.load(Ordering::Relaxed));
        metric!("possession_score_positive", "Displayed positive side score", "gauge",
            self.positive_score.load(Ordering::Relaxed));
        metric!("possession_score_negative", "Displayed negative side score", "gauge",
            self.negative_score.load(Ordering::Relaxed));
        metric!("possession_tick_time_microseconds", "Current tick time in microseconds", "gauge",
            self.tick_time_us.load(Ordering::Relaxed));
        metric!("possession_tick_time_p99_microseconds", "99th percentile tick time", "gauge",
            self.tick_time_p99_us.load(Ordering::Relaxed));
        metric!("possession_uptime_seconds", "Process uptime in seconds", "counter",
            self.uptime_seconds());

        output
    }

    /// JSON form of the same counters
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "ticks": self.tick_count.load(Ordering::Relaxed),
            "tracking": {
                "occluded_records": self.occluded_records.load(Ordering::Relaxed),
                "glitches_suppressed": self.glitches_suppressed.load(Ordering::Relaxed),
            },
            "game": {
                "phase": self.phase.load(Ordering::Relaxed),
                "games_started": self.games_started.load(Ordering::Relaxed),
                "games_completed": self.games_completed.load(Ordering::Relaxed),
                "crossings_to_positive": self.crossings_to_positive.load(Ordering::Relaxed),
                "crossings_to_negative": self.crossings_to_negative.load(Ordering::Relaxed),
                "positive_score": self.positive_score.load(Ordering::Relaxed),
                "negative_score": self.negative_score.load(Ordering::Relaxed),
            },
            "performance": {
                "tick_time_us": self.tick_time_us.load(Ordering::Relaxed),
                "tick_time_p99_us": self.tick_time_p99_us.load(Ordering::Relaxed),
                "uptime_seconds": self.uptime_seconds(),
            },
        })
        .to_string()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the metrics HTTP server
#[cfg(feature = "metrics_server")]
pub async fn start_metrics_server(
    metrics: std::sync::Arc<Metrics>,
    port: u16,
) -> anyhow::Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tracing::{debug, info};

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Metrics server listening on http://{}/metrics", addr);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];

            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);
                    let (content_type, body) = if request.starts_with("GET /metrics/json") {
                        ("application/json", metrics.to_json())
                    } else if request.starts_with("GET /metrics") {
                        ("text/plain; version=0.0.4", metrics.to_prometheus())
                    } else if request.starts_with("GET /health") {
                        ("text/plain", "OK".to_string())
                    } else {
                        let response = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
                        if let Err(e) = socket.write_all(response.as_bytes()).await {
                            debug!("Failed to write metrics response to {}: {}", peer, e);
                        }
                        return;
                    };

                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        content_type,
                        body.len(),
                        body
                    );
                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        debug!("Failed to write metrics response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Failed to read from metrics socket {}: {}", peer, e);
                }
            }
        });
    }
}
