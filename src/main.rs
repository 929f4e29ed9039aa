use std::io::BufRead;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use possession_game::config::GameConfig;
use possession_game::feed::source::{FeedError, FrameReader, PositionSource};
use possession_game::game::constants::clock::COUNTDOWN_SECONDS;
use possession_game::game::constants::feed::INPUT_POLL_INTERVAL_MS;
use possession_game::game::input_buffer::{InputBuffer, InputBufferError, InputSender};
use possession_game::game::possession::Side;
use possession_game::game::session::{CueEvent, GamePhase, GameSession, InputEvent, TickOutput};
use possession_game::metrics::Metrics;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Possession v{}", env!("CARGO_PKG_VERSION"));

    let config = GameConfig::load_or_default();
    let mut session = GameSession::new(&config)
        .context("Make sure you define 1 or more objects through POSSESSION_OBJECTS")?;

    let metrics = Arc::new(Metrics::new());

    #[cfg(feature = "metrics_server")]
    if let Some(port) = config.metrics_port {
        let metrics = metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = possession_game::metrics::start_metrics_server(metrics, port).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let inputs = InputBuffer::default();
    spawn_key_reader(inputs.sender());

    let result = match &config.frame_file {
        Some(path) => {
            info!("Replaying {}", path.display());
            let mut reader = FrameReader::open_file(path, config.skip_lines).await?;
            run(&mut session, &mut reader, &inputs, &metrics).await
        }
        None => {
            info!(
                "Running in live mode. Waiting for the capture feed at {}",
                config.feed_address
            );
            let mut reader = FrameReader::connect(config.feed_address.as_str()).await?;
            run(&mut session, &mut reader, &inputs, &metrics).await
        }
    };

    match result {
        Ok(()) => {}
        Err(FeedError::EndOfStream { lines_read }) => {
            info!("Capture ended after {} lines", lines_read);
        }
        Err(e) => return Err(e).context("Position feed failed"),
    }

    info!(
        "Session over: {} game(s), {} ticks",
        session.games_completed(),
        session.tick_count()
    );
    Ok(())
}

/// Pull frames until the feed ends or a QUIT arrives
async fn run<S: PositionSource>(
    session: &mut GameSession,
    source: &mut S,
    inputs: &InputBuffer,
    metrics: &Metrics,
) -> Result<(), FeedError> {
    // Objects start where the feed first sees them
    let first = source.next_frame().await?;
    session.prime(&first);

    info!("Press 'g' to start play, 'q' to quit");

    // Keeps keys actionable while the feed is stalled
    let mut input_poll = tokio::time::interval(Duration::from_millis(INPUT_POLL_INTERVAL_MS));
    input_poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let frame = tokio::select! {
            frame = source.next_frame() => frame?,
            _ = input_poll.tick() => {
                if apply_inputs(session, inputs, metrics, Instant::now()) {
                    return Ok(());
                }
                continue;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                let _ = session.handle_input(InputEvent::Quit, Instant::now());
                return Ok(());
            }
        };

        // Read the clock before any presentation work so it does not skew elapsed time
        let now = Instant::now();

        if apply_inputs(session, inputs, metrics, now) {
            return Ok(());
        }

        let tick_start = Instant::now();
        let output = match session.tick(&frame, now) {
            Ok(output) => output,
            Err(e) => {
                warn!("Tick skipped: {}", e);
                return Ok(());
            }
        };
        metrics.record_tick(&output, tick_start.elapsed());

        present(&output);
    }
}

/// Hand queued key presses to the session; true once it has terminated
fn apply_inputs(session: &mut GameSession, inputs: &InputBuffer, metrics: &Metrics, now: Instant) -> bool {
    for event in inputs.drain() {
        match session.handle_input(event, now) {
            Ok(cues) => {
                metrics.record_cues(&cues);
                present_cues(&cues);
            }
            Err(e) => debug!("Input {:?} dropped: {}", event, e),
        }
        if session.is_terminated() {
            metrics.record_phase(GamePhase::Terminated);
            return true;
        }
    }
    false
}

/// Presentation and audio stand-in: report what a renderer would draw
fn present(output: &TickOutput) {
    present_cues(&output.cues);

    let payload = &output.payload;
    if let (Some(angle), Some(scores)) = (payload.clock_angle_degrees, payload.scores) {
        let leading = match scores.leader() {
            Some(Side::Positive) => "positive ahead",
            Some(Side::Negative) => "negative ahead",
            None => "level",
        };
        debug!(
            "clock {:.0} deg, positive {} / negative {} ({})",
            angle, scores.positive, scores.negative, leading
        );
    }

    if let Some(summary) = &output.summary {
        if summary.time_recorded {
            info!("positive: {:6.2}", f64::from(summary.positive_score));
            info!("negative: {:6.2}", f64::from(summary.negative_score));
        }
        info!("{}", summary.headline());
        info!("Press 'g' to play again");
    }
}

fn present_cues(cues: &[CueEvent]) {
    for cue in cues {
        match cue {
            CueEvent::CountdownStart => info!("Starting in {}...", COUNTDOWN_SECONDS),
            CueEvent::SwooshToPositive => info!("swoosh +"),
            CueEvent::SwooshToNegative => info!("swoosh -"),
            CueEvent::GameOver => info!("GAME OVER"),
        }
    }
}

/// Read key presses from stdin on a plain thread and queue them for the loop
fn spawn_key_reader(sender: InputSender) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let Some(event) = InputEvent::from_key(&line) else {
                continue;
            };
            match sender.try_send(event) {
                Ok(()) => {}
                Err(InputBufferError::Full) => warn!("Input queue full, dropping {:?}", event),
                Err(InputBufferError::Disconnected) => break,
            }
        }
    });
}
