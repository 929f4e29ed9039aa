//! Position sources
//!
//! Reads newline-delimited frames from a recorded capture file or a live TCP
//! feed. Waiting on the next line is the only place the game loop suspends.

use std::io;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info};

use crate::feed::frame::PositionFrame;
use crate::game::constants::feed::PROGRESS_LOG_INTERVAL;

/// Errors that end a position feed
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Position stream exhausted after {lines_read} lines")]
    EndOfStream { lines_read: u64 },
    #[error("Malformed frame on line {line}: {source}")]
    Malformed {
        line: u64,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Produces one frame per tick
#[allow(async_fn_in_trait)]
pub trait PositionSource {
    /// Wait for the next frame
    async fn next_frame(&mut self) -> Result<PositionFrame, FeedError>;

    /// Lines consumed so far, including skipped ones
    fn lines_read(&self) -> u64;
}

/// Line-delimited JSON frame reader over any buffered async stream
///
/// `next_frame` is cancel safe: a partly received line stays in the buffer
/// and the next call continues it.
pub struct FrameReader<R> {
    reader: R,
    line_buf: Vec<u8>,
    /// The buffer holds a full line that has already been handed out
    line_consumed: bool,
    lines_read: u64,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buf: Vec::new(),
            line_consumed: false,
            lines_read: 0,
        }
    }

    /// Discard up to `count` lines; returns how many were actually skipped
    pub async fn skip_lines(&mut self, count: u64) -> Result<u64, FeedError> {
        let mut skipped = 0;
        while skipped < count {
            if !self.read_line().await? {
                break;
            }
            skipped += 1;
        }
        Ok(skipped)
    }

    /// Read one line into the buffer; false at end of stream
    async fn read_line(&mut self) -> Result<bool, FeedError> {
        if self.line_consumed {
            self.line_buf.clear();
            self.line_consumed = false;
        }
        self.reader.read_until(b'\n', &mut self.line_buf).await?;
        if self.line_buf.is_empty() {
            return Ok(false);
        }

        self.line_consumed = true;
        self.lines_read += 1;
        if self.lines_read % PROGRESS_LOG_INTERVAL == 0 {
            debug!("line {}", self.lines_read);
        }
        Ok(true)
    }
}

impl FrameReader<BufReader<File>> {
    /// Open a recorded capture, skipping `skip_lines` lines of read-ahead
    pub async fn open_file(path: impl AsRef<Path>, skip_lines: u64) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let file = File::open(path).await?;
        let mut reader = Self::new(BufReader::new(file));
        let skipped = reader.skip_lines(skip_lines).await?;
        info!("Replaying {} (skipped {} lines)", path.display(), skipped);
        Ok(reader)
    }
}

impl FrameReader<BufReader<TcpStream>> {
    /// Connect to a live capture feed; waits until the server accepts
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, FeedError> {
        let stream = TcpStream::connect(addr).await?;
        if let Ok(peer) = stream.peer_addr() {
            info!("Connected to live feed at {}", peer);
        }
        Ok(Self::new(BufReader::new(stream)))
    }
}

impl<R: AsyncBufRead + Unpin> PositionSource for FrameReader<R> {
    async fn next_frame(&mut self) -> Result<PositionFrame, FeedError> {
        if !self.read_line().await? {
            return Err(FeedError::EndOfStream {
                lines_read: self.lines_read,
            });
        }

        PositionFrame::from_slice(&self.line_buf).map_err(|source| FeedError::Malformed {
            line: self.lines_read,
            source,
        })
    }

    fn lines_read(&self) -> u64 {
        self.lines_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::io::Builder;

    const FRAME_A: &str = "{\"objs\": [{\"name\": \"ball1\", \"oc\": false, \"t\": [1.0, 2.0, 3.0]}]}\n";
    const FRAME_B: &str = "{\"objs\": [{\"name\": \"ball1\", \"oc\": true, \"t\": [0.0, 0.0, 0.0]}]}\n";

    #[tokio::test]
    async fn test_reads_frames_in_order() {
        let mock = Builder::new().read(FRAME_A.as_bytes()).read(FRAME_B.as_bytes()).build();
        let mut reader = FrameReader::new(BufReader::new(mock));

        let first = reader.next_frame().await.unwrap();
        assert!(!first.get("ball1").unwrap().occluded);
        let second = reader.next_frame().await.unwrap();
        assert!(second.get("ball1").unwrap().occluded);
        assert_eq!(reader.lines_read(), 2);
    }

    #[tokio::test]
    async fn test_end_of_stream() {
        let mock = Builder::new().read(FRAME_A.as_bytes()).build();
        let mut reader = FrameReader::new(BufReader::new(mock));

        reader.next_frame().await.unwrap();
        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, FeedError::EndOfStream { lines_read: 1 }));
    }

    #[tokio::test]
    async fn test_malformed_line_reports_line_number() {
        let input = format!("{}garbage\n", FRAME_A);
        let mut reader = FrameReader::new(BufReader::new(input.as_bytes()));

        reader.next_frame().await.unwrap();
        match reader.next_frame().await {
            Err(FeedError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_skip_lines() {
        let input = format!("header\n{}{}", FRAME_B, FRAME_A);
        let mut reader = FrameReader::new(BufReader::new(input.as_bytes()));

        assert_eq!(reader.skip_lines(2).await.unwrap(), 2);
        let frame = reader.next_frame().await.unwrap();
        assert!(!frame.get("ball1").unwrap().occluded);
        assert_eq!(reader.lines_read(), 3);
    }

    #[tokio::test]
    async fn test_skip_past_end() {
        let mut reader = FrameReader::new(BufReader::new(FRAME_A.as_bytes()));
        assert_eq!(reader.skip_lines(10).await.unwrap(), 1);
        assert!(matches!(
            reader.next_frame().await,
            Err(FeedError::EndOfStream { .. })
        ));
    }

    #[tokio::test]
    async fn test_interrupted_read_resumes_line() {
        let (head, tail) = FRAME_A.split_at(20);
        let mock = Builder::new()
            .read(head.as_bytes())
            .wait(Duration::from_millis(200))
            .read(tail.as_bytes())
            .read(FRAME_B.as_bytes())
            .build();
        let mut reader = FrameReader::new(BufReader::new(mock));

        let interrupted = tokio::time::timeout(Duration::from_millis(20), reader.next_frame()).await;
        assert!(interrupted.is_err());
        assert_eq!(reader.lines_read(), 0);

        let first = reader.next_frame().await.unwrap();
        assert_eq!(first.get("ball1").unwrap().position.x, 1.0);
        assert!(reader.next_frame().await.unwrap().get("ball1").unwrap().occluded);
        assert_eq!(reader.lines_read(), 2);
    }

    #[tokio::test]
    async fn test_blank_line_is_malformed() {
        let mut reader = FrameReader::new(BufReader::new("\n".as_bytes()));
        assert!(matches!(
            reader.next_frame().await,
            Err(FeedError::Malformed { line: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let mut reader = FrameReader::new(BufReader::new(FRAME_A.trim_end().as_bytes()));
        assert_eq!(reader.next_frame().await.unwrap().len(), 1);
    }
}
