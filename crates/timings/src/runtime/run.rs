//! Run: read newline-delimited log lines, write one JSON metric per line.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::conf::TimingsConfig;
use crate::parser::metrics::{ParseStats, StatsSnapshot};
use crate::parser::{LineOutcome, LogParser, ParseError, ParseReporter, TracingReporter};

/// Bytes of an unreadable line echoed into its failure report.
const REPORT_PREVIEW_BYTES: usize = 256;

/// Parse stdin with the configured parser and write metrics to stdout.
pub async fn run_stdio(config: TimingsConfig) -> Result<(), Box<dyn std::error::Error>> {
    let parser = config.build_parser()?;
    let stats = ParseStats::new();

    info!("Reading {} lines from stdin", parser.format().as_str());
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    process_lines(stdin, stdout, parser.as_ref(), &TracingReporter, config.max_line_size, &stats).await?;

    let snapshot = stats.snapshot();
    info!(
        lines = snapshot.lines,
        emitted = snapshot.emitted,
        skipped = snapshot.skipped,
        failed = snapshot.failed,
        "Reached end of input"
    );
    Ok(())
}

/// Feed every line of `reader` through `parser`.
///
/// Lines are split on `\n` with a trailing `\r` removed. At most
/// `max_line_size` bytes of a line are buffered; the rest of an oversized line
/// is drained unread. Oversized and non-UTF8 lines are reported like any other
/// unparseable line.
pub async fn process_lines<R, W>(
    mut reader: R,
    mut writer: W,
    parser: &dyn LogParser,
    reporter: &dyn ParseReporter,
    max_line_size: usize,
    stats: &ParseStats,
) -> std::io::Result<StatsSnapshot>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut raw = Vec::new();

    while let Some(size) = next_line(&mut reader, &mut raw, max_line_size).await? {
        let line = match decode(&raw, size, max_line_size) {
            Ok(line) => line,
            Err(e) => {
                let preview = String::from_utf8_lossy(&raw[..raw.len().min(REPORT_PREVIEW_BYTES)]);
                reporter.report(&preview, &e);
                stats.record_error(&e);
                continue;
            }
        };

        match parser.parse_line_outcome(reporter, line) {
            LineOutcome::Emitted(metric) => {
                let mut encoded = serde_json::to_vec(&metric)?;
                encoded.push(b'\n');
                writer.write_all(&encoded).await?;
                stats.record_emitted();
            }
            LineOutcome::Skipped => {
                debug!(line, "Skipped log line");
                stats.record_skipped();
            }
            LineOutcome::Failed(e) => stats.record_error(&e),
        }
    }

    writer.flush().await?;
    Ok(stats.snapshot())
}

/// Read the next line into `buf`, without its `\n` or `\r\n` terminator.
///
/// Returns the full length of the line, which exceeds `buf.len()` when the
/// line was longer than `max_line_size`. `None` at end of input.
async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>, max_line_size: usize) -> std::io::Result<Option<usize>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    // Room for a full line plus its "\r\n"
    let limit = max_line_size.saturating_add(2);
    let read = (&mut *reader).take(limit as u64).read_until(b'\n', buf).await?;
    if read == 0 {
        return Ok(None);
    }

    let mut overflow = 0;
    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if read == limit {
        overflow = drain_line(reader).await?;
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    Ok(Some(buf.len() + overflow))
}

/// Consume the rest of the current line, returning how many bytes it held.
async fn drain_line<R>(reader: &mut R) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut drained = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(drained);
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(drained + end);
            }
            None => {
                let len = available.len();
                reader.consume(len);
                drained += len;
            }
        }
    }
}

fn decode(raw: &[u8], size: usize, max_line_size: usize) -> Result<&str, ParseError> {
    if size > max_line_size {
        return Err(ParseError::LineTooLarge(size, max_line_size));
    }
    std::str::from_utf8(raw).map_err(|_| ParseError::NonUtf8)
}
