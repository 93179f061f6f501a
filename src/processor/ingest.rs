use memchr::{memchr, memchr_iter};
use memmap2::Mmap;
use parking_lot::Mutex;
use rayon::{
    ThreadPool,
    iter::{IntoParallelRefIterator, ParallelIterator},
};
use std::{fs::File, path::Path, time::Instant};
use tracing::{debug, error, info, warn};

use crate::processor::{
    MergeOrder, ParseError, ParseErrorKind, ParseSummary, ProcessorError,
    config::EngineConfig,
    record::{CollisionRecord, FIELD_COUNT},
    store::RecordStore,
    tokenizer::split_line_into,
};

/// Line number of the first data line (the header is line 1).
const FIRST_DATA_LINE: usize = 2;

/// Shortest line that can hold a record: every field empty, only delimiters.
const MIN_LINE_LEN: usize = FIELD_COUNT - 1;

/// Lines sampled by [`estimate_rows`].
const ESTIMATE_SAMPLE_LINES: usize = 64;

/// Longest prefix of a malformed line kept in its [`ParseError`].
const MAX_REPORTED_LINE_CHARS: usize = 256;

/// A newline-aligned byte range of the data section.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChunkPlan {
    start: usize,
    end: usize,
    /// Source line number of the first line in the chunk.
    first_line: usize,
}

/// Reads `path` into a fresh store of layout `S`.
///
/// The header line is discarded. With a pool the data section is split into
/// `workers * ingest_chunks_per_worker` newline-aligned chunks; each worker
/// parses its chunks into a private store which is then appended to the
/// shared one under a lock. With [`MergeOrder::Completion`] worker buffers land
/// in the order workers finish, so the store is not in source order.
///
/// # Errors
/// [`ProcessorError::SourceUnreadable`] if the file cannot be opened or mapped,
/// [`ProcessorError::EmptySource`] if it has no header or no data lines.
pub(crate) fn load_store<S: RecordStore>(
    path: &Path,
    config: &EngineConfig,
    pool: Option<&ThreadPool>,
) -> Result<(S, ParseSummary), ProcessorError> {
    let started = Instant::now();

    let unreadable = |source: std::io::Error| {
        error!(path = %path.display(), error = %source, "cannot read source");
        ProcessorError::SourceUnreadable {
            path: path.to_path_buf(),
            source,
        }
    };
    let empty = || {
        error!(path = %path.display(), "source has no header or no data rows");
        ProcessorError::EmptySource {
            path: path.to_path_buf(),
        }
    };

    let file = File::open(path).map_err(unreadable)?;
    if file.metadata().map_err(unreadable)?.len() == 0 {
        return Err(empty());
    }
    let mmap = unsafe { Mmap::map(&file) }.map_err(unreadable)?;
    let data = data_section(&mmap).ok_or_else(empty)?;

    let estimated_rows = estimate_rows(data);
    let delimiter = config.delimiter();

    let (store, mut summary) = match pool {
        Some(pool) => pool.install(|| load_parallel::<S>(data, config, estimated_rows)),
        None => {
            let mut store = S::with_capacity(estimated_rows);
            let summary = parse_chunk(data, FIRST_DATA_LINE, delimiter, &mut store);
            (store, summary)
        }
    };
    summary.errors.sort_by_key(|e| e.line);

    info!(
        path = %path.display(),
        layout = S::LAYOUT.name(),
        workers = config.workers(),
        rows = summary.rows_processed,
        dropped = summary.lines_dropped,
        conversion_failures = summary.conversion_failures(),
        elapsed = ?started.elapsed(),
        "source loaded"
    );

    Ok((store, summary))
}

fn load_parallel<S: RecordStore>(
    data: &[u8],
    config: &EngineConfig,
    estimated_rows: usize,
) -> (S, ParseSummary) {
    let plans = plan_chunks(data, config.workers() * config.ingest_chunks_per_worker());
    let delimiter = config.delimiter();
    debug!(chunks = plans.len(), workers = config.workers(), "ingestion chunks planned");

    match config.merge_order() {
        MergeOrder::Source => {
            let parsed: Vec<(S, ParseSummary)> = plans
                .par_iter()
                .map(|plan| {
                    let chunk = &data[plan.start..plan.end];
                    let mut store = S::with_capacity(estimate_rows(chunk));
                    let summary = parse_chunk(chunk, plan.first_line, delimiter, &mut store);
                    (store, summary)
                })
                .collect();

            let mut store = S::with_capacity(estimated_rows);
            let mut summary = ParseSummary::default();
            for (part, part_summary) in parsed {
                store.append(part);
                summary.absorb(part_summary);
            }
            (store, summary)
        }
        MergeOrder::Completion => {
            let shared = Mutex::new((S::with_capacity(estimated_rows), ParseSummary::default()));

            plans
                .par_iter()
                .fold(
                    || (S::default(), ParseSummary::default()),
                    |(mut store, mut summary), plan| {
                        let chunk = &data[plan.start..plan.end];
                        store.reserve(estimate_rows(chunk));
                        summary.absorb(parse_chunk(chunk, plan.first_line, delimiter, &mut store));
                        (store, summary)
                    },
                )
                .for_each(|(part, part_summary)| {
                    let mut merged = shared.lock();
                    merged.0.append(part);
                    merged.1.absorb(part_summary);
                });

            shared.into_inner()
        }
    }
}

/// Everything after the header line, or `None` if there is no header line or
/// nothing but whitespace follows it.
fn data_section(buf: &[u8]) -> Option<&[u8]> {
    let header_end = memchr(b'\n', buf)?;
    let data = &buf[header_end + 1..];
    if data.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(data)
    }
}

/// Row estimate from the mean length of the first full-width lines, used for
/// capacity reservation.
///
/// Blank and short lines are not sampled. The estimate never exceeds the row
/// count of a buffer made of [`MIN_LINE_LEN`]-byte lines, and is 0 when no
/// line is wide enough to be a record.
fn estimate_rows(data: &[u8]) -> usize {
    let (bytes, lines) = data
        .split(|&b| b == b'\n')
        .filter(|line| line.len() >= MIN_LINE_LEN)
        .take(ESTIMATE_SAMPLE_LINES)
        .fold((0, 0), |(bytes, lines), line| (bytes + line.len() + 1, lines + 1));
    if lines == 0 {
        return 0;
    }
    let mean_line_len = (bytes / lines).max(MIN_LINE_LEN);
    data.len() / mean_line_len + 1
}

/// Splits `data` into at most `num_chunks` ranges ending just after a newline.
fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
    if data.is_empty() {
        return vec![];
    }

    let num_chunks = num_chunks.max(1);
    let chunk_size = data.len() / num_chunks;
    let mut boundaries = Vec::with_capacity(num_chunks);
    let mut start = 0;

    for i in 0..num_chunks - 1 {
        let target = ((i + 1) * chunk_size).max(start);
        if target >= data.len() {
            break;
        }

        let end = match memchr(b'\n', &data[target..]) {
            Some(pos) => target + pos + 1, // include the newline
            None => data.len(),
        };

        if start < end {
            boundaries.push((start, end));
        }
        start = end;
        if start >= data.len() {
            break;
        }
    }

    // Last chunk gets everything remaining
    if start < data.len() {
        boundaries.push((start, data.len()));
    }

    boundaries
}

/// Chunk boundaries plus the source line number each chunk starts at.
fn plan_chunks(data: &[u8], num_chunks: usize) -> Vec<ChunkPlan> {
    let boundaries = find_chunk_boundaries(data, num_chunks);
    let line_counts: Vec<usize> = boundaries
        .par_iter()
        .map(|&(start, end)| memchr_iter(b'\n', &data[start..end]).count())
        .collect();

    let mut first_line = FIRST_DATA_LINE;
    boundaries
        .into_iter()
        .zip(line_counts)
        .map(|((start, end), lines)| {
            let plan = ChunkPlan {
                start,
                end,
                first_line,
            };
            first_line += lines;
            plan
        })
        .collect()
}

/// Tokenizes and coerces every line of `chunk` into `store`.
///
/// Blank lines are skipped. Lines with fewer than [`FIELD_COUNT`] fields are
/// dropped; field conversion failures keep the record with that field defaulted.
fn parse_chunk<S: RecordStore>(
    chunk: &[u8],
    first_line: usize,
    delimiter: char,
    store: &mut S,
) -> ParseSummary {
    let mut summary = ParseSummary::default();
    let mut tokens = Vec::with_capacity(FIELD_COUNT);

    let unterminated_tail =
        (!chunk.is_empty() && chunk.last() != Some(&b'\n')).then_some(chunk.len());
    let line_ends = memchr_iter(b'\n', chunk).chain(unterminated_tail);

    let mut start = 0;
    for (offset, end) in line_ends.enumerate() {
        let line_no = first_line + offset;
        let raw = &chunk[start..end];
        start = end + 1;

        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.is_empty() {
            continue;
        }

        let text = String::from_utf8_lossy(raw);
        split_line_into(&text, delimiter, &mut tokens);

        if tokens.len() < FIELD_COUNT {
            warn!(line = line_no, fields = tokens.len(), "dropping malformed line");
            summary.lines_dropped += 1;
            summary.errors.push(ParseError {
                line: line_no,
                kind: ParseErrorKind::MalformedLine,
                column: String::new(),
                value: text.chars().take(MAX_REPORTED_LINE_CHARS).collect(),
                error: Some(format!(
                    "expected {} fields, got {}",
                    FIELD_COUNT,
                    tokens.len()
                )),
            });
            continue;
        }

        store.push(CollisionRecord::from_tokens(&tokens, line_no, &mut summary.errors));
        summary.rows_processed += 1;
    }

    summary
}
