use std::sync::{Arc, Mutex, OnceLock};

use chrono::Local;
use regex::Regex;

use super::message::LogRecord;

/// Separates one logger column's cell from the next within a rendered row.
pub const PIPELINE_SEPARATOR: &str = " | ";

/// Appended after every rendered cell so an unclosed color escape in one
/// probe's output never bleeds into the next column.
const ANSI_RESET: &str = "\x1b[0m";

/// `[d/m/yyyy HH:MM:SS]`, matched to the Go source's `TimeFormat` constant.
const TIME_FORMAT: &str = "%-d/%-m/%Y %H:%M:%S";
const TIME_FORMAT_WIDTH: usize = "[31/12/2026 23:59:59]".len();

fn color_escape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\x1b\[[0-9]+(;[0-9]+)*m").expect("valid ansi escape pattern"))
}

/// Counts `s`'s printable characters, the same way [`chunk_message`] bounds a
/// chunk: ANSI escapes don't count, everything else does.
fn printable_len(s: &str) -> usize {
    let mut remaining = s;
    let mut count = 0usize;
    while !remaining.is_empty() {
        if let Some(m) = color_escape().find(remaining) {
            remaining = &remaining[m.end()..];
            continue;
        }
        let ch = remaining.chars().next().expect("non-empty remainder");
        remaining = &remaining[ch.len_utf8()..];
        count += 1;
    }
    count
}

/// Splits `input` into chunks of at most `chunk_size` printable characters.
/// ANSI color escapes are preserved verbatim and never counted toward the
/// budget; newlines count as printable to keep the bookkeeping simple.
/// Boundaries only ever fall on code-point or escape-sequence edges.
pub fn chunk_message(input: &str, chunk_size: usize) -> Vec<String> {
    if input.is_empty() {
        return vec![String::new()];
    }
    if chunk_size == 0 {
        return vec![input.to_string()];
    }

    let mut bounds = vec![0usize];
    let mut printable_count = 0usize;
    let mut index = 0usize;
    let mut remainder = input;

    while remainder.len() > 1 {
        if let Some(m) = color_escape().find(remainder) {
            index += m.end();
            remainder = &remainder[m.end()..];
            continue;
        }

        let ch = remainder.chars().next().expect("non-empty remainder");
        let ch_len = ch.len_utf8();
        index += ch_len;
        remainder = &remainder[ch_len..];

        printable_count += 1;
        if printable_count >= chunk_size {
            bounds.push(index);
            printable_count = 0;
        }
    }

    bounds
        .iter()
        .enumerate()
        .map(|(i, &lower)| {
            let upper = bounds.get(i + 1).copied().unwrap_or(input.len());
            input[lower..upper].to_string()
        })
        .collect()
}

/// Sizing for a [`SplitPipeline`]: how many columns it has, which logger
/// lands in which column, and how many printable characters each column
/// gets before wrapping.
pub struct SplitPipelineConfig {
    pub show_logger_name: bool,
    pub logger_group: Vec<usize>,
    pub logger_group_count: usize,
    pub character_per_pipe: usize,
}

impl SplitPipelineConfig {
    pub fn new(show_logger_name: bool, terminal_width: usize, logger_group: Vec<usize>) -> Self {
        let group_count = logger_group.iter().copied().max().map(|m| m + 1).unwrap_or(1);
        let width = terminal_width.saturating_sub(TIME_FORMAT_WIDTH);
        let separator_cost = PIPELINE_SEPARATOR.len() * group_count.saturating_sub(1);
        let character_per_pipe = (width / group_count).saturating_sub(separator_cost);

        Self {
            show_logger_name,
            logger_group,
            logger_group_count: group_count,
            character_per_pipe: character_per_pipe.max(1),
        }
    }
}

/// An observer invoked once per rendered row, receiving the row's text
/// without the leading timestamp (used by tests and mirror sinks).
pub type PipelineObserver = Arc<dyn Fn(&str) + Send + Sync>;

/// Renders batches of [`LogRecord`]s into a multi-column, append-only text
/// stream: one column per logger group, wrapped at `character_per_pipe`.
pub struct SplitPipeline {
    config: SplitPipelineConfig,
    writer: Mutex<Box<dyn std::io::Write + Send>>,
    observers: Mutex<Vec<PipelineObserver>>,
}

impl SplitPipeline {
    pub fn new(config: SplitPipelineConfig, writer: Box<dyn std::io::Write + Send>) -> Self {
        Self {
            config,
            writer: Mutex::new(writer),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn observe(&self, observer: PipelineObserver) {
        self.observers.lock().expect("pipeline observers mutex poisoned").push(observer);
    }

    /// Writes one batch of records. Rows are emitted until every column runs
    /// out of chunks; columns without content at a row index are padded with
    /// spaces so the separator stays aligned.
    pub fn write(&self, records: Vec<LogRecord>) {
        if records.is_empty() {
            return;
        }

        let mut columns: Vec<Vec<String>> = vec![Vec::new(); self.config.logger_group_count];

        for record in &records {
            let Some(&group_id) = self.config.logger_group.get(record.logger_id) else {
                let mut writer = self.writer.lock().expect("pipeline writer mutex poisoned");
                let _ = writeln!(writer, "received a logger with id {} that could not be sorted", record.logger_id);
                continue;
            };

            let mut message = record.as_string();
            if self.config.show_logger_name {
                message = format!("[{}] {}", record.logger_name, message);
            }

            columns[group_id].extend(chunk_message(&message, self.config.character_per_pipe));
        }

        let row_count = columns.iter().map(Vec::len).max().unwrap_or(0);
        let pad = " ".repeat(self.config.character_per_pipe);

        for row in 0..row_count {
            let mut line = String::new();
            for (group, column) in columns.iter().enumerate() {
                if group > 0 {
                    line.push_str(PIPELINE_SEPARATOR);
                }
                match column.get(row) {
                    Some(cell) => {
                        line.push_str(cell);
                        line.push_str(ANSI_RESET);
                        let printable = printable_len(cell);
                        if printable < self.config.character_per_pipe {
                            line.push_str(&" ".repeat(self.config.character_per_pipe - printable));
                        }
                    }
                    None => {
                        line.push_str(&pad);
                        line.push_str(ANSI_RESET);
                    }
                }
            }

            for observer in self.observers.lock().expect("pipeline observers mutex poisoned").iter() {
                observer(&line);
            }

            let timestamp = Local::now().format(TIME_FORMAT);
            let mut writer = self.writer.lock().expect("pipeline writer mutex poisoned");
            let _ = writeln!(writer, "[{timestamp}]{line}");
        }
    }
}
