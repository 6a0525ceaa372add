/// Columns available for rendering, used to size the split pipeline's
/// per-logger chunk width. Falls back to 80 when stdout isn't a real
/// terminal (piped output, CI logs).
pub fn terminal_width() -> usize {
    crossterm::terminal::size().map(|(cols, _)| cols as usize).unwrap_or(80)
}
