/// The two threshold shapes a probe's configured failure tolerance can take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdKind {
    /// Maximum absolute number of failed runs tolerated.
    Flat(u64),
    /// Maximum fraction of failed runs tolerated, in `[0, 1]`.
    Percentage(f64),
}

/// Parses a threshold string as it appears in configuration: a trailing `%`
/// selects percentage mode (value divided by 100), otherwise a non-negative
/// integer selects flat mode.
pub fn parse_threshold(raw: &str) -> anyhow::Result<ThresholdKind> {
    let trimmed = raw.trim();
    if let Some(pct) = trimmed.strip_suffix('%') {
        let value: f64 = pct
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid percentage threshold: {raw:?}"))?;
        let fraction = value / 100.0;
        if !(0.0..=1.0).contains(&fraction) {
            anyhow::bail!("percentage threshold out of range [0,100]: {raw:?}");
        }
        Ok(ThresholdKind::Percentage(fraction))
    } else {
        let value: u64 = trimmed
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid flat threshold: {raw:?}"))?;
        Ok(ThresholdKind::Flat(value))
    }
}
