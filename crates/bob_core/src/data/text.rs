//! Line-oriented text formats.

use crate::composition::CompositionSpec;
use crate::strategy::StrategyRecord;
use crate::timeline::AttackGoal;

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(|line| line.trim_end_matches('\r'))
}

/// Parse an opening catalog: one label per line, blank lines skipped.
#[must_use]
pub fn parse_catalog(text: &str) -> Vec<String> {
    lines(text)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an attack timeline.
///
/// The file repeats three-line groups: activation frame, unit tokens,
/// count tokens. A trailing incomplete group is ignored. A frame that does
/// not parse is read as 0.
#[must_use]
pub fn parse_timeline(text: &str) -> Vec<AttackGoal> {
    let all: Vec<&str> = lines(text).collect();
    let complete = all.len() - all.len() % 3;
    if complete < all.len() {
        tracing::debug!(
            "Ignoring {} trailing timeline line(s)",
            all.len() - complete
        );
    }

    all[..complete]
        .chunks_exact(3)
        .map(|group| {
            let frame = group[0].trim().parse::<u32>().unwrap_or_else(|_| {
                tracing::warn!("Timeline frame '{}' is not a frame, using 0", group[0]);
                0
            });
            AttackGoal::new(frame, CompositionSpec::new(group[1], group[2]))
        })
        .collect()
}

/// Parse a persisted outcome record into `len` loss counts.
///
/// Missing or unparsable lines count as zero losses; extra lines are
/// ignored.
#[must_use]
pub fn parse_outcome_record(text: &str, len: usize) -> Vec<u32> {
    let mut parsed = lines(text).map(|line| line.trim().parse::<u32>().unwrap_or(0));
    (0..len).map(|_| parsed.next().unwrap_or(0)).collect()
}

/// Format an outcome record: one loss count per line, in catalog order.
///
/// Wins are not written.
#[must_use]
pub fn format_outcome_record(records: &[StrategyRecord]) -> String {
    records
        .iter()
        .map(|record| format!("{}\n", record.losses))
        .collect()
}
