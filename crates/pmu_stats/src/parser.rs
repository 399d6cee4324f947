use log::debug;

use crate::error::{Error, Result};
use crate::metric::Metric;
use crate::section::Sections;

/// Leading token of a section header line
pub const SECTION_HEADER: &str = "==== PMU statistics for";

const MARKER: &str = "====";

/// Parses benchmark output into labelled sections of counter values.
///
/// A `==== PMU statistics for <label> ====` line opens a section; following
/// `<metric>: <integer>` lines fill it in until the next header. Lines before
/// the first header, and lines that name no known metric, are ignored.
///
/// # Errors
///
/// Returns [`Error::MalformedMetric`] when a line names a known metric but
/// carries no colon or no integer value after it.
pub fn parse_pmu_output(text: &str) -> Result<Sections> {
    let mut sections = Sections::new();
    let mut current: Option<String> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();

        if let Some(rest) = line.strip_prefix(SECTION_HEADER) {
            let label = rest.replace(MARKER, "").trim().to_string();
            debug!("Section '{}' opened on line {}", label, index + 1);
            sections.open(&label);
            current = Some(label);
            continue;
        }

        let Some(label) = current.as_deref() else {
            continue;
        };

        let key = line.split(':').next().unwrap_or_default().trim();
        let Some(metric) = Metric::match_prefix(key) else {
            continue;
        };

        let value = parse_value(line).ok_or_else(|| Error::MalformedMetric {
            line_number: index + 1,
            line: raw_line.to_string(),
        })?;
        if let Some(section) = sections.get_mut(label) {
            section.set(metric, value);
        }
    }

    Ok(sections)
}

fn parse_value(line: &str) -> Option<i64> {
    let (_, value) = line.split_once(':')?;
    value.trim().parse().ok()
}
