use serde::{Deserialize, Serialize};

/// Labels the narrator must use for the two decision options.
pub const OPTION_MARKERS: [&str; 2] = ["A)", "B)"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub label: String,
    pub title: String,
}

/// First option marker that appears nowhere in the narrative.
pub fn missing_marker(narrative: &str) -> Option<&'static str> {
    OPTION_MARKERS.into_iter().find(|marker| !narrative.contains(marker))
}

/// Finds the `A)` and `B)` option lines in a narrative, for display.
///
/// Markdown decoration around the marker (`**A) Title**`, `- B) ...`,
/// `### A) ...`) is tolerated. Returns the first missing marker on failure.
pub fn parse_options(narrative: &str) -> Result<[DecisionOption; 2], &'static str> {
    let mut found: [Option<DecisionOption>; 2] = [None, None];

    for line in narrative.lines() {
        let line = line
            .trim()
            .trim_start_matches(|c: char| matches!(c, '*' | '_' | '#' | '-' | '>') || c.is_whitespace());

        for (slot, marker) in found.iter_mut().zip(OPTION_MARKERS) {
            if slot.is_some() {
                continue;
            }
            if let Some(rest) = line.strip_prefix(marker) {
                let title = rest
                    .trim()
                    .trim_matches(|c: char| matches!(c, '*' | '_'))
                    .trim()
                    .to_string();
                *slot = Some(DecisionOption {
                    label: marker.trim_end_matches(')').to_string(),
                    title,
                });
            }
        }
    }

    match found {
        [Some(a), Some(b)] => Ok([a, b]),
        [None, _] => Err(OPTION_MARKERS[0]),
        [_, None] => Err(OPTION_MARKERS[1]),
    }
}
