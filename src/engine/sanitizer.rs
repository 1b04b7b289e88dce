/// Pulls the JSON object out of noisy generator output.
///
/// Strips code fences, then takes everything from the first `{` to the
/// last `}`. This is a heuristic, not a parser: two separate objects in one
/// reply come back as one (invalid) span, and stray braces in surrounding
/// prose widen the span. Validation downstream catches both.
pub fn clean_json(raw: &str) -> String {
    let text = raw.replace("```json", "").replace("```", "");
    let text = text.trim();

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => text[start..=end].to_string(),
        _ => text.to_string(),
    }
}
