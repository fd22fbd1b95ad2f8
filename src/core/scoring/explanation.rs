//! Human-readable explanations for similarity matches.
//!
//! Each dimension has its own ladder of thresholds. The strongest phrase
//! reached on each ladder is kept, and the kept phrases are joined with "and".

/// Returned when no ladder reaches its lowest threshold
pub const FALLBACK_EXPLANATION: &str = "Some visual similarities found";

const PREFIX: &str = "Similar property with ";

/// (threshold, phrase) pairs, strongest first
const STRUCTURAL_LADDER: [(f64, &str); 2] = [
    (0.8, "very similar layout and structure"),
    (0.6, "similar room layout"),
];
const COLOR_LADDER: [(f64, &str); 2] = [
    (0.8, "matching color scheme"),
    (0.6, "similar color palette"),
];
const COMPOSITION_LADDER: [(f64, &str); 2] = [
    (0.9, "same perspective"),
    (0.7, "similar composition"),
];

fn climb(ladder: &[(f64, &'static str)], score: f64) -> Option<&'static str> {
    ladder
        .iter()
        .find(|(threshold, _)| score >= *threshold)
        .map(|(_, phrase)| *phrase)
}

/// Explain a match from its three sub-scores
pub fn explain(structural: f64, color_palette: f64, composition: f64) -> String {
    let phrases: Vec<&str> = [
        climb(&STRUCTURAL_LADDER, structural),
        climb(&COLOR_LADDER, color_palette),
        climb(&COMPOSITION_LADDER, composition),
    ]
    .into_iter()
    .flatten()
    .collect();

    if phrases.is_empty() {
        FALLBACK_EXPLANATION.to_string()
    } else {
        format!("{}{}", PREFIX, phrases.join(" and "))
    }
}
