//! Prompt composition and response parsing
//!
//! Builds the structured natural-language request sent to the external
//! completion interface and parses its plain title-per-line reply.

use crate::types::{MediaKind, NegativeFeedbackEntry, RatedItem, TasteProfile};

/// System instruction for the completion interface.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert film/TV critic and recommendation \
     engine. Provide only titles, one per line, no explanations or numbers.";

const MAX_LOVED: usize = 8;
const MAX_LIKED: usize = 5;
const MAX_DISLIKED: usize = 3;
const MAX_TOP_GENRES: usize = 4;
const MAX_AVOID_GENRES: usize = 2;
const MAX_AVOID_TITLES: usize = 15;
const REQUESTED_TITLES: usize = 20;

/// Compose the recommendation request: persona, tiered rating history,
/// genre affinities, rating style, consensus alignment, and an
/// avoid-list from recent negative feedback.
pub fn build_prompt(
    profile: &TasteProfile,
    items: &[RatedItem],
    negative: &[NegativeFeedbackEntry],
    kind: MediaKind,
) -> String {
    let loved: Vec<&RatedItem> = items.iter().filter(|i| i.user_rating >= 8.0).collect();
    let liked: Vec<&RatedItem> = items
        .iter()
        .filter(|i| i.user_rating >= 6.0 && i.user_rating < 8.0)
        .collect();
    let disliked: Vec<&RatedItem> = items.iter().filter(|i| i.user_rating < 6.0).collect();

    let mut prompt = format!("RECOMMENDATION REQUEST for {}\n", profile.persona_text);

    prompt.push_str("\nLOVED (Rated 8-10):\n");
    for item in loved.iter().take(MAX_LOVED) {
        let consensus = item
            .external_score
            .map(|s| format!("{s:.1}"))
            .unwrap_or_else(|| "?".to_string());
        prompt.push_str(&format!(
            "- {} (User: {:.1}/10, Critics: {})\n",
            item.title, item.user_rating, consensus
        ));
    }

    prompt.push_str("\nLIKED (Rated 6-7):\n");
    for item in liked.iter().take(MAX_LIKED) {
        prompt.push_str(&format!("- {} ({:.1}/10)\n", item.title, item.user_rating));
    }

    if !disliked.is_empty() {
        prompt.push_str("\nDISLIKED (Rated 1-5):\n");
        for item in disliked.iter().take(MAX_DISLIKED) {
            prompt.push_str(&format!("- {} ({:.1}/10)\n", item.title, item.user_rating));
        }
    }

    prompt.push_str("\nTASTE PROFILE:\n");
    let top_genres: Vec<String> = profile
        .genre_affinity
        .iter()
        .take(MAX_TOP_GENRES)
        .map(|(name, score)| format!("{name} ({score:+})"))
        .collect();
    prompt.push_str(&format!("- Preferred genres: {}\n", top_genres.join(", ")));

    let avoid_genres: Vec<&str> = profile
        .genre_affinity
        .iter()
        .filter(|(_, score)| *score < 0)
        .take(MAX_AVOID_GENRES)
        .map(|(name, _)| name.as_str())
        .collect();
    if !avoid_genres.is_empty() {
        prompt.push_str(&format!("- Avoid: {}\n", avoid_genres.join(", ")));
    }

    let style = if profile.rating_tendencies.is_generous_rater {
        "Generous"
    } else if profile.rating_tendencies.is_critical {
        "Critical"
    } else {
        "Balanced"
    };
    prompt.push_str(&format!("- Rating style: {style}\n"));

    let alignment = if profile.score_alignment.fraction_aligned > 0.6 {
        "Mainstream taste"
    } else {
        "Unique taste"
    };
    prompt.push_str(&format!("- Consensus alignment: {alignment}\n"));

    if !negative.is_empty() {
        let recent: Vec<&str> = negative[negative.len().saturating_sub(MAX_AVOID_TITLES)..]
            .iter()
            .map(|entry| entry.title.as_str())
            .collect();
        prompt.push_str(&format!("\nAVOID recommending: {}\n", recent.join(", ")));
    }

    prompt.push_str(&format!(
        "\nRecommend {} {} this user would rate 8+ based on their specific taste profile. \
         Focus on hidden gems and perfect matches rather than obvious popular choices.",
        REQUESTED_TITLES,
        kind.plural_noun()
    ));

    prompt
}

/// Parse the completion reply into candidate title strings: one per
/// line, leading ordinal and bullet markers stripped, empty or
/// implausibly long lines discarded, capped at `max` entries.
pub fn parse_titles(response: &str, max: usize) -> Vec<String> {
    response
        .lines()
        .map(|line| strip_list_marker(line.trim()).to_string())
        .filter(|title| !title.is_empty() && title.len() < 100)
        .take(max)
        .collect()
}

/// Drop a leading "12." / "3)" ordinal or "-" / "*" / bullet marker.
fn strip_list_marker(line: &str) -> &str {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < line.len() {
        let rest = rest.strip_prefix(['.', ')']).unwrap_or(rest);
        return rest.trim_start();
    }
    line.trim_start_matches(['-', '*', '\u{2022}']).trim_start()
}
