//! Score strings as reported by players.
//!
//! A score is a comma separated list of sets, each set written `a-b` from the
//! point of view of the reporting player, e.g. `2-0,1-2,2-1`.

/// Parses a score into `(author, opponent)` pairs.
///
/// Returns `None` if the score is not a non-empty list of `digits-digits` sets.
pub fn parse_sets(score: &str) -> Option<Vec<(u32, u32)>> {
    score
        .split(',')
        .map(|set| {
            let (author, opponent) = set.split_once('-')?;
            Some((parse_points(author)?, parse_points(opponent)?))
        })
        .collect()
}

fn parse_points(points: &str) -> Option<u32> {
    if points.is_empty() || !points.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    points.parse().ok()
}

/// Returns `true` if the whole string is a valid score.
pub fn verify_score_format(score: &str) -> bool {
    parse_sets(score).is_some()
}

/// Writes the score from the opponent's point of view.
pub fn reverse_score(score: &str) -> Option<String> {
    let sets = parse_sets(score)?;
    Some(
        sets.iter()
            .map(|(author, opponent)| format!("{}-{}", opponent, author))
            .collect::<Vec<String>>()
            .join(","),
    )
}

/// Returns `true` if the reporting player won more sets than the opponent.
///
/// A tied set counts for the opponent.
pub fn author_is_winner(score: &str) -> Option<bool> {
    let sets = parse_sets(score)?;
    let won = sets.iter().filter(|(author, opponent)| author > opponent).count();
    Some(won > sets.len() - won)
}
