//! Identity rules for combining candidates from several evidence sources.

use crate::models::DetectedGame;
use std::path::Path;

/// Appends `game` unless an entry with the same external id, or with the
/// same name and install path, is already present. Used inside one source,
/// where ids are authoritative.
pub fn push_unique_id(games: &mut Vec<DetectedGame>, game: DetectedGame) -> bool {
    let duplicate = games.iter().any(|g| {
        g.external_id == game.external_id
            || (same_name(&g.name, &game.name) && same_path(&g.install_path, &game.install_path))
    });
    if duplicate {
        return false;
    }
    games.push(game);
    true
}

/// Like [`push_unique_id`], but a matching name alone is enough to reject
/// `game`. Sources whose ids include add-ons sharing the base game's folder
/// need this.
pub fn push_unique_name(games: &mut Vec<DetectedGame>, game: DetectedGame) -> bool {
    if games.iter().any(|g| same_name(&g.name, &game.name)) {
        return false;
    }
    push_unique_id(games, game)
}

/// True if `candidate` names the same game as `existing`: equal name or
/// equal install path (both case-insensitive), or equal external id.
pub fn is_same_game(existing: &DetectedGame, candidate: &DetectedGame) -> bool {
    same_name(&existing.name, &candidate.name)
        || same_path(&existing.install_path, &candidate.install_path)
        || existing.external_id == candidate.external_id
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn same_path(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

/// Merges a secondary source into the authoritative one.
///
/// Every primary entry is kept in order. A secondary entry is appended only
/// if it matches nothing already accumulated, including secondary entries
/// appended before it.
pub fn merge_sources(
    primary: Vec<DetectedGame>,
    secondary: impl IntoIterator<Item = DetectedGame>,
) -> Vec<DetectedGame> {
    let mut merged = primary;
    for candidate in secondary {
        if merged.iter().any(|existing| is_same_game(existing, &candidate)) {
            continue;
        }
        merged.push(candidate);
    }
    merged
}
