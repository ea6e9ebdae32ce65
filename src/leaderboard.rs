//! Local top-10 leaderboard, persisted as a JSON array under the
//! `rankings` key: append, sort descending by score, truncate.

use crate::storage::{KvStore, RANKINGS_KEY};

pub const MAX_ENTRIES: usize = 10;
pub const MAX_NAME_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    pub date: String,
}

pub struct Leaderboard<S> {
    store: S,
}

impl<S: KvStore> Leaderboard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The stored list, or empty when nothing (or nothing readable) is
    /// persisted yet.
    pub fn load(&self) -> Vec<LeaderboardEntry> {
        self.store
            .get(RANKINGS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Records a finished round and returns the updated top list.
    pub fn submit(&mut self, name: &str, score: u32) -> Vec<LeaderboardEntry> {
        let date = chrono::Local::now().format("%d/%m/%Y").to_string();
        self.submit_dated(name, score, date)
    }

    fn submit_dated(&mut self, name: &str, score: u32, date: String) -> Vec<LeaderboardEntry> {
        let name: String = name.chars().take(MAX_NAME_LEN).collect();

        let mut entries = self.load();
        entries.push(LeaderboardEntry { name, score, date });
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_ENTRIES);

        match serde_json::to_string(&entries) {
            Ok(raw) => self.store.set(RANKINGS_KEY, &raw),
            Err(err) => log::warn!("failed to serialize leaderboard: {err}"),
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn board() -> Leaderboard<MemoryStore> {
        Leaderboard::new(MemoryStore::new())
    }

    #[test]
    fn twelve_submissions_keep_only_the_top_ten() {
        let mut board = board();
        for score in [5, 44, 12, 9, 31, 2, 18, 40, 7, 25, 1, 36] {
            board.submit("player", score * 1000);
        }

        let entries = board.load();
        assert_eq!(entries.len(), MAX_ENTRIES);
        let scores: Vec<u32> = entries.iter().map(|entry| entry.score).collect();
        assert_eq!(
            scores,
            vec![44_000, 40_000, 36_000, 31_000, 25_000, 18_000, 12_000, 9_000, 7_000, 5_000]
        );
    }

    #[test]
    fn names_are_capped_at_twenty_chars() {
        let mut board = board();
        let entries = board.submit("a-player-name-that-runs-far-too-long", 100);
        assert_eq!(entries[0].name.chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn submissions_persist_through_the_store() {
        let mut board = board();
        board.submit_dated("Ada", 13_000, "01/01/2026".into());
        board.submit_dated("Grace", 21_000, "02/01/2026".into());

        let entries = board.load();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Grace");
        assert_eq!(entries[0].date, "02/01/2026");
        assert_eq!(entries[1].name, "Ada");
    }

    #[test]
    fn equal_scores_keep_insertion_order() {
        let mut board = board();
        board.submit_dated("first", 5_000, "01/01/2026".into());
        board.submit_dated("second", 5_000, "01/01/2026".into());

        let entries = board.load();
        assert_eq!(entries[0].name, "first");
        assert_eq!(entries[1].name, "second");
    }

    #[test]
    fn an_unreadable_stored_list_starts_empty() {
        let mut store = MemoryStore::new();
        store.set(RANKINGS_KEY, "not json at all");
        let board = Leaderboard::new(store);
        assert!(board.load().is_empty());
    }
}
