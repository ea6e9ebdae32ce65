/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// Difficulty tier of a question. The tier alone determines the point value,
/// matching the 8 easy / 8 medium / 4 hard round layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn points(self) -> u32 {
        match self {
            Difficulty::Easy => 1000,
            Difficulty::Medium => 2000,
            Difficulty::Hard => 5000,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// A single multiple-choice question. Immutable once built; `correct` is a
/// zero-based index into `options` and is guaranteed to be in range by every
/// constructor path (bank and pipeline both validate it).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: [String; OPTION_COUNT],
    pub correct: usize,
    pub difficulty: Difficulty,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct: usize,
        difficulty: Difficulty,
    ) -> Self {
        debug_assert!(correct < OPTION_COUNT);
        Self {
            prompt: prompt.into(),
            options,
            correct,
            difficulty,
        }
    }

    pub fn points(&self) -> u32 {
        self.difficulty.points()
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_points_match_round_layout() {
        assert_eq!(Difficulty::Easy.points(), 1000);
        assert_eq!(Difficulty::Medium.points(), 2000);
        assert_eq!(Difficulty::Hard.points(), 5000);
    }

    #[test]
    fn difficulty_parses_lowercase() {
        let parsed: Difficulty = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, Difficulty::Medium);
        assert!(serde_json::from_str::<Difficulty>("\"MEDIUM\"").is_err());
    }

    #[test]
    fn correct_option_text() {
        let q = Question::new(
            "What is static testing?",
            [
                "A) Testing without executing code".to_string(),
                "B) Very slow testing".to_string(),
                "C) Automated testing".to_string(),
                "D) Performance testing".to_string(),
            ],
            0,
            Difficulty::Easy,
        );
        assert_eq!(q.correct_option(), "A) Testing without executing code");
        assert_eq!(q.points(), 1000);
    }
}
