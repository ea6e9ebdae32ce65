//! Question sourcing: remote generation with validation and a degraded
//! retry, falling back to the bundled catalog so a round can always start.

use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::game::bank::fallback_catalog;
use crate::game::question::{Difficulty, Question, OPTION_COUNT};
use crate::gen::client::{extract_json, GenClient, GenError, GenerateRequest, GenerationConfig};

pub const ROUND_SIZE: usize = 20;
const EASY_SLOTS: usize = 8;
const MEDIUM_SLOTS: usize = 8;
const HARD_SLOTS: usize = 4;

/// The degraded retry accepts a shorter set rather than giving up outright.
const DEGRADED_MINIMUM: usize = 10;

const ROUND_PROMPT: &str = r#"Generate EXACTLY 20 different, randomized questions about ISTQB CTFL (Certified Tester Foundation Level) in English.

IMPORTANT: Every question must be unique and different from the others. Vary the topics and concepts.

Distribute the questions like this:
- 8 EASY questions (1000 points each) - basic concepts
- 8 MEDIUM questions (2000 points each) - intermediate concepts
- 4 HARD questions (5000 points each) - advanced concepts

Topics to vary: Testing fundamentals, Test process, Static testing techniques, Test design techniques, Test management, Test tools, Test levels, Test types, Maintenance testing.

Return ONLY valid JSON:
{
  "questions": [
    {
      "question": "Full question here?",
      "options": ["A) First option", "B) Second option", "C) Third option", "D) Fourth option"],
      "correct": 0,
      "difficulty": "easy",
      "points": 1000
    }
  ]
}"#;

const DEGRADED_PROMPT: &str = r#"Create 20 QA/software-testing questions in English in this JSON format:

{
  "questions": [
    {
      "question": "Question about software testing?",
      "options": ["A) option 1", "B) option 2", "C) option 3", "D) option 4"],
      "correct": 0,
      "difficulty": "easy",
      "points": 1000
    }
  ]
}

Distribute: 8 easy (1000pts), 8 medium (2000pts), 4 hard (5000pts)."#;

#[derive(Debug, serde::Deserialize)]
struct GeneratedSet {
    questions: Vec<RawQuestion>,
}

#[derive(Debug, serde::Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    correct: usize,
    difficulty: Option<Difficulty>,
}

impl RawQuestion {
    /// A usable entry has four options and an in-range answer index. The
    /// strict pass also insists on a difficulty tier; the degraded pass
    /// defaults missing tiers to easy.
    fn into_question(self, strict: bool) -> Option<Question> {
        if self.correct >= OPTION_COUNT {
            return None;
        }
        let options: [String; OPTION_COUNT] = self.options.try_into().ok()?;
        let difficulty = match self.difficulty {
            Some(tier) => tier,
            None if strict => return None,
            None => Difficulty::Easy,
        };
        Some(Question::new(self.question, options, self.correct, difficulty))
    }
}

fn parse_round(text: &str, minimum: usize, strict: bool) -> Result<Vec<Question>, GenError> {
    let json = extract_json(text)
        .ok_or_else(|| GenError::InvalidPayload("no JSON object in the reply".into()))?;
    let set: GeneratedSet =
        serde_json::from_str(json).map_err(|err| GenError::InvalidPayload(err.to_string()))?;

    let questions: Vec<Question> = set
        .questions
        .into_iter()
        .filter_map(|raw| raw.into_question(strict))
        .collect();
    if questions.len() < minimum {
        return Err(GenError::InvalidPayload(format!(
            "only {} usable questions, expected at least {}",
            questions.len(),
            minimum
        )));
    }
    Ok(questions)
}

/// Shuffles the obtained set, then regroups deterministically by tier:
/// easy (≤8), medium (≤8), hard (≤4), concatenated in that order. An
/// under-supplied tier just yields a shorter block.
pub fn order_round<R: Rng + ?Sized>(mut questions: Vec<Question>, rng: &mut R) -> Vec<Question> {
    questions.shuffle(rng);

    let tiers = [
        (Difficulty::Easy, EASY_SLOTS),
        (Difficulty::Medium, MEDIUM_SLOTS),
        (Difficulty::Hard, HARD_SLOTS),
    ];
    let mut ordered = Vec::with_capacity(ROUND_SIZE);
    for (tier, slots) in tiers {
        ordered.extend(
            questions
                .iter()
                .filter(|question| question.difficulty == tier)
                .take(slots)
                .cloned(),
        );
    }
    ordered
}

pub struct QuestionSourcing {
    client: GenClient,
}

impl QuestionSourcing {
    pub fn new(client: GenClient) -> Self {
        Self { client }
    }

    /// Produces the ordered question set for one round. Never fails: quota
    /// exhaustion goes straight to the bundled catalog, any other failure
    /// gets one simplified retry first.
    pub async fn generate_round<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Question> {
        let questions = match self.request_full().await {
            Ok(questions) => {
                info!("generated {} questions remotely", questions.len());
                questions
            }
            Err(GenError::CredentialsExhausted) => {
                warn!("generation quota exhausted, using the local catalog");
                fallback_catalog()
            }
            Err(err) => {
                warn!("question generation failed ({err}), retrying with a simplified prompt");
                match self.request_degraded().await {
                    Ok(questions) => {
                        info!("simplified retry produced {} questions", questions.len());
                        questions
                    }
                    Err(err) => {
                        warn!("simplified retry failed ({err}), using the local catalog");
                        fallback_catalog()
                    }
                }
            }
        };
        order_round(questions, rng)
    }

    async fn request_full(&self) -> Result<Vec<Question>, GenError> {
        let request = GenerateRequest::new(ROUND_PROMPT)
            .with_config(GenerationConfig {
                temperature: 0.9,
                top_k: 1,
                top_p: 1.0,
                max_output_tokens: 4096,
            })
            .with_default_safety();
        let text = self.client.generate(&request).await?;
        parse_round(&text, ROUND_SIZE, true)
    }

    async fn request_degraded(&self) -> Result<Vec<Question>, GenError> {
        let request = GenerateRequest::new(DEGRADED_PROMPT);
        let text = self.client.generate_primary(&request).await?;
        parse_round(&text, DEGRADED_MINIMUM, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn entry(difficulty: &str, index: usize) -> String {
        format!(
            r#"{{"question": "Q{index}?", "options": ["A) a", "B) b", "C) c", "D) d"], "correct": 1, "difficulty": "{difficulty}", "points": 1000}}"#
        )
    }

    fn payload(counts: [usize; 3]) -> String {
        let mut entries = Vec::new();
        for (tier, count) in ["easy", "medium", "hard"].iter().zip(counts) {
            for index in 0..count {
                entries.push(entry(tier, index));
            }
        }
        format!(r#"{{"questions": [{}]}}"#, entries.join(","))
    }

    #[test]
    fn strict_parse_accepts_a_full_set() {
        let questions = parse_round(&payload([8, 8, 4]), ROUND_SIZE, true).unwrap();
        assert_eq!(questions.len(), 20);
    }

    #[test]
    fn strict_parse_rejects_a_short_set() {
        let err = parse_round(&payload([8, 8, 3]), ROUND_SIZE, true).unwrap_err();
        assert!(matches!(err, GenError::InvalidPayload(_)));
    }

    #[test]
    fn strict_parse_rejects_missing_difficulty() {
        let json = r#"{"questions": [{"question": "Q?", "options": ["A) a", "B) b", "C) c", "D) d"], "correct": 0}]}"#;
        let err = parse_round(json, 1, true).unwrap_err();
        assert!(matches!(err, GenError::InvalidPayload(_)));
    }

    #[test]
    fn degraded_parse_defaults_missing_difficulty_to_easy() {
        let json = r#"{"questions": [{"question": "Q?", "options": ["A) a", "B) b", "C) c", "D) d"], "correct": 0}]}"#;
        let questions = parse_round(json, 1, false).unwrap();
        assert_eq!(questions[0].difficulty, Difficulty::Easy);
        assert_eq!(questions[0].points(), 1000);
    }

    #[test]
    fn unusable_entries_are_dropped_not_fatal() {
        // Bad answer index and wrong option count get filtered out.
        let json = r#"{"questions": [
            {"question": "bad index?", "options": ["A) a", "B) b", "C) c", "D) d"], "correct": 4, "difficulty": "easy"},
            {"question": "three options?", "options": ["A) a", "B) b", "C) c"], "correct": 0, "difficulty": "easy"},
            {"question": "fine?", "options": ["A) a", "B) b", "C) c", "D) d"], "correct": 3, "difficulty": "hard"}
        ]}"#;
        let questions = parse_round(json, 1, true).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].prompt, "fine?");
    }

    #[test]
    fn parse_handles_fenced_replies() {
        let text = format!("Sure thing!\n```json\n{}\n```", payload([8, 8, 4]));
        assert_eq!(parse_round(&text, ROUND_SIZE, true).unwrap().len(), 20);
    }

    #[test]
    fn parse_rejects_a_reply_without_json() {
        assert!(parse_round("I cannot help with that.", 1, true).is_err());
    }

    #[test]
    fn ordering_groups_tiers_with_caps() {
        let mut rng = StdRng::seed_from_u64(7);
        // Over-supply every tier; the caps must bite.
        let questions = parse_round(&payload([12, 12, 6]), 30, true).unwrap();
        let ordered = order_round(questions, &mut rng);

        assert_eq!(ordered.len(), ROUND_SIZE);
        assert!(ordered[..8].iter().all(|q| q.difficulty == Difficulty::Easy));
        assert!(ordered[8..16].iter().all(|q| q.difficulty == Difficulty::Medium));
        assert!(ordered[16..].iter().all(|q| q.difficulty == Difficulty::Hard));
    }

    #[test]
    fn ordering_tolerates_an_under_supplied_tier() {
        let mut rng = StdRng::seed_from_u64(7);
        let questions = parse_round(&payload([2, 1, 0]), 3, true).unwrap();
        let ordered = order_round(questions, &mut rng);

        assert_eq!(ordered.len(), 3);
        assert_eq!(ordered[0].difficulty, Difficulty::Easy);
        assert_eq!(ordered[1].difficulty, Difficulty::Easy);
        assert_eq!(ordered[2].difficulty, Difficulty::Medium);
    }

    #[test]
    fn ordering_is_deterministic_for_a_fixed_seed() {
        let questions = parse_round(&payload([8, 8, 4]), ROUND_SIZE, true).unwrap();
        let a = order_round(questions.clone(), &mut StdRng::seed_from_u64(42));
        let b = order_round(questions, &mut StdRng::seed_from_u64(42));
        let prompts = |round: &[Question]| {
            round.iter().map(|q| q.prompt.clone()).collect::<Vec<_>>()
        };
        assert_eq!(prompts(&a), prompts(&b));
    }

    #[tokio::test]
    async fn quota_exhaustion_serves_a_full_round_from_the_bank() {
        // An empty credential list exhausts the rotation immediately, so
        // this exercises the quota → local-catalog path without touching
        // the network: still exactly 20 questions, grouped 8/8/4.
        let sourcing = QuestionSourcing::new(GenClient::new(Vec::new()));
        let mut rng = StdRng::seed_from_u64(3);

        let round = sourcing.generate_round(&mut rng).await;

        assert_eq!(round.len(), ROUND_SIZE);
        assert!(round[..8].iter().all(|q| q.difficulty == Difficulty::Easy));
        assert!(round[8..16].iter().all(|q| q.difficulty == Difficulty::Medium));
        assert!(round[16..].iter().all(|q| q.difficulty == Difficulty::Hard));
    }

    #[test]
    fn fallback_catalog_orders_into_a_full_round() {
        // Total network failure ends up here: the bank must always fill
        // the exact 8/8/4 layout.
        let mut rng = StdRng::seed_from_u64(1);
        let ordered = order_round(fallback_catalog(), &mut rng);
        assert_eq!(ordered.len(), ROUND_SIZE);
        assert!(ordered[..8].iter().all(|q| q.difficulty == Difficulty::Easy));
        assert!(ordered[8..16].iter().all(|q| q.difficulty == Difficulty::Medium));
        assert!(ordered[16..].iter().all(|q| q.difficulty == Difficulty::Hard));
    }
}
