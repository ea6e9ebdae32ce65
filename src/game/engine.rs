//! The round engine: a self-contained state machine for one playthrough of
//! up to 20 questions under the 3-lives rule, with three one-shot helps.
//!
//! Contract violations (answering twice, reusing a help, acting on a
//! finished round) are silent no-ops returning `None`/`false` — the
//! presentation layer disables the controls, but the engine stays defensive
//! regardless.

use crate::game::question::{Question, OPTION_COUNT};

pub const STARTING_LIVES: u32 = 3;

/// How a finished round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Outcome {
    /// All questions answered through to the end.
    Victory,
    /// Lives reached zero.
    Defeat,
    /// The player quit mid-round.
    Abandoned,
    /// The skip help carried the player past the final question.
    CompletedViaSkip,
}

/// Phase of the current question: still waiting for an answer, or answered
/// and waiting to move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    AwaitingAnswer,
    Revealed,
}

/// One-shot help flags, scoped to the whole round (not per question).
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct HelpFlags {
    pub hint: bool,
    pub eliminate_two: bool,
    pub skip: bool,
}

/// Result of a recorded answer, for feedback and narration.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub correct: bool,
    pub score: u32,
    pub lives: u32,
    /// The correct option's text, provided on a miss.
    pub correct_option: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RoundState {
    questions: Vec<Question>,
    current: usize,
    score: u32,
    lives: u32,
    helps: HelpFlags,
    phase: Phase,
    eliminated: Vec<usize>,
    started: bool,
    finished: bool,
    outcome: Option<Outcome>,
}

impl RoundState {
    /// Starts a fresh round over the given (already ordered) questions.
    /// Restarting is simply replacing the old state with a new one; nothing
    /// carries over.
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            current: 0,
            score: 0,
            lives: STARTING_LIVES,
            helps: HelpFlags::default(),
            phase: Phase::AwaitingAnswer,
            eliminated: Vec::new(),
            started: true,
            finished: false,
            outcome: None,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn helps(&self) -> HelpFlags {
        self.helps
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// 1-based number of the current question, for display.
    pub fn question_number(&self) -> usize {
        self.current + 1
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.finished {
            return None;
        }
        self.questions.get(self.current)
    }

    /// Option indices eliminated on the current question.
    pub fn eliminated(&self) -> &[usize] {
        &self.eliminated
    }

    /// Records an answer for the current question. No-op when the round is
    /// over, an answer is already recorded, or the option index is bogus.
    pub fn submit_answer(&mut self, option: usize) -> Option<AnswerResult> {
        if self.finished || self.phase == Phase::Revealed || option >= OPTION_COUNT {
            return None;
        }
        let question = self.questions.get(self.current)?;

        self.phase = Phase::Revealed;
        if option == question.correct {
            self.score += question.points();
            Some(AnswerResult {
                correct: true,
                score: self.score,
                lives: self.lives,
                correct_option: None,
            })
        } else {
            let correct_option = question.correct_option().to_string();
            self.lives -= 1;
            if self.lives == 0 {
                // The fatal question stays current so the summary can point
                // at it; score and lives freeze here.
                self.finish(Outcome::Defeat);
            }
            Some(AnswerResult {
                correct: false,
                score: self.score,
                lives: self.lives,
                correct_option: Some(correct_option),
            })
        }
    }

    /// Moves past an answered question. Reaching the end of the list here
    /// finishes the round as a victory.
    pub fn advance(&mut self) -> bool {
        if self.finished || self.phase != Phase::Revealed {
            return false;
        }
        self.step();
        if self.current >= self.questions.len() {
            self.finish(Outcome::Victory);
        }
        true
    }

    /// Spends the hint help and returns the question to fetch advice for.
    /// The help counts as used even if the advice later degrades to a
    /// canned fallback.
    pub fn use_hint(&mut self) -> Option<Question> {
        if self.finished || self.helps.hint {
            return None;
        }
        let question = self.questions.get(self.current)?.clone();
        self.helps.hint = true;
        Some(question)
    }

    /// Spends the eliminate-two help: marks the first two non-correct
    /// options (ascending) eliminated for the current question only.
    pub fn use_eliminate_two(&mut self) -> Option<[usize; 2]> {
        if self.finished || self.helps.eliminate_two {
            return None;
        }
        let correct = self.questions.get(self.current)?.correct;
        let mut picked = (0..OPTION_COUNT).filter(|&i| i != correct);
        let eliminated = [picked.next()?, picked.next()?];

        self.helps.eliminate_two = true;
        self.eliminated = eliminated.to_vec();
        Some(eliminated)
    }

    /// Spends the skip help: advances without touching score or lives.
    /// Skipping past the final question ends the round, distinct from a
    /// victory since a question went unanswered.
    pub fn use_skip(&mut self) -> bool {
        if self.finished || self.helps.skip || self.phase == Phase::Revealed {
            return false;
        }
        self.helps.skip = true;
        self.step();
        if self.current >= self.questions.len() {
            self.finish(Outcome::CompletedViaSkip);
        }
        true
    }

    /// Ends the round immediately, freezing the current score.
    pub fn abandon(&mut self) -> bool {
        if !self.started || self.finished {
            return false;
        }
        self.finish(Outcome::Abandoned);
        true
    }

    fn step(&mut self) {
        self.current += 1;
        self.phase = Phase::AwaitingAnswer;
        self.eliminated.clear();
    }

    fn finish(&mut self, outcome: Outcome) {
        self.finished = true;
        self.outcome = Some(outcome);
    }
}
