//! Bundled fallback catalog: 20 vetted ISTQB CTFL questions (8 easy,
//! 8 medium, 4 hard). Used whenever remote generation cannot deliver a
//! round, so a game can always start.

use crate::game::question::{Difficulty, Question};

fn q(difficulty: Difficulty, prompt: &str, options: [&str; 4], correct: usize) -> Question {
    Question::new(prompt, options.map(str::to_string), correct, difficulty)
}

pub fn fallback_catalog() -> Vec<Question> {
    vec![
        // Easy (1000 points)
        q(
            Difficulty::Easy,
            "What is software testing according to the ISTQB?",
            [
                "A) Only finding defects",
                "B) A process of verification and validation",
                "C) Only executing code",
                "D) Documenting bugs",
            ],
            1,
        ),
        q(
            Difficulty::Easy,
            "What is the main objective of software testing?",
            [
                "A) Proving there are no defects",
                "B) Finding every defect",
                "C) Reducing the risk of failures",
                "D) Speeding up development",
            ],
            2,
        ),
        q(
            Difficulty::Easy,
            "What are test cases?",
            [
                "A) Only input data",
                "B) Specifications of how to test",
                "C) Defect reports",
                "D) Program code",
            ],
            1,
        ),
        q(
            Difficulty::Easy,
            "What is a defect in software?",
            [
                "A) A feature",
                "B) A requirement",
                "C) A flaw in the code",
                "D) An executed test",
            ],
            2,
        ),
        q(
            Difficulty::Easy,
            "What is the difference between an error and a defect?",
            [
                "A) They are the same thing",
                "B) An error is human, a defect is in the code",
                "C) A defect is more severe",
                "D) There is no difference",
            ],
            1,
        ),
        q(
            Difficulty::Easy,
            "What is static testing?",
            [
                "A) Testing without executing the code",
                "B) Very slow testing",
                "C) Automated testing",
                "D) Performance testing",
            ],
            0,
        ),
        q(
            Difficulty::Easy,
            "What is dynamic testing?",
            [
                "A) Very fast testing",
                "B) Testing by executing the software",
                "C) Review-based testing",
                "D) Interface testing",
            ],
            1,
        ),
        q(
            Difficulty::Easy,
            "How many testing principles does the ISTQB define?",
            [
                "A) 5 principles",
                "B) 6 principles",
                "C) 7 principles",
                "D) 8 principles",
            ],
            2,
        ),
        // Medium (2000 points)
        q(
            Difficulty::Medium,
            "Which technique is an example of black-box testing?",
            [
                "A) Code coverage",
                "B) Equivalence partitioning",
                "C) Data flow testing",
                "D) Mutation analysis",
            ],
            1,
        ),
        q(
            Difficulty::Medium,
            "What is boundary value analysis?",
            [
                "A) Testing only maximum values",
                "B) Testing values at the edges of partitions",
                "C) Testing random values",
                "D) Testing only minimum values",
            ],
            1,
        ),
        q(
            Difficulty::Medium,
            "What is the correct order of the test levels?",
            [
                "A) System, Integration, Unit, Acceptance",
                "B) Unit, Integration, System, Acceptance",
                "C) Acceptance, System, Integration, Unit",
                "D) Integration, Unit, System, Acceptance",
            ],
            1,
        ),
        q(
            Difficulty::Medium,
            "What characterizes regression testing?",
            [
                "A) Testing new features",
                "B) Repeating tests after changes",
                "C) Performance testing",
                "D) Usability testing",
            ],
            1,
        ),
        q(
            Difficulty::Medium,
            "What is decision coverage?",
            [
                "A) Covering every line",
                "B) Covering every true/false branch",
                "C) Covering every function",
                "D) Covering every module",
            ],
            1,
        ),
        q(
            Difficulty::Medium,
            "Which phase of the test process comes first?",
            [
                "A) Execution",
                "B) Planning",
                "C) Analysis",
                "D) Implementation",
            ],
            1,
        ),
        q(
            Difficulty::Medium,
            "What is exploratory testing?",
            [
                "A) Testing without any planning",
                "B) Simultaneous learning, design and execution",
                "C) Automated testing",
                "D) Stress testing",
            ],
            1,
        ),
        q(
            Difficulty::Medium,
            "What characterizes the V-model?",
            [
                "A) Linear development",
                "B) Each development phase has a matching test phase",
                "C) Only for agile projects",
                "D) No documentation",
            ],
            1,
        ),
        // Hard (5000 points)
        q(
            Difficulty::Hard,
            "In state transition testing, what is an invalid state?",
            [
                "A) A state that is never reached",
                "B) A state not specified in the model",
                "C) A system error state",
                "D) The initial state of the system",
            ],
            1,
        ),
        q(
            Difficulty::Hard,
            "What is MC/DC (Modified Condition/Decision Coverage)?",
            [
                "A) Covering every decision",
                "B) Each condition independently affects the outcome",
                "C) Covering every condition",
                "D) Covering every path",
            ],
            1,
        ),
        q(
            Difficulty::Hard,
            "In risk-based testing, what is the most important factor?",
            [
                "A) Technical complexity only",
                "B) Probability times impact",
                "C) Available time only",
                "D) Team resources only",
            ],
            1,
        ),
        q(
            Difficulty::Hard,
            "What characterizes mutation testing?",
            [
                "A) Testing with random data",
                "B) Seeding artificial defects to evaluate the tests",
                "C) Testing multiple versions",
                "D) Testing requirement changes",
            ],
            1,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_twenty_questions_split_8_8_4() {
        let catalog = fallback_catalog();
        assert_eq!(catalog.len(), 20);

        let count = |tier| catalog.iter().filter(|q| q.difficulty == tier).count();
        assert_eq!(count(Difficulty::Easy), 8);
        assert_eq!(count(Difficulty::Medium), 8);
        assert_eq!(count(Difficulty::Hard), 4);
    }

    #[test]
    fn every_answer_index_is_in_range() {
        for question in fallback_catalog() {
            assert!(
                question.correct < question.options.len(),
                "out-of-range answer in {:?}",
                question.prompt
            );
        }
    }
}
