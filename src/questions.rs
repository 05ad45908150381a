/// Question bank loading and validation.
///
/// The bank is a JSON array of `{ "question", "choices", "answer" }`
/// records.  Records that can never be answered correctly are dropped at
/// load time with a warning; a bank left with nothing playable is an error.

use std::fs;
use std::path::Path;

use crate::entities::Question;
use crate::error::QuizError;

const EMBEDDED_QUESTIONS: &str = include_str!("../assets/questions.json");

/// A non-empty list of answerable questions, in file order.
#[derive(Clone, Debug)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        let total = questions.len();
        let questions: Vec<Question> = questions
            .into_iter()
            .filter(|q| {
                if q.choices.is_empty() {
                    log::warn!("skipping question with no choices: {:?}", q.text);
                    false
                } else if !q.is_answerable() {
                    log::warn!(
                        "skipping question whose answer {:?} is not among its choices: {:?}",
                        q.answer,
                        q.text
                    );
                    false
                } else {
                    true
                }
            })
            .collect();

        if questions.is_empty() {
            return Err(QuizError::EmptyBank);
        }
        log::debug!("question bank: {} of {} records usable", questions.len(), total);
        Ok(Self { questions })
    }

    /// Parse a JSON document.  `source` names it in errors.
    pub fn from_json(json: &str, source: &Path) -> Result<Self, QuizError> {
        let questions: Vec<Question> =
            serde_json::from_str(json).map_err(|e| QuizError::Parse {
                path: source.to_path_buf(),
                source: e,
            })?;
        Self::new(questions)
    }

    pub fn load(path: &Path) -> Result<Self, QuizError> {
        let json = fs::read_to_string(path).map_err(|e| QuizError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let bank = Self::from_json(&json, path)?;
        log::info!("loaded {} questions from {}", bank.len(), path.display());
        Ok(bank)
    }

    /// The bank compiled into the binary.
    pub fn embedded() -> Result<Self, QuizError> {
        Self::from_json(EMBEDDED_QUESTIONS, Path::new("<embedded questions.json>"))
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
