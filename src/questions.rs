use std::error::Error;

use lazy_static::lazy_static;

use crate::error::EmptyQuestionBankError;
use crate::structs::model::{Difficulty, Question};
use crate::utils::read_file;

fn question(id: u32, category: &str, text: &str, answer: &str, difficulty: Difficulty) -> Question {
    Question {
        id,
        category: category.to_string(),
        question: text.to_string(),
        correct_answer: answer.to_string(),
        difficulty,
    }
}

lazy_static! {
    pub static ref SCIENCE_QUESTIONS: Vec<Question> = vec![
        question(1, "Physics", "What is the speed of light in vacuum?", "299,792,458 m/s", Difficulty::Medium),
        question(2, "Chemistry", "What is the chemical symbol for gold?", "Au", Difficulty::Easy),
        question(3, "Biology", "Which organelle is responsible for photosynthesis in plant cells?", "Chloroplast", Difficulty::Medium),
        question(4, "Physics", "What is Newton's second law of motion?", "F = ma", Difficulty::Easy),
        question(5, "Chemistry", "What is the pH of pure water at 25°C?", "7", Difficulty::Easy),
        question(6, "Biology", "How many chambers does a human heart have?", "4", Difficulty::Easy),
        question(7, "Physics", "What is the unit of electric current?", "Ampere", Difficulty::Medium),
        question(8, "Chemistry", "Which gas makes up approximately 78% of Earth's atmosphere?", "Nitrogen", Difficulty::Medium),
        question(9, "Biology", "What is the powerhouse of the cell?", "Mitochondria", Difficulty::Easy),
        question(10, "Physics", "What is the acceleration due to gravity on Earth?", "9.8 m/s²", Difficulty::Medium),
        question(11, "Chemistry", "What is the most abundant element in the universe?", "Hydrogen", Difficulty::Hard),
        question(12, "Biology", "Which blood type is known as the universal donor?", "O", Difficulty::Medium),
        question(13, "Physics", "What is the smallest unit of matter?", "Quark", Difficulty::Hard),
        question(14, "Chemistry", "What is the hardest natural substance on Earth?", "Diamond", Difficulty::Easy),
        question(15, "Biology", "What is the largest organ in the human body?", "Skin", Difficulty::Medium),
    ];
}

/// Loads the question bank from a JSON array, or the built-in science bank when no file is given.
pub fn load_questions(file_path: Option<&str>) -> Result<Vec<Question>, Box<dyn Error + Send + Sync>> {
    let Some(file_path) = file_path else {
        return Ok(SCIENCE_QUESTIONS.clone());
    };
    let contents = read_file(file_path)?;
    let questions: Vec<Question> = serde_json::from_str(&contents)?;
    if questions.is_empty() {
        return Err(Box::new(EmptyQuestionBankError));
    }
    log::info!("Loaded {} questions from {}", questions.len(), file_path);
    Ok(questions)
}
