use axum::Json;

use dbt_types::api::{QuizQuestion, QuizResult, QuizSubmission};

/// The awareness quiz and the correct option for each question.
const QUIZ: [(QuizQuestion, &str); 3] = [
    (
        QuizQuestion {
            question: "What does DBT stand for?",
            options: &[
                "Direct Bank Transfer",
                "Direct Benefit Transfer",
                "Digital Banking Technology",
                "Data Backup Transfer",
            ],
        },
        "Direct Benefit Transfer",
    ),
    (
        QuizQuestion {
            question: "Why is Aadhaar linking important for DBT?",
            options: &[
                "To verify identity",
                "To ensure timely scholarship transfer",
                "To prevent duplication",
                "All of the above",
            ],
        },
        "All of the above",
    ),
    (
        QuizQuestion {
            question: "Where can you check your DBT status?",
            options: &["Bank Branch", "DBT Portal", "Gram Panchayat", "All of the above"],
        },
        "All of the above",
    ),
];

pub fn questions() -> Vec<QuizQuestion> {
    QUIZ.iter().map(|(q, _)| q.clone()).collect()
}

/// One point per exact match; missing and extra answers score nothing.
pub fn score(answers: &[Option<String>]) -> QuizResult {
    let score = QUIZ
        .iter()
        .zip(answers)
        .filter(|((_, correct), answer)| answer.as_deref() == Some(*correct))
        .count();
    QuizResult {
        score,
        total: QUIZ.len(),
    }
}

/// GET /quiz
pub async fn get_quiz() -> Json<Vec<QuizQuestion>> {
    Json(questions())
}

/// POST /quiz/score
pub async fn score_quiz(Json(req): Json<QuizSubmission>) -> Json<QuizResult> {
    Json(score(&req.answers))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(String::from)).collect()
    }

    #[test]
    fn all_correct() {
        let result = score(&answers(&[
            Some("Direct Benefit Transfer"),
            Some("All of the above"),
            Some("All of the above"),
        ]));
        assert_eq!((result.score, result.total), (3, 3));
    }

    #[test]
    fn unanswered_and_wrong_answers_score_zero() {
        let result = score(&answers(&[Some("Direct Bank Transfer"), None]));
        assert_eq!(result.score, 0);
        assert_eq!(result.total, 3);
    }

    #[test]
    fn every_correct_answer_is_an_option() {
        for (question, correct) in QUIZ.iter() {
            assert!(question.options.contains(correct));
        }
    }
}
