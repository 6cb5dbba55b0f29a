//! Row mappers and the encoded-blob convention for nested payloads.
//!
//! Questions, training steps and answer maps are persisted as single JSON
//! TEXT columns (encode on write, decode on read). Everything above this
//! module works with the canonical decoded domain types only.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use portal_core::model::{
    Agent, AgentId, AgentRole, AssessmentResult, MediaRef, Question, QuestionId, Quiz, QuizId,
    ResultId, TrainingId, TrainingMaterial, TrainingProgress, TrainingStep,
};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn agent_id_from_i64(v: i64) -> Result<AgentId, StorageError> {
    Ok(AgentId::new(i64_to_u64("agent_id", v)?))
}

pub(crate) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    Ok(QuizId::new(i64_to_u64("quiz_id", v)?))
}

pub(crate) fn training_id_from_i64(v: i64) -> Result<TrainingId, StorageError> {
    Ok(TrainingId::new(i64_to_u64("training_id", v)?))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

//
// ─── ENCODED PAYLOAD DOCUMENTS ─────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
struct MediaDoc {
    kind: String,
    url: String,
}

impl MediaDoc {
    fn from_media(media: &MediaRef) -> Self {
        let kind = if media.is_video() { "video" } else { "image" };
        Self {
            kind: kind.to_owned(),
            url: media.url().as_str().to_owned(),
        }
    }

    fn into_media(self) -> Result<MediaRef, StorageError> {
        match self.kind.as_str() {
            "image" => MediaRef::image(&self.url).map_err(ser),
            "video" => MediaRef::video(&self.url).map_err(ser),
            other => Err(StorageError::Serialization(format!(
                "invalid media kind: {other}"
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct QuestionDoc {
    id: u64,
    prompt: String,
    options: Vec<String>,
    correct_option: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    media: Option<MediaDoc>,
}

impl QuestionDoc {
    fn from_question(question: &Question) -> Self {
        Self {
            id: question.id().value(),
            prompt: question.prompt().to_owned(),
            options: question.options().to_vec(),
            correct_option: question.correct_option(),
            media: question.media().map(MediaDoc::from_media),
        }
    }

    fn into_question(self) -> Result<Question, StorageError> {
        let media = self.media.map(MediaDoc::into_media).transpose()?;
        Question::new(
            QuestionId::new(self.id),
            self.prompt,
            self.options,
            self.correct_option,
            media,
        )
        .map_err(ser)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StepDoc {
    Content {
        title: String,
        body: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media: Option<MediaDoc>,
    },
    Quiz {
        title: String,
        body: String,
        question: QuestionDoc,
    },
}

impl StepDoc {
    fn from_step(step: &TrainingStep) -> Self {
        match step {
            TrainingStep::Content { title, body, media } => StepDoc::Content {
                title: title.clone(),
                body: body.clone(),
                media: media.as_ref().map(MediaDoc::from_media),
            },
            TrainingStep::Quiz {
                title,
                body,
                question,
            } => StepDoc::Quiz {
                title: title.clone(),
                body: body.clone(),
                question: QuestionDoc::from_question(question),
            },
        }
    }

    fn into_step(self) -> Result<TrainingStep, StorageError> {
        match self {
            StepDoc::Content { title, body, media } => {
                let media = media.map(MediaDoc::into_media).transpose()?;
                TrainingStep::content(title, body, media).map_err(ser)
            }
            StepDoc::Quiz {
                title,
                body,
                question,
            } => TrainingStep::quiz(title, body, question.into_question()?).map_err(ser),
        }
    }
}

pub(crate) fn encode_questions(questions: &[Question]) -> Result<String, StorageError> {
    let docs: Vec<QuestionDoc> = questions.iter().map(QuestionDoc::from_question).collect();
    serde_json::to_string(&docs).map_err(ser)
}

pub(crate) fn decode_questions(raw: &str) -> Result<Vec<Question>, StorageError> {
    let docs: Vec<QuestionDoc> = serde_json::from_str(raw).map_err(ser)?;
    docs.into_iter().map(QuestionDoc::into_question).collect()
}

pub(crate) fn encode_steps(steps: &[TrainingStep]) -> Result<String, StorageError> {
    let docs: Vec<StepDoc> = steps.iter().map(StepDoc::from_step).collect();
    serde_json::to_string(&docs).map_err(ser)
}

pub(crate) fn decode_steps(raw: &str) -> Result<Vec<TrainingStep>, StorageError> {
    let docs: Vec<StepDoc> = serde_json::from_str(raw).map_err(ser)?;
    docs.into_iter().map(StepDoc::into_step).collect()
}

pub(crate) fn encode_answers(answers: &HashMap<QuestionId, usize>) -> Result<String, StorageError> {
    let doc: HashMap<String, usize> = answers
        .iter()
        .map(|(id, idx)| (id.value().to_string(), *idx))
        .collect();
    serde_json::to_string(&doc).map_err(ser)
}

pub(crate) fn decode_answers(raw: &str) -> Result<HashMap<QuestionId, usize>, StorageError> {
    let doc: HashMap<String, usize> = serde_json::from_str(raw).map_err(ser)?;
    doc.into_iter()
        .map(|(id, idx)| {
            let id: u64 = id
                .parse()
                .map_err(|_| StorageError::Serialization(format!("invalid question id: {id}")))?;
            Ok((QuestionId::new(id), idx))
        })
        .collect()
}

//
// ─── ROW MAPPERS ───────────────────────────────────────────────────────────────
//

pub(crate) fn map_agent_row(row: &SqliteRow) -> Result<Agent, StorageError> {
    let id = agent_id_from_i64(row.try_get("id").map_err(ser)?)?;
    let name: String = row.try_get("name").map_err(ser)?;
    let email: String = row.try_get("email").map_err(ser)?;
    let role_raw: String = row.try_get("role").map_err(ser)?;
    let role = AgentRole::from_str_opt(&role_raw)
        .ok_or_else(|| StorageError::Serialization(format!("invalid role: {role_raw}")))?;

    Agent::new(id, name, email, role).map_err(ser)
}

pub(crate) fn map_quiz_row(row: &SqliteRow) -> Result<Quiz, StorageError> {
    let id = quiz_id_from_i64(row.try_get("id").map_err(ser)?)?;
    let title: String = row.try_get("title").map_err(ser)?;
    let description: Option<String> = row.try_get("description").map_err(ser)?;
    let visible: i64 = row.try_get("visible").map_err(ser)?;
    let questions = decode_questions(&row.try_get::<String, _>("questions").map_err(ser)?)?;

    Quiz::new(id, title, description, questions, visible != 0).map_err(ser)
}

pub(crate) fn map_training_row(row: &SqliteRow) -> Result<TrainingMaterial, StorageError> {
    let id = training_id_from_i64(row.try_get("id").map_err(ser)?)?;
    let title: String = row.try_get("title").map_err(ser)?;
    let description: Option<String> = row.try_get("description").map_err(ser)?;
    let visible: i64 = row.try_get("visible").map_err(ser)?;
    let steps = decode_steps(&row.try_get::<String, _>("steps").map_err(ser)?)?;

    TrainingMaterial::new(id, title, description, steps, visible != 0).map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<TrainingProgress, StorageError> {
    let current_step: i64 = row.try_get("current_step").map_err(ser)?;
    let percent: i64 = row.try_get("percent").map_err(ser)?;
    let completed: i64 = row.try_get("completed").map_err(ser)?;

    let current_step = usize::try_from(current_step)
        .map_err(|_| StorageError::Serialization("current_step sign overflow".into()))?;
    let percent = u8::try_from(percent)
        .map_err(|_| StorageError::Serialization("percent out of range".into()))?;

    TrainingProgress::from_persisted(current_step, percent, completed != 0).map_err(ser)
}

pub(crate) fn map_result_row(row: &SqliteRow) -> Result<AssessmentResult, StorageError> {
    let id_raw: String = row.try_get("id").map_err(ser)?;
    let id: ResultId = id_raw.parse().map_err(ser)?;
    let quiz_id = quiz_id_from_i64(row.try_get("quiz_id").map_err(ser)?)?;
    let quiz_title: String = row.try_get("quiz_title").map_err(ser)?;
    let agent_id = agent_id_from_i64(row.try_get("agent_id").map_err(ser)?)?;
    let agent_name: String = row.try_get("agent_name").map_err(ser)?;
    let score: i64 = row.try_get("score").map_err(ser)?;
    let total: i64 = row.try_get("total_questions").map_err(ser)?;
    let completed_at: chrono::DateTime<chrono::Utc> = row.try_get("completed_at").map_err(ser)?;
    let duration: i64 = row.try_get("duration_secs").map_err(ser)?;
    let answers = decode_answers(&row.try_get::<String, _>("answers").map_err(ser)?)?;

    // The stored percentage column is ignored; the constructor recomputes it
    // from score/total so drifted values cannot re-enter the system.
    AssessmentResult::new(
        id,
        quiz_id,
        quiz_title,
        agent_id,
        agent_name,
        u32::try_from(score).map_err(|_| StorageError::Serialization("score overflow".into()))?,
        u32::try_from(total)
            .map_err(|_| StorageError::Serialization("total_questions overflow".into()))?,
        completed_at,
        u32::try_from(duration)
            .map_err(|_| StorageError::Serialization("duration_secs overflow".into()))?,
        answers,
    )
    .map_err(ser)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn build_question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            vec!["a".into(), "b".into(), "c".into()],
            1,
            Some(MediaRef::image("https://example.org/aedes.jpeg").unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn questions_round_trip_through_blob() {
        let questions = vec![build_question(1), build_question(2)];
        let blob = encode_questions(&questions).unwrap();
        let decoded = decode_questions(&blob).unwrap();
        assert_eq!(decoded, questions);
    }

    #[test]
    fn steps_round_trip_through_blob() {
        let steps = vec![
            TrainingStep::content("Intro", "Body", None).unwrap(),
            TrainingStep::quiz("Check", "Quick check", build_question(7)).unwrap(),
        ];
        let blob = encode_steps(&steps).unwrap();
        let decoded = decode_steps(&blob).unwrap();
        assert_eq!(decoded, steps);
    }

    #[test]
    fn answers_round_trip_through_blob() {
        let mut answers = HashMap::new();
        answers.insert(QuestionId::new(1), 0);
        answers.insert(QuestionId::new(2), 3);
        let blob = encode_answers(&answers).unwrap();
        let decoded = decode_answers(&blob).unwrap();
        assert_eq!(decoded, answers);
    }

    #[test]
    fn decode_rejects_malformed_blob() {
        assert!(decode_questions("not json").is_err());
        assert!(decode_steps("{\"type\":\"mystery\"}").is_err());
        assert!(decode_answers("{\"abc\": 1}").is_err());
    }
}
