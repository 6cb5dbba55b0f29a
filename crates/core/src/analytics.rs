//! Analytics aggregator: read-only projections over the full history.
//!
//! Every projection is recomputed fresh from its inputs on each call; at the
//! expected data volumes recomputation is cheaper than cache invalidation.
//! Empty inputs produce documented zero values, never errors.

use std::collections::HashMap;

use crate::model::{
    Agent, AgentId, AssessmentResult, Question, Quiz, TrainingMaterial, TrainingProgress,
};

/// Inclusive pass threshold for an attempt, in percent. Fixed policy.
pub const PASS_THRESHOLD_PCT: f64 = 70.0;

//
// ─── TRAINING COMPLETION ───────────────────────────────────────────────────────
//

/// Completion figures for one training module.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingCompletionStats {
    pub training_id: crate::model::TrainingId,
    pub title: String,
    pub completions: usize,
    pub completion_rate_pct: f64,
}

/// Counts agents that finished the module and relates them to the total
/// agent count. Zero agents yields a 0% rate, not a division error.
#[must_use]
pub fn training_completion(
    material: &TrainingMaterial,
    progress: &HashMap<AgentId, TrainingProgress>,
    total_agents: usize,
) -> TrainingCompletionStats {
    let completions = progress.values().filter(|p| p.is_completed()).count();
    let completion_rate_pct = if total_agents == 0 {
        0.0
    } else {
        completions as f64 / total_agents as f64 * 100.0
    };

    TrainingCompletionStats {
        training_id: material.id(),
        title: material.title().to_owned(),
        completions,
        completion_rate_pct,
    }
}

//
// ─── ASSESSMENT PERFORMANCE ────────────────────────────────────────────────────
//

/// Aggregate performance figures for one quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentStats {
    pub quiz_id: crate::model::QuizId,
    pub title: String,
    pub completions: usize,
    pub avg_score_pct: f64,
    pub pass_rate_pct: f64,
}

/// Average percentage and pass rate over every attempt on the quiz.
///
/// Attempts are NOT deduplicated by agent; each one counts. The pass
/// threshold is inclusive at [`PASS_THRESHOLD_PCT`].
#[must_use]
pub fn assessment_performance(quiz: &Quiz, history: &[AssessmentResult]) -> AssessmentStats {
    let attempts: Vec<&AssessmentResult> =
        history.iter().filter(|r| r.quiz_id() == quiz.id()).collect();

    if attempts.is_empty() {
        return AssessmentStats {
            quiz_id: quiz.id(),
            title: quiz.title().to_owned(),
            completions: 0,
            avg_score_pct: 0.0,
            pass_rate_pct: 0.0,
        };
    }

    let n = attempts.len() as f64;
    let avg_score_pct = attempts.iter().map(|r| r.percentage()).sum::<f64>() / n;
    let passed = attempts
        .iter()
        .filter(|r| r.passed(PASS_THRESHOLD_PCT))
        .count();

    AssessmentStats {
        quiz_id: quiz.id(),
        title: quiz.title().to_owned(),
        completions: attempts.len(),
        avg_score_pct,
        pass_rate_pct: passed as f64 / n * 100.0,
    }
}

//
// ─── AGENT PERFORMANCE ─────────────────────────────────────────────────────────
//

/// Attempt count and mean percentage for one agent across all quizzes.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStats {
    pub agent_id: AgentId,
    pub name: String,
    pub email: String,
    pub completions: usize,
    pub avg_score_pct: f64,
}

#[must_use]
pub fn agent_performance(agent: &Agent, history: &[AssessmentResult]) -> AgentStats {
    let attempts: Vec<&AssessmentResult> = history
        .iter()
        .filter(|r| r.agent_id() == agent.id())
        .collect();

    let avg_score_pct = if attempts.is_empty() {
        0.0
    } else {
        attempts.iter().map(|r| r.percentage()).sum::<f64>() / attempts.len() as f64
    };

    AgentStats {
        agent_id: agent.id(),
        name: agent.name().to_owned(),
        email: agent.email().to_owned(),
        completions: attempts.len(),
        avg_score_pct,
    }
}

//
// ─── PER-QUESTION ANALYSIS ─────────────────────────────────────────────────────
//

/// Answer distribution for one question across the attempts that answered it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionStats {
    pub question_id: crate::model::QuestionId,
    /// Attempts that recorded any answer for this question.
    pub answered: usize,
    pub correct_pct: f64,
    /// One percentage per option index, in option order.
    pub option_pcts: Vec<f64>,
}

/// Distribution of selected options and correctness rate for one question.
///
/// The denominator is the number of attempts that recorded an answer for
/// this question id; attempts that never answered it are excluded rather
/// than counted as wrong. A recorded index beyond the current option list
/// (the quiz was edited after the attempt) stays in the denominator as an
/// incorrect answer but lands in no option bucket.
#[must_use]
pub fn question_breakdown(question: &Question, results: &[AssessmentResult]) -> QuestionStats {
    let mut answered = 0usize;
    let mut correct = 0usize;
    let mut option_counts = vec![0usize; question.options().len()];

    for result in results {
        let Some(index) = result.answer_for(question.id()) else {
            continue;
        };
        answered += 1;
        if question.is_correct(index) {
            correct += 1;
        }
        if let Some(slot) = option_counts.get_mut(index) {
            *slot += 1;
        }
    }

    let pct = |count: usize| {
        if answered == 0 {
            0.0
        } else {
            count as f64 / answered as f64 * 100.0
        }
    };

    QuestionStats {
        question_id: question.id(),
        answered,
        correct_pct: pct(correct),
        option_pcts: option_counts.into_iter().map(pct).collect(),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
