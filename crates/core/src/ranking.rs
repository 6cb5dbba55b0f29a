//! Ranking aggregator: pure recomputations over the full attempt history.
//!
//! Two views exist. The general ranking averages every attempt an agent ever
//! made across all quizzes; the per-assessment ranking keeps only each
//! agent's personal best on one quiz. Both orderings are made fully
//! deterministic by a final agent-id tie-break.

use std::collections::HashMap;

use crate::model::{Agent, AgentId, AssessmentResult, QuizId};

//
// ─── GENERAL RANKING ───────────────────────────────────────────────────────────
//

/// One row of the cross-assessment leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralRankingEntry {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub completions: usize,
    pub avg_score_pct: f64,
    pub avg_duration_secs: f64,
}

/// Computes the cross-assessment per-agent ranking.
///
/// Agents with no attempts are excluded (there is nothing to rank them on).
/// Sort order: average percentage descending, ties broken by average
/// duration ascending (faster wins), remaining ties by agent id ascending.
#[must_use]
pub fn general_ranking(agents: &[Agent], history: &[AssessmentResult]) -> Vec<GeneralRankingEntry> {
    let mut per_agent: HashMap<AgentId, (f64, f64, usize)> = HashMap::new();
    for result in history {
        let entry = per_agent.entry(result.agent_id()).or_insert((0.0, 0.0, 0));
        entry.0 += result.percentage();
        entry.1 += f64::from(result.duration_secs());
        entry.2 += 1;
    }

    let mut entries: Vec<GeneralRankingEntry> = agents
        .iter()
        .filter_map(|agent| {
            let (score_sum, duration_sum, completions) = per_agent.get(&agent.id())?;
            let n = *completions;
            if n == 0 {
                return None;
            }
            Some(GeneralRankingEntry {
                agent_id: agent.id(),
                agent_name: agent.name().to_owned(),
                completions: n,
                avg_score_pct: score_sum / n as f64,
                avg_duration_secs: duration_sum / n as f64,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.avg_score_pct
            .total_cmp(&a.avg_score_pct)
            .then(a.avg_duration_secs.total_cmp(&b.avg_duration_secs))
            .then(a.agent_id.cmp(&b.agent_id))
    });
    entries
}

//
// ─── PER-ASSESSMENT RANKING ────────────────────────────────────────────────────
//

/// Computes the personal-best leaderboard for one quiz.
///
/// For each agent only the best attempt is retained: highest score, ties to
/// lowest duration, first-seen attempt kept on a full tie. Retained attempts
/// are sorted score descending, duration ascending, then agent id ascending.
#[must_use]
pub fn assessment_ranking(quiz_id: QuizId, history: &[AssessmentResult]) -> Vec<AssessmentResult> {
    let mut best: HashMap<AgentId, &AssessmentResult> = HashMap::new();
    for result in history.iter().filter(|r| r.quiz_id() == quiz_id) {
        match best.get(&result.agent_id()) {
            Some(existing) if !beats(result, existing) => {}
            _ => {
                best.insert(result.agent_id(), result);
            }
        }
    }

    let mut ranked: Vec<AssessmentResult> = best.into_values().cloned().collect();
    ranked.sort_by(|a, b| {
        b.score()
            .cmp(&a.score())
            .then(a.duration_secs().cmp(&b.duration_secs()))
            .then(a.agent_id().cmp(&b.agent_id()))
    });
    ranked
}

fn beats(candidate: &AssessmentResult, incumbent: &AssessmentResult) -> bool {
    candidate.score() > incumbent.score()
        || (candidate.score() == incumbent.score()
            && candidate.duration_secs() < incumbent.duration_secs())
}

/// Positions 0..=2 are the podium; every other rank is just a number.
#[must_use]
pub fn is_podium(position: usize) -> bool {
    position < 3
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgentRole, ResultId};
    use crate::time::fixed_now;
    use std::collections::HashMap;

    fn build_agent(id: u64, name: &str) -> Agent {
        Agent::new(
            AgentId::new(id),
            name,
            format!("{}@example.org", name.to_lowercase()),
            AgentRole::Agent,
        )
        .unwrap()
    }

    fn build_result(agent: u64, quiz: u64, score: u32, total: u32, duration: u32) -> AssessmentResult {
        AssessmentResult::new(
            ResultId::generate(),
            QuizId::new(quiz),
            "Quiz",
            AgentId::new(agent),
            format!("Agent {agent}"),
            score,
            total,
            fixed_now(),
            duration,
            HashMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn general_ranking_excludes_agents_without_attempts() {
        let agents = vec![build_agent(1, "Silva"), build_agent(2, "Souza")];
        let history = vec![build_result(1, 1, 2, 2, 100)];

        let ranking = general_ranking(&agents, &history);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].agent_id, AgentId::new(1));
        assert_eq!(ranking[0].completions, 1);
    }

    #[test]
    fn general_ranking_orders_by_avg_score_then_duration() {
        let agents = vec![
            build_agent(1, "Silva"),
            build_agent(2, "Souza"),
            build_agent(3, "Costa"),
        ];
        let history = vec![
            // Silva: avg 50%, avg 100s
            build_result(1, 1, 1, 2, 100),
            // Souza: avg 100%, avg 200s
            build_result(2, 1, 2, 2, 200),
            // Costa: avg 100%, avg 150s (same score as Souza, faster)
            build_result(3, 1, 2, 2, 150),
        ];

        let ranking = general_ranking(&agents, &history);
        let order: Vec<u64> = ranking.iter().map(|e| e.agent_id.value()).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn general_ranking_averages_across_quizzes() {
        let agents = vec![build_agent(1, "Silva")];
        let history = vec![build_result(1, 1, 2, 2, 60), build_result(1, 2, 1, 2, 120)];

        let ranking = general_ranking(&agents, &history);
        assert_eq!(ranking[0].completions, 2);
        assert!((ranking[0].avg_score_pct - 75.0).abs() < 1e-9);
        assert!((ranking[0].avg_duration_secs - 90.0).abs() < 1e-9);
    }

    #[test]
    fn general_ranking_full_tie_falls_back_to_agent_id() {
        let agents = vec![build_agent(2, "Souza"), build_agent(1, "Silva")];
        let history = vec![build_result(2, 1, 1, 2, 100), build_result(1, 1, 1, 2, 100)];

        let ranking = general_ranking(&agents, &history);
        let order: Vec<u64> = ranking.iter().map(|e| e.agent_id.value()).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn best_attempt_prefers_high_score_then_low_duration() {
        let history = vec![
            build_result(1, 1, 2, 3, 100),
            build_result(1, 1, 3, 3, 200),
            build_result(1, 1, 3, 3, 150),
        ];

        let ranking = assessment_ranking(QuizId::new(1), &history);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].score(), 3);
        assert_eq!(ranking[0].duration_secs(), 150);
    }

    #[test]
    fn full_tie_keeps_first_seen_attempt() {
        let first = build_result(1, 1, 2, 3, 100);
        let first_id = first.id();
        let history = vec![first, build_result(1, 1, 2, 3, 100)];

        let ranking = assessment_ranking(QuizId::new(1), &history);
        assert_eq!(ranking[0].id(), first_id);
    }

    #[test]
    fn assessment_ranking_filters_by_quiz() {
        let history = vec![build_result(1, 1, 2, 2, 100), build_result(2, 9, 2, 2, 50)];

        let ranking = assessment_ranking(QuizId::new(1), &history);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].agent_id(), AgentId::new(1));
    }

    #[test]
    fn ranking_is_a_total_preorder() {
        let history = vec![
            build_result(1, 1, 3, 3, 150),
            build_result(2, 1, 3, 3, 150),
            build_result(3, 1, 2, 3, 80),
            build_result(4, 1, 3, 3, 90),
        ];

        let ranking = assessment_ranking(QuizId::new(1), &history);
        for pair in ranking.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.score() > b.score()
                    || (a.score() == b.score() && a.duration_secs() <= b.duration_secs())
            );
        }
    }

    #[test]
    fn podium_covers_first_three_positions() {
        assert!(is_podium(0));
        assert!(is_podium(2));
        assert!(!is_podium(3));
    }
}
