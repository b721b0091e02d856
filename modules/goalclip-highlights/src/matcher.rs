use reddit_client::SearchResult;

use crate::types::GoalInfo;

/// Picks the most plausible hit for a goal among media-flaired results.
/// The scoring heuristic is a tuning surface; swap the implementation
/// rather than growing flags on the default one.
pub trait MatchSelector: Send + Sync {
    fn select_best<'a>(
        &self,
        results: &'a [SearchResult],
        goal: &GoalInfo,
    ) -> Option<&'a SearchResult>;
}

/// Default selector. A candidate is eligible only if its title mentions the
/// scoring team; an explicit minute marker (e.g. `23'`) counts double a
/// mention of the opposition. On equal scores the earlier result wins, so
/// primary-strategy hits outrank secondary-strategy hits.
pub struct TitleHeuristic;

impl MatchSelector for TitleHeuristic {
    fn select_best<'a>(
        &self,
        results: &'a [SearchResult],
        goal: &GoalInfo,
    ) -> Option<&'a SearchResult> {
        let scoring_team = goal.scoring_team().to_lowercase();
        let opponent = if goal.is_home_team {
            goal.away_team.to_lowercase()
        } else {
            goal.home_team.to_lowercase()
        };
        let minute_marker = regex::Regex::new(&format!(r"\b{}\s*'", goal.minute)).unwrap();

        let mut best: Option<(&SearchResult, u32)> = None;
        for result in results {
            let title = result.title.to_lowercase();
            if !title.contains(&scoring_team) {
                continue;
            }

            let mut score = 1;
            if minute_marker.is_match(&title) {
                score += 2;
            }
            if !opponent.is_empty() && title.contains(&opponent) {
                score += 1;
            }

            match best {
                Some((_, top)) if top >= score => {}
                _ => best = Some((result, score)),
            }
        }

        best.map(|(result, _)| result)
    }
}
