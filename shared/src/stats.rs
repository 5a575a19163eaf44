use std::cmp::Ordering;
use crate::models::{CompetitionState, LeaderboardEntry, Stats, Team};
use crate::timestamp::Timestamp;

pub const LEADERBOARD_SIZE: usize = 10;

/// Leaderboard order: most votes first, then earliest registration, then id.
pub fn compare_standings(a: &Team, b: &Team) -> Ordering {
    b.votes.cmp(&a.votes)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_standings(teams: &mut [Team]) {
    teams.sort_by(compare_standings);
}

pub fn leaderboard(teams: &[Team], size: usize) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&Team> = teams.iter().collect();
    ranked.sort_by(|a, b| compare_standings(a, b));
    ranked.into_iter()
        .take(size)
        .enumerate()
        .map(|(i, team)| LeaderboardEntry {
            rank: i + 1,
            id: team.id,
            name: team.name.clone(),
            votes: team.votes,
        })
        .collect()
}

pub fn compute_stats(teams: &[Team], competition: &CompetitionState, now: Timestamp) -> Stats {
    Stats {
        team_count: teams.len(),
        meme_count: teams.iter().filter(|t| t.is_pushed()).count(),
        vote_count: teams.iter().map(|t| t.votes.max(0)).sum(),
        leaderboard: leaderboard(teams, LEADERBOARD_SIZE),
        status: competition.status,
        end_time: competition.end_time,
        time_remaining: competition.time_remaining(now),
    }
}
