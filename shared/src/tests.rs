#[cfg(test)]
mod tests {
    use time::Duration;
    use uuid::Uuid;
    use crate::models::*;
    use crate::stats::{compute_stats, leaderboard};
    use crate::timestamp::{LegacyTimestamp, Timestamp};
    use crate::validation::*;

    fn team(name: &str, votes: i64, created_ms: i64, pushed: bool) -> Team {
        let created = Timestamp::from_millis(created_ms).unwrap();
        Team {
            id: Uuid::new_v4(),
            name: name.into(),
            department: "CS".into(),
            faculty: "Science".into(),
            github_username: "octo".into(),
            members: Vec::new(),
            repo_name: repo_name_for(name),
            repo_url: String::new(),
            votes,
            last_updated: created,
            created_at: created,
            git_stages: GitStages { pushed, ..GitStages::default() },
        }
    }

    fn registration(members: usize) -> RegisterTeamRequest {
        RegisterTeamRequest {
            team_name: Some("  Déjà Vu  Crew! ".into()),
            department: Some("CS".into()),
            faculty: Some("Science".into()),
            github_username: Some("octo".into()),
            members: Some((0..members).map(|i| Some(MemberInput {
                name: Some(format!("member{}", i)),
                email: Some(format!("m{}@uni.fi", i)),
            })).collect()),
        }
    }

    #[test]
    fn test_voting_window() {
        let now = Timestamp::now();
        let later = now.checked_add(Duration::minutes(5)).unwrap();
        let earlier = now.checked_add(Duration::minutes(-5)).unwrap();

        let open = CompetitionState { status: Phase::Running, end_time: None };
        assert_eq!(open.voting_window(now), Ok(()));

        let timed = CompetitionState { status: Phase::Running, end_time: Some(later) };
        assert_eq!(timed.voting_window(now), Ok(()));

        let elapsed = CompetitionState { status: Phase::Running, end_time: Some(earlier) };
        assert_eq!(elapsed.voting_window(now), Err(VotingClosed::PeriodEnded));

        let exact = CompetitionState { status: Phase::Running, end_time: Some(now) };
        assert_eq!(exact.voting_window(now), Err(VotingClosed::PeriodEnded));

        for phase in [Phase::Setup, Phase::Paused, Phase::Ended] {
            let closed = CompetitionState { status: phase, end_time: Some(later) };
            assert_eq!(closed.voting_window(now), Err(VotingClosed::NotActive));
            let closed = CompetitionState { status: phase, end_time: None };
            assert_eq!(closed.voting_window(now), Err(VotingClosed::NotActive));
        }
    }

    #[test]
    fn test_competition_update_merges() {
        let end = Timestamp::from_millis(1_700_000_000_000).unwrap();
        let mut state = CompetitionState::default();
        assert_eq!(state.status, Phase::Setup);

        CompetitionUpdate { status: Phase::Running, end_time: Some(end) }.apply(&mut state);
        assert_eq!(state, CompetitionState { status: Phase::Running, end_time: Some(end) });

        CompetitionUpdate::status(Phase::Paused).apply(&mut state);
        assert_eq!(state, CompetitionState { status: Phase::Paused, end_time: Some(end) });

        CompetitionUpdate::status(Phase::Ended).apply(&mut state);
        assert_eq!(state.end_time, Some(end));
    }

    #[test]
    fn test_time_remaining_clamps() {
        let now = Timestamp::from_millis(10_000).unwrap();
        let state = CompetitionState {
            status: Phase::Running,
            end_time: Some(Timestamp::from_millis(12_500).unwrap()),
        };
        assert_eq!(state.time_remaining(now), Some(2_500));

        let past = CompetitionState {
            status: Phase::Paused,
            end_time: Some(Timestamp::from_millis(1_000).unwrap()),
        };
        assert_eq!(past.time_remaining(now), Some(0));
        assert_eq!(CompetitionState::default().time_remaining(now), None);
    }

    #[test]
    fn test_legacy_timestamps() {
        let expected = Timestamp::from_millis(1_700_000_000_500).unwrap();

        let parse = |json: &str| serde_json::from_str::<Timestamp>(json).unwrap();
        assert_eq!(parse("1700000000500"), expected);
        assert_eq!(parse("1700000000500.7"), expected);
        assert_eq!(parse("\"2023-11-14T22:13:20.5Z\""), expected);
        assert_eq!(parse("\"2023-11-15T00:13:20.5+02:00\""), expected);
        assert_eq!(parse(r#"{"seconds": 1700000000, "nanoseconds": 500000000}"#), expected);
        assert_eq!(parse(r#"{"_seconds": 1700000000, "_nanoseconds": 500000000}"#), expected);

        assert!(serde_json::from_str::<Timestamp>("\"yesterday\"").is_err());
        assert!(Timestamp::from_legacy(LegacyTimestamp::FractionalMillis(f64::NAN)).is_err());
    }

    #[test]
    fn test_timestamp_serializes_as_rfc3339() {
        let ts = Timestamp::from_millis(0).unwrap();
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"1970-01-01T00:00:00Z\"");
        let round: Timestamp = serde_json::from_str(&serde_json::to_string(&ts).unwrap()).unwrap();
        assert_eq!(round, ts);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Meme Lords"), "meme-lords");
        assert_eq!(slugify("  --Rust!!Ace$$ 2024--"), "rust-ace-2024");
        assert_eq!(slugify("Déjà Vu"), "deja-vu");
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
        assert_eq!(slugify("ﬁre Team"), "fire-team");
        assert_eq!(repo_name_for("Café"), "cafe-meme-war");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(repo_name_for("Meme Lords"), "meme-lords-meme-war");
        assert_eq!(
            repo_url_for("octo", "meme-lords-meme-war"),
            "https://github.com/octo/meme-lords-meme-war"
        );
        assert_eq!(
            pages_url_for("octo", "meme-lords-meme-war"),
            "https://octo.github.io/meme-lords-meme-war/"
        );
    }

    #[test]
    fn test_registration_validation() {
        let team = validate_registration(&registration(3)).unwrap();
        assert_eq!(team.name, "Déjà Vu  Crew!");
        assert_eq!(team.repo_name, "d-j-vu-crew-meme-war");
        assert_eq!(team.repo_url, "https://github.com/octo/d-j-vu-crew-meme-war");
        assert_eq!(team.members.len(), 3);
        assert!(team.members[0].is_leader);
        assert!(!team.members[1].is_leader && !team.members[2].is_leader);

        assert_eq!(validate_registration(&registration(2)), Err(ValidationError::WrongMemberCount));
        assert_eq!(validate_registration(&registration(4)), Err(ValidationError::WrongMemberCount));

        let mut missing = registration(3);
        missing.faculty = Some("   ".into());
        assert_eq!(validate_registration(&missing), Err(ValidationError::MissingFields));

        let mut no_members = registration(3);
        no_members.members = None;
        assert_eq!(validate_registration(&no_members), Err(ValidationError::WrongMemberCount));

        let mut symbols = registration(3);
        symbols.team_name = Some("???".into());
        assert_eq!(validate_registration(&symbols), Err(ValidationError::UnusableTeamName));
    }

    #[test]
    fn test_null_members_default_to_empty() {
        let mut request = registration(3);
        request.members = Some(vec![None, Some(MemberInput::default()), None]);
        let team = validate_registration(&request).unwrap();
        assert!(team.members.iter().all(|m| m.name.is_empty() && m.email.is_empty()));
        assert!(team.members[0].is_leader);
    }

    #[test]
    fn test_duration_validation() {
        assert_eq!(validate_duration_minutes(None), Ok(DEFAULT_DURATION_MINUTES));
        assert_eq!(validate_duration_minutes(Some(0.0)), Ok(0.0));
        assert_eq!(validate_duration_minutes(Some(1.5)), Ok(1.5));
        assert!(validate_duration_minutes(Some(-1.0)).is_err());
        assert!(validate_duration_minutes(Some(f64::INFINITY)).is_err());
        assert!(validate_duration_minutes(Some(MAX_DURATION_MINUTES + 1.0)).is_err());
    }

    #[test]
    fn test_team_id_validation() {
        assert_eq!(validate_team_id(Some(" abc ")), Ok("abc"));
        assert_eq!(validate_team_id(Some("")), Err(ValidationError::MissingTeamId));
        assert_eq!(validate_team_id(None), Err(ValidationError::MissingTeamId));
    }

    #[test]
    fn test_leaderboard_ordering() {
        let teams = vec![
            team("C", 2, 3_000, false),
            team("A", 5, 1_000, true),
            team("B", 5, 2_000, false),
            team("D", 0, 500, true),
        ];
        let board = leaderboard(&teams, 10);
        let names: Vec<_> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C", "D"]);
        assert_eq!(board.iter().map(|e| e.rank).collect::<Vec<_>>(), [1, 2, 3, 4]);
        assert!(board.windows(2).all(|w| w[0].votes >= w[1].votes));

        assert_eq!(leaderboard(&teams, 2).len(), 2);
    }

    #[test]
    fn test_compute_stats() {
        let teams: Vec<_> = (0..12)
            .map(|i| team(&format!("T{}", i), i, i * 10, i % 3 == 0))
            .collect();
        let now = Timestamp::from_millis(0).unwrap();
        let competition = CompetitionState {
            status: Phase::Running,
            end_time: Some(Timestamp::from_millis(60_000).unwrap()),
        };
        let stats = compute_stats(&teams, &competition, now);
        assert_eq!(stats.team_count, 12);
        assert_eq!(stats.meme_count, 4);
        assert_eq!(stats.vote_count, (0..12).sum::<i64>());
        assert_eq!(stats.leaderboard.len(), 10);
        assert_eq!(stats.leaderboard[0].name, "T11");
        assert_eq!(stats.status, Phase::Running);
        assert_eq!(stats.time_remaining, Some(60_000));

        let empty = compute_stats(&[], &CompetitionState::default(), now);
        assert_eq!(empty.team_count, 0);
        assert_eq!(empty.vote_count, 0);
        assert!(empty.leaderboard.is_empty());
        assert_eq!(empty.status, Phase::Setup);
        assert_eq!(empty.end_time, None);
        assert_eq!(empty.time_remaining, None);
    }

    #[test]
    fn test_stats_wire_shape() {
        let stats = compute_stats(&[], &CompetitionState::default(), Timestamp::now());
        let value = serde_json::to_value(ApiResponse::success(stats)).unwrap();
        assert_eq!(value["ok"], true);
        assert!(value.get("error").is_none());
        let data = &value["data"];
        for key in ["teamCount", "memeCount", "voteCount", "leaderboard", "status", "endTime", "timeRemaining"] {
            assert!(data.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(data["status"], "setup");

        let failure = serde_json::to_value(ApiResponse::failure("nope")).unwrap();
        assert_eq!(failure, serde_json::json!({ "ok": false, "error": "nope" }));
    }

    #[test]
    fn test_forwarded_for() {
        use crate::user_info::{first_forwarded, UserInfo};
        assert_eq!(first_forwarded("1.2.3.4, 10.0.0.1"), Some("1.2.3.4"));
        assert_eq!(first_forwarded("  "), None);
        assert_eq!(UserInfo::new("1.2.3.4", "curl").fingerprint_input(), "1.2.3.4::curl");
    }
}
