use async_trait::async_trait;
use offcharts_game::{
    AppealReport, Gateway, GatewayError, GameMode, GameSession, GenerationRequest, MemoryStore,
    SaveStore, SlotStatus, TextGenerator, TurnReport, Variant, daily_puzzle, save_key, share_text,
};

/// Judge that answers from a fixed table keyed on the answer under review.
struct TableJudge;

fn current_answer(prompt: &str) -> &str {
    prompt
        .lines()
        .find_map(|line| line.strip_suffix(" (current answer)"))
        .and_then(|line| line.split_once(". "))
        .map_or("", |(_, noun)| noun)
}

#[async_trait]
impl TextGenerator for TableJudge {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError> {
        let prompt = request.system_prompt;
        if prompt.contains("is appealing the score") {
            let reply = if prompt.contains("\"chess club\"") {
                r#"{"newScore": 9, "reasoning": "Fine, chess club is very nerdy.", "accepted": true}"#
            } else {
                "I would rather not."
            };
            return Ok(reply.to_string());
        }

        let reply = match current_answer(&prompt) {
            "bleach" => r#"{"score": 10, "reasoning": "Literally poison."}"#,
            "leather jacket" => r#"{"score": 6, "reasoning": "Classic edge.", "favoriteIndex": null}"#,
            "punk" => r#"```json
{"score": 6, "reasoning": "Tied, but punk wins.", "favoriteIndex": 2}
```"#,
            "razor" => "Edgy? Sharp, sure!",
            "chess club" => r#"{"score": 8, "reasoning": "Checkmate."}"#,
            "honey" => r#"{"score1": 9, "reasoning1": "Gooey.", "score2": 6, "reasoning2": "Grandma."}"#,
            "tape" => r#"{"score1": 7, "reasoning1": "Sticks.", "score2": 3 "reasoning2": "Meh"#,
            _ => return Err(GatewayError::Backend("judge is offline".to_string())),
        };
        Ok(reply.to_string())
    }
}

#[tokio::test]
async fn grid_game_plays_to_completion() {
    let puzzle = daily_puzzle("2026-03-01-v1", Variant::Grid);
    assert_eq!(puzzle.adjectives, vec!["toxic", "edgy", "nerdy"]);

    let judge = Gateway::new(TableJudge);
    let mut session = GameSession::open(MemoryStore::new(), puzzle, GameMode::Daily).unwrap();

    // a perfect score closes the toxic row
    session.submit("bleach", &judge).await.unwrap();
    assert_eq!(session.state().status(1), Some(SlotStatus::Passed));
    assert_eq!(session.state().status(2), Some(SlotStatus::Passed));
    assert_eq!(session.state().current_turn, 3);

    session.submit("leather jacket", &judge).await.unwrap();
    session.submit("punk", &judge).await.unwrap();
    assert_eq!(session.state().favorites[1], Some(4));

    let report = session.submit("razor", &judge).await.unwrap();
    let TurnReport::Scored { outcome, .. } = report else {
        panic!("garbled replies still score");
    };
    assert_eq!(outcome.scores.as_slice(), &[5]);
    assert_eq!(outcome.reasonings[0], "");

    session.submit("chess club", &judge).await.unwrap();
    session.pass().unwrap();
    session.pass().unwrap();
    assert!(session.state().is_complete());

    let report = session
        .appeal(6, "Chess club is the nerdiest place on campus.", &judge)
        .await
        .unwrap();
    assert!(matches!(report, AppealReport::Decided { turn: 6, .. }));
    assert_eq!(session.state().guesses[6].scores.as_slice(), &[9]);

    let summary = session.summary();
    assert_eq!(summary.total_score, 36);
    assert_eq!(summary.max_score, 90);
    assert_eq!(summary.appeals_used, 1);
    let best_turns: Vec<Option<usize>> = summary.best.iter().map(|b| b.as_ref().map(|b| b.turn)).collect();
    assert_eq!(best_turns, vec![Some(0), Some(4), Some(6)]);
    assert_eq!(
        share_text(session.state()),
        "Off the Charts 2026-03-01 (grid)\n36/90 ⚖️\n🔥⬜⬜\n🟨🟨🟨\n🟩⬜⬜"
    );
}

#[tokio::test]
async fn pair_game_survives_outage_and_reload() {
    let puzzle = daily_puzzle("2025-12-10-v1", Variant::Pair);
    assert_eq!(puzzle.adjectives, vec!["sticky", "nostalgic"]);
    let judge = Gateway::new(TableJudge);
    let mut store = MemoryStore::new();

    {
        let mut session = GameSession::open(&mut store, puzzle.clone(), GameMode::Daily).unwrap();
        session.submit("honey", &judge).await.unwrap();
        let report = session.submit("tape", &judge).await.unwrap();
        let TurnReport::Scored { outcome, .. } = report else {
            panic!("truncated replies are recovered");
        };
        assert_eq!(outcome.scores.as_slice(), &[7, 3]);

        let report = session.submit("marmalade", &judge).await.unwrap();
        assert!(matches!(report, TurnReport::Unscored { turn: 2, .. }));
        assert_eq!(session.state().current_turn, 3);
    }

    let saved = store.get(&save_key(Variant::Pair, GameMode::Daily)).unwrap();
    assert!(saved.is_some_and(|raw| raw.contains("marmalade")));

    let mut session = GameSession::open(&mut store, puzzle, GameMode::Daily).unwrap();
    assert_eq!(session.state().current_turn, 3);
    assert_eq!(session.state().status(2), Some(SlotStatus::Guessed));

    // an unconvinced judge that cannot be parsed keeps the scores and spends the token
    let report = session.appeal(0, "Honey never spoils.", &judge).await.unwrap();
    match report {
        AppealReport::Decided { outcome, .. } => {
            assert_eq!(outcome.scores.as_slice(), &[9, 6]);
            assert!(!outcome.accepted);
            assert_eq!(outcome.reasoning, "I would rather not.");
        }
        AppealReport::Deferred { .. } => panic!("judge answered"),
    }
    assert_eq!(session.state().appeals_remaining, 0);
    assert_eq!(session.state().best_pair(), Some(0));
}
