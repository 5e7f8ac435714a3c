use async_trait::async_trait;
use hmac::{Hmac, Mac};
use offcharts_game::{GatewayError, GenerationRequest, TextGenerator};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How the scripted judge behaves for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeBehavior {
    /// Well-formed JSON with middling scores.
    Fair,
    /// Well-formed JSON, every score a 10.
    Generous,
    /// Chatty prose with no recognizable fields.
    Garbled,
    /// Every call fails like an unreachable backend.
    Offline,
}

impl JudgeBehavior {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fair => "fair",
            Self::Generous => "generous",
            Self::Garbled => "garbled",
            Self::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptShape {
    PairScore,
    SingleScore,
    PairAppeal,
    SingleAppeal,
}

fn prompt_shape(prompt: &str) -> PromptShape {
    if prompt.contains("\"newScore1\"") {
        PromptShape::PairAppeal
    } else if prompt.contains("\"newScore\"") {
        PromptShape::SingleAppeal
    } else if prompt.contains("\"score1\"") {
        PromptShape::PairScore
    } else {
        PromptShape::SingleScore
    }
}

fn derive_call_seed(seed: u64, prompt: &str) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&seed.to_le_bytes()) else {
        return seed;
    };
    mac.update(b"judge");
    mac.update(prompt.as_bytes());
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Deterministic stand-in for the hosted model.
///
/// Each reply is drawn from an RNG keyed on the run seed and the exact prompt,
/// so replaying a game replays its scores.
#[derive(Debug)]
pub struct ScriptedJudge {
    seed: u64,
    behavior: JudgeBehavior,
    calls: AtomicUsize,
}

impl ScriptedJudge {
    #[must_use]
    pub const fn new(seed: u64, behavior: JudgeBehavior) -> Self {
        Self {
            seed,
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn reply(&self, prompt: &str) -> String {
        let mut rng = ChaCha20Rng::seed_from_u64(derive_call_seed(self.seed, prompt));
        let shape = prompt_shape(prompt);
        match self.behavior {
            JudgeBehavior::Garbled => garbled(&mut rng),
            JudgeBehavior::Generous => well_formed(shape, |_| 10),
            JudgeBehavior::Fair | JudgeBehavior::Offline => {
                well_formed(shape, |appeal| if appeal { rng.gen_range(1..=10) } else { rng.gen_range(2..=9) })
            }
        }
    }
}

fn garbled(rng: &mut ChaCha20Rng) -> String {
    const LINES: [&str; 4] = [
        "What a delightful answer! I would happily give it a high mark.",
        "Hmm, let me think about this one... it depends on the day.",
        "As a judge I must say: bold choice. Very bold.",
        "I cannot decide, both adjectives pull in different directions.",
    ];
    LINES[rng.gen_range(0..LINES.len())].to_string()
}

fn well_formed(shape: PromptShape, mut score: impl FnMut(bool) -> u8) -> String {
    match shape {
        PromptShape::PairScore => format!(
            r#"{{"score1": {}, "reasoning1": "Scripted reasoning one.", "score2": {}, "reasoning2": "Scripted reasoning two."}}"#,
            score(false),
            score(false)
        ),
        PromptShape::SingleScore => format!(
            r#"{{"score": {}, "reasoning": "Scripted reasoning.", "favoriteIndex": null}}"#,
            score(false)
        ),
        PromptShape::PairAppeal => format!(
            r#"{{"newScore1": {}, "newScore2": {}, "reasoning": "Scripted appeal ruling.", "accepted": false}}"#,
            score(true),
            score(true)
        ),
        PromptShape::SingleAppeal => format!(
            r#"{{"newScore": {}, "reasoning": "Scripted appeal ruling.", "accepted": false}}"#,
            score(true)
        ),
    }
}

#[async_trait]
impl TextGenerator for ScriptedJudge {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.behavior == JudgeBehavior::Offline {
            return Err(GatewayError::Backend("scripted outage".to_string()));
        }
        Ok(self.reply(&request.system_prompt))
    }
}
