pub mod judge;
pub mod reports;
pub mod tester;

pub use judge::{JudgeBehavior, ScriptedJudge};
pub use tester::*;
