pub mod config;
pub mod verdict;

pub use config::{BackendConfig, CheckLimits, Config, SearchConfig};
pub use verdict::{Answer, QuestionAnswer, Verdict, VerdictLabel};
