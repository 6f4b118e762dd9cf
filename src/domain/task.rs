use serde::{Deserialize, Serialize};

/// The two binary classification tasks the model solves jointly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Task {
    Hate,
    Fake,
}

impl Task {
    pub const ALL: [Task; 2] = [Task::Hate, Task::Fake];

    /// Class names indexed by label value (0, 1)
    pub fn target_names(self) -> [&'static str; 2] {
        match self {
            Task::Hate => ["Not Hate", "Hate"],
            Task::Fake => ["Not Fake", "Fake"],
        }
    }

    /// Human-readable title used in report headings
    pub fn title(self) -> &'static str {
        match self {
            Task::Hate => "Hate Speech",
            Task::Fake => "Fake News",
        }
    }
}
