use serde::{Deserialize, Serialize};

/// Research task shared by every agent in a workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub query: String,

    /// Model the agents call
    #[serde(default = "default_model")]
    pub model: String,

    /// Emit progress events while working
    #[serde(default)]
    pub verbose: bool,

    /// Review drafts against `guidelines`; when false every draft is accepted
    #[serde(default)]
    pub follow_guidelines: bool,

    #[serde(default)]
    pub guidelines: Vec<String>,

    /// Upper bound on planned sections
    #[serde(default = "default_max_sections")]
    pub max_sections: usize,

    #[serde(default)]
    pub include_human_feedback: bool,

    /// Review/revise rounds per section before the draft is taken as is
    #[serde(default = "default_max_revisions")]
    pub max_revisions: usize,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_sections() -> usize {
    3
}

fn default_max_revisions() -> usize {
    3
}

impl Task {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            model: default_model(),
            verbose: false,
            follow_guidelines: false,
            guidelines: Vec::new(),
            max_sections: default_max_sections(),
            include_human_feedback: false,
            max_revisions: default_max_revisions(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_guidelines<I, S>(mut self, guidelines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guidelines = guidelines.into_iter().map(Into::into).collect();
        self.follow_guidelines = true;
        self
    }

    pub fn with_max_sections(mut self, max_sections: usize) -> Self {
        self.max_sections = max_sections;
        self
    }

    pub fn with_max_revisions(mut self, max_revisions: usize) -> Self {
        self.max_revisions = max_revisions;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// What may follow a bare `None` in an accepting reply
const ACCEPT_SEPARATORS: [char; 5] = ['-', '\u{2013}', '\u{2014}', '.', ':'];

/// Reviewer decision
///
/// On the wire this is an optional string: `null` accepts, any text is the
/// feedback the reviser works from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Review {
    Accepted,
    RevisionRequested(String),
}

impl Review {
    /// Interpret a raw reviewer reply
    ///
    /// `None` (any case, optionally quoted) accepts, as does `None` followed by
    /// a dash, period or colon and commentary such as
    /// `None - the draft is acceptable`. Anything else is feedback and kept
    /// verbatim. That includes prose that merely starts with the word
    /// (`None of the guidelines are met`) and comma-led caveats
    /// (`None, but rewrite the conclusion`).
    pub fn from_reply(reply: &str) -> Self {
        let trimmed = reply
            .trim()
            .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
            .trim();

        let accepted = match trimmed.get(..4) {
            Some(head) if head.eq_ignore_ascii_case("none") => {
                let rest = trimmed[4..].trim_start();
                rest.is_empty() || rest.starts_with(ACCEPT_SEPARATORS)
            }
            _ => false,
        };

        if accepted {
            Review::Accepted
        } else {
            Review::RevisionRequested(reply.to_string())
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Review::Accepted)
    }

    pub fn feedback(&self) -> Option<&str> {
        match self {
            Review::Accepted => None,
            Review::RevisionRequested(feedback) => Some(feedback),
        }
    }
}

impl From<Option<String>> for Review {
    fn from(value: Option<String>) -> Self {
        match value {
            None => Review::Accepted,
            Some(feedback) => Review::RevisionRequested(feedback),
        }
    }
}

impl From<Review> for Option<String> {
    fn from(review: Review) -> Self {
        match review {
            Review::Accepted => None,
            Review::RevisionRequested(feedback) => Some(feedback),
        }
    }
}

/// State threaded through research, review and revision of one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftState {
    pub task: Task,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub draft: String,
    /// What the reviser says it changed in the last round
    #[serde(default)]
    pub revision_notes: Option<String>,
    /// Last reviewer decision; not part of the serialized state
    #[serde(skip)]
    pub review: Option<Review>,
}

impl DraftState {
    pub fn new(task: Task, draft: impl Into<String>) -> Self {
        Self {
            topic: task.query.clone(),
            task,
            draft: draft.into(),
            revision_notes: None,
            review: None,
        }
    }

    pub fn for_topic(task: Task, topic: impl Into<String>) -> Self {
        Self {
            task,
            topic: topic.into(),
            draft: String::new(),
            revision_notes: None,
            review: None,
        }
    }

    pub fn with_revision_notes(mut self, notes: impl Into<String>) -> Self {
        self.revision_notes = Some(notes.into());
        self
    }
}

/// Input to editor planning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchState {
    pub task: Task,
    pub initial_research: String,
}

/// Section layout produced by the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchPlan {
    pub title: String,
    pub date: String,
    pub sections: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_reply_accepts_in_any_case() {
        assert_eq!(Review::from_reply("None"), Review::Accepted);
        assert_eq!(Review::from_reply("none"), Review::Accepted);
        assert_eq!(Review::from_reply("  NONE \n"), Review::Accepted);
        assert_eq!(Review::from_reply("\"None\""), Review::Accepted);
    }

    #[test]
    fn test_none_with_commentary_accepts() {
        assert_eq!(
            Review::from_reply("None - the draft is acceptable"),
            Review::Accepted
        );
        assert_eq!(Review::from_reply("None. Looks good."), Review::Accepted);
        assert_eq!(Review::from_reply("None: no changes needed"), Review::Accepted);
        assert_eq!(Review::from_reply("None \u{2014} ready to publish"), Review::Accepted);
    }

    #[test]
    fn test_none_with_caveat_is_feedback() {
        let reply = "None, but the conclusion contradicts guideline 2; rewrite it.";
        assert_eq!(
            Review::from_reply(reply),
            Review::RevisionRequested(reply.to_string())
        );
        assert!(!Review::from_reply("None; see the notes below").is_accepted());
        assert!(!Review::from_reply("None! Except the intro").is_accepted());
    }

    #[test]
    fn test_feedback_is_kept_verbatim() {
        let feedback = "Please improve the conclusion section";
        assert_eq!(
            Review::from_reply(feedback),
            Review::RevisionRequested(feedback.to_string())
        );
    }

    #[test]
    fn test_prose_starting_with_none_is_feedback() {
        assert!(!Review::from_reply("None of the guidelines are met.").is_accepted());
        assert!(!Review::from_reply("Nonessential sections should go").is_accepted());
    }

    #[test]
    fn test_review_serializes_as_optional_string() {
        assert_eq!(serde_json::to_value(Review::Accepted).unwrap(), serde_json::Value::Null);
        assert_eq!(
            serde_json::to_value(Review::RevisionRequested("fix".into())).unwrap(),
            serde_json::json!("fix")
        );
    }

    #[test]
    fn test_task_defaults_from_partial_json() {
        let task: Task = serde_json::from_str(r#"{"model": "gpt-4", "follow_guidelines": true}"#)
            .unwrap();
        assert_eq!(task.max_sections, 3);
        assert_eq!(task.max_revisions, 3);
        assert!(task.guidelines.is_empty());
    }
}
