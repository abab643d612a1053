//! Coach module - conversations, chat context and the LLM-backed advisor

pub mod fallback;
pub mod openai;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Database;
use crate::equipment::EquipmentProfile;
use crate::tracker::{ExercisePerformance, Issue, WorkoutPerformance};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    /// Unix millis
    pub timestamp: i64,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Loosely-typed context attached to a conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default)]
    pub recent_workouts: Vec<WorkoutPerformance>,
    pub selected_workout_id: Option<String>,
    pub selected_exercise_id: Option<String>,
    pub equipment_profile: Option<EquipmentProfile>,
    pub user_issue: Option<Issue>,
    #[serde(default)]
    pub performance_history: Vec<ExercisePerformance>,
}

impl ChatContext {
    /// Field-wise merge: present fields of `update` win
    pub fn merge(&mut self, update: ChatContext) {
        if !update.recent_workouts.is_empty() {
            self.recent_workouts = update.recent_workouts;
        }
        if update.selected_workout_id.is_some() {
            self.selected_workout_id = update.selected_workout_id;
        }
        if update.selected_exercise_id.is_some() {
            self.selected_exercise_id = update.selected_exercise_id;
        }
        if update.equipment_profile.is_some() {
            self.equipment_profile = update.equipment_profile;
        }
        if update.user_issue.is_some() {
            self.user_issue = update.user_issue;
        }
        if !update.performance_history.is_empty() {
            self.performance_history = update.performance_history;
        }
    }
}

/// Chat log with context, persisted as one record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub context: ChatContext,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Conversation {
    pub fn new(initial_message: Option<&str>, context: ChatContext) -> Self {
        let now = Utc::now().timestamp_millis();
        let mut conversation = Self {
            id: Uuid::new_v4().to_string(),
            title: initial_message
                .map(title_from)
                .unwrap_or_else(|| "New Conversation".to_string()),
            messages: Vec::new(),
            context,
            created_at: now,
            updated_at: now,
        };
        if let Some(content) = initial_message {
            conversation.messages.push(Message::new(MessageRole::User, content));
        }
        conversation
    }
}

fn title_from(content: &str) -> String {
    let prefix: String = content.chars().take(30).collect();
    if content.chars().count() > 30 {
        format!("{}...", prefix)
    } else {
        prefix
    }
}

pub struct QuickPrompt {
    pub id: &'static str,
    pub text: &'static str,
    pub issue: Option<Issue>,
}

/// Predefined prompts for common coaching questions
pub const QUICK_PROMPTS: &[QuickPrompt] = &[
    QuickPrompt {
        id: "adjust-soreness",
        text: "How should I adjust today's workout if I'm sore?",
        issue: Some(Issue::Soreness),
    },
    QuickPrompt {
        id: "next-week-focus",
        text: "What should I focus on improving next week?",
        issue: None,
    },
    QuickPrompt {
        id: "short-time",
        text: "Can you simplify today's workout if I'm short on time?",
        issue: Some(Issue::TimeConstraint),
    },
    QuickPrompt {
        id: "feeling-stronger",
        text: "I'm feeling stronger than the program allows",
        issue: None,
    },
    QuickPrompt {
        id: "exercise-discomfort",
        text: "This exercise is causing discomfort",
        issue: Some(Issue::Other),
    },
    QuickPrompt {
        id: "plateau",
        text: "Suggest a plateau-breaking strategy",
        issue: None,
    },
];

/// Conversation persistence service
pub struct CoachService<'a> {
    db: &'a Database,
}

impl<'a> CoachService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create_conversation(
        &self,
        initial_message: Option<&str>,
        context: ChatContext,
    ) -> Result<Conversation> {
        let conversation = Conversation::new(initial_message, context);
        self.db.put_conversation(&conversation)?;
        Ok(conversation)
    }

    /// Append a message; the first user message sets the title
    pub fn add_message(
        &self,
        conversation_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<Message> {
        let mut conversation = self
            .db
            .conversation(conversation_id)?
            .with_context(|| format!("conversation not found: {}", conversation_id))?;

        let message = Message::new(role, content);
        conversation.updated_at = message.timestamp;
        conversation.messages.push(message.clone());

        let user_messages = conversation
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count();
        if role == MessageRole::User && user_messages == 1 {
            conversation.title = title_from(content);
        }

        self.db.put_conversation(&conversation)?;
        Ok(message)
    }

    pub fn update_context(&self, conversation_id: &str, update: ChatContext) -> Result<()> {
        let mut conversation = self
            .db
            .conversation(conversation_id)?
            .with_context(|| format!("conversation not found: {}", conversation_id))?;
        conversation.context.merge(update);
        conversation.updated_at = Utc::now().timestamp_millis();
        self.db.put_conversation(&conversation)
    }

    pub fn conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        self.db.conversation(conversation_id)
    }

    pub fn conversations(&self) -> Result<Vec<Conversation>> {
        self.db.conversations()
    }

    /// Most recently updated conversation, if any
    pub fn latest_conversation(&self) -> Result<Option<Conversation>> {
        Ok(self.db.conversations()?.into_iter().next())
    }

    pub fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        self.db.delete_conversation(conversation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_title() {
        let conversation = Conversation::new(
            Some("How should I adjust today's workout if I'm sore?"),
            ChatContext::default(),
        );
        assert_eq!(conversation.title, "How should I adjust today's wo...");
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].role, MessageRole::User);
    }

    #[test]
    fn test_short_initial_message_keeps_title() {
        let conversation = Conversation::new(Some("Deload?"), ChatContext::default());
        assert_eq!(conversation.title, "Deload?");
    }

    #[test]
    fn test_empty_conversation_title() {
        let conversation = Conversation::new(None, ChatContext::default());
        assert_eq!(conversation.title, "New Conversation");
        assert!(conversation.messages.is_empty());
    }

    #[test]
    fn test_add_message_retitles_on_first_user_message() {
        let db = Database::open_in_memory().unwrap();
        let service = CoachService::new(&db);
        let conversation = service
            .create_conversation(None, ChatContext::default())
            .unwrap();

        service
            .add_message(&conversation.id, MessageRole::User, "Is my squat volume too low?")
            .unwrap();
        let stored = service.conversation(&conversation.id).unwrap().unwrap();
        assert_eq!(stored.title, "Is my squat volume too low?");
        assert_eq!(stored.messages.len(), 1);

        // A second user message must not retitle
        service
            .add_message(&conversation.id, MessageRole::User, "And my bench?")
            .unwrap();
        let stored = service.conversation(&conversation.id).unwrap().unwrap();
        assert_eq!(stored.title, "Is my squat volume too low?");
        assert_eq!(stored.messages.len(), 2);
    }

    #[test]
    fn test_add_message_unknown_conversation() {
        let db = Database::open_in_memory().unwrap();
        let service = CoachService::new(&db);
        assert!(
            service
                .add_message("missing", MessageRole::User, "hello")
                .is_err()
        );
    }

    #[test]
    fn test_update_context_merges() {
        let db = Database::open_in_memory().unwrap();
        let service = CoachService::new(&db);
        let conversation = service
            .create_conversation(
                Some("hi"),
                ChatContext {
                    selected_workout_id: Some("day-1".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        service
            .update_context(
                &conversation.id,
                ChatContext {
                    user_issue: Some(Issue::Soreness),
                    ..Default::default()
                },
            )
            .unwrap();

        let stored = service.conversation(&conversation.id).unwrap().unwrap();
        assert_eq!(stored.context.user_issue, Some(Issue::Soreness));
        // Untouched fields survive the merge
        assert_eq!(stored.context.selected_workout_id.as_deref(), Some("day-1"));
    }

    #[test]
    fn test_quick_prompts_cover_known_issues() {
        assert_eq!(QUICK_PROMPTS.len(), 6);
        assert!(
            QUICK_PROMPTS
                .iter()
                .any(|p| p.issue == Some(Issue::TimeConstraint))
        );
    }
}
