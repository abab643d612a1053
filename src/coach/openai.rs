//! Chat-completion client for the coach
//!
//! Talks to an OpenAI-compatible endpoint. Structured suggestion responses
//! are cached in-process for 24 hours; when the API is unreachable the
//! rule-based fallback takes over.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::fallback;
use super::{ChatContext, Message};
use crate::equipment::EquipmentProfile;
use crate::tracker::{ExercisePerformance, WorkoutPerformance};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";
const SUGGESTION_TEMPERATURE: f64 = 0.2;
const CHAT_TEMPERATURE: f64 = 0.5;
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Weight,
    Sets,
    Reps,
    Tempo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionChange {
    pub parameter: Parameter,
    pub current_value: serde_json::Value,
    pub recommended_value: serde_json::Value,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseModification {
    pub exercise_id: String,
    pub changes: Vec<ProgressionChange>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Deload,
    VolumeIncrease,
    IntensityFocus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramAdjustment {
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    pub duration_weeks: u32,
    pub details: String,
}

/// Structured coaching answer, also produced by the fallback rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachResponse {
    pub explanation: String,
    #[serde(default)]
    pub modifications: Vec<ExerciseModification>,
    pub program_adjustments: Option<ProgramAdjustment>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    max_tokens: u32,
    messages: &'a [ApiMessage],
}

#[derive(Clone, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

enum ApiFailure {
    /// Non-success HTTP status with response body
    Status(u16, String),
    Transport(String),
    EmptyResponse,
}

struct CacheEntry {
    at: Instant,
    response: CoachResponse,
}

/// Client for the coach chat-completion API
pub struct CoachClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl CoachClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_string(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Build from OPENAI_API_KEY / OPENAI_BASE_URL / OPENAI_MODEL
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let api_key = api_key.trim();
        if api_key.is_empty() {
            bail!("OPENAI_API_KEY is not configured");
        }
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut client = Self::new(api_key, base_url.trim_end_matches('/'));
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            client.model = model;
        }
        Ok(client)
    }

    async fn complete(
        &self,
        temperature: f64,
        max_tokens: u32,
        messages: &[ApiMessage],
    ) -> std::result::Result<String, ApiFailure> {
        let request = ChatRequest {
            model: &self.model,
            temperature,
            max_tokens,
            messages,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiFailure::Status(status.as_u16(), body));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| ApiFailure::Transport(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(ApiFailure::EmptyResponse)
    }

    /// Chat with the coach. API problems come back as user-facing text, the
    /// conversation keeps going either way.
    pub async fn send_coach_message(&self, messages: &[Message], context: &ChatContext) -> String {
        let mut api_messages = vec![ApiMessage {
            role: "system",
            content: coach_system_prompt(context),
        }];
        api_messages.extend(messages.iter().map(|m| ApiMessage {
            role: m.role.as_str(),
            content: m.content.clone(),
        }));

        match self.complete(CHAT_TEMPERATURE, 2000, &api_messages).await {
            Ok(content) => content,
            Err(ApiFailure::Status(status, body)) => {
                warn!(status, %body, "coach API returned an error");
                friendly_api_error(status, &body)
            }
            Err(ApiFailure::EmptyResponse) => {
                "Error: Received an empty response from the AI. Please try again.".to_string()
            }
            Err(ApiFailure::Transport(err)) => {
                warn!(error = %err, "coach API unreachable");
                "I apologize, but I'm unable to provide coaching advice right now. \
                 Please try again later."
                    .to_string()
            }
        }
    }

    /// Suggestions for the next session of one exercise. Falls back to the
    /// rule-based generator when the API call or parsing fails. Returns None
    /// for an empty history.
    pub async fn performance_suggestions(
        &self,
        exercise_id: &str,
        history: &[ExercisePerformance],
    ) -> Option<CoachResponse> {
        if history.is_empty() {
            warn!("cannot generate suggestions without performance history");
            return None;
        }

        let key = cache_key(exercise_id, history);
        if let Some(cached) = self.cached(&key) {
            debug!(exercise_id, "using cached suggestion");
            return Some(cached);
        }

        let messages = [
            ApiMessage {
                role: "system",
                content: suggestion_system_prompt(),
            },
            ApiMessage {
                role: "user",
                content: suggestion_prompt(exercise_id, history),
            },
        ];

        match self.complete(SUGGESTION_TEMPERATURE, 1000, &messages).await {
            Ok(content) => match parse_coach_json(&content) {
                Ok(response) => {
                    self.cache.lock().unwrap().insert(
                        key,
                        CacheEntry {
                            at: Instant::now(),
                            response: response.clone(),
                        },
                    );
                    Some(response)
                }
                Err(err) => {
                    warn!(error = %err, "unparseable suggestion response, using fallback");
                    fallback::suggestions(exercise_id, history)
                }
            },
            Err(_) => {
                warn!(exercise_id, "coach API unavailable, using fallback rules");
                fallback::suggestions(exercise_id, history)
            }
        }
    }

    /// Whole-workout modification proposal from user feedback
    pub async fn workout_modifications(
        &self,
        performance: &WorkoutPerformance,
        feedback: &str,
        profile: Option<&EquipmentProfile>,
    ) -> Option<CoachResponse> {
        let messages = [
            ApiMessage {
                role: "system",
                content: modifications_system_prompt(),
            },
            ApiMessage {
                role: "user",
                content: modifications_prompt(performance, feedback, profile),
            },
        ];

        match self.complete(SUGGESTION_TEMPERATURE, 2000, &messages).await {
            Ok(content) => match parse_coach_json(&content) {
                Ok(response) => Some(response),
                Err(err) => {
                    warn!(error = %err, "unparseable modification response");
                    None
                }
            },
            Err(_) => {
                warn!("coach API unavailable, no modifications generated");
                None
            }
        }
    }

    fn cached(&self, key: &str) -> Option<CoachResponse> {
        let cache = self.cache.lock().unwrap();
        cache
            .get(key)
            .filter(|entry| entry.at.elapsed() < CACHE_TTL)
            .map(|entry| entry.response.clone())
    }
}

/// Map an API status to the message shown in chat
fn friendly_api_error(status: u16, body: &str) -> String {
    match status {
        401 => "Error: API key is invalid. Please contact support.".to_string(),
        429 => "Error: Rate limit exceeded. Please try again later.".to_string(),
        400 => {
            let detail = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "Unknown error".to_string());
            format!("Error: Bad request - {}", detail)
        }
        _ => format!("Error: Coach API error ({}). Please try again later.", status),
    }
}

/// Accepts raw JSON or JSON wrapped in a markdown code fence
fn parse_coach_json(content: &str) -> Result<CoachResponse> {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end_matches("```"))
        .unwrap_or(trimmed);
    Ok(serde_json::from_str(trimmed.trim())?)
}

fn cache_key(exercise_id: &str, history: &[ExercisePerformance]) -> String {
    let fingerprint: Vec<String> = history
        .iter()
        .map(|p| {
            format!(
                "{}-{}-{}-{}-{}-{}-{}",
                p.exercise_id,
                p.weight,
                p.completed_sets,
                p.completed_reps
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
                p.rpe.unwrap_or(0),
                p.form_quality.map(|f| f.label()).unwrap_or(""),
                p.difficulty.map(|d| d.label()).unwrap_or(""),
            )
        })
        .collect();
    format!("exercise-{}-{}", exercise_id, fingerprint.join("|"))
}

fn suggestion_system_prompt() -> String {
    "You are an expert strength coach and personal trainer with deep knowledge of weight \
     training, progressive overload, and exercise form. Your role is to analyze workout data \
     and provide specific, evidence-based recommendations for the user's next workout.\n\n\
     You should suggest appropriate weight, rep, and set adjustments based on the user's prior \
     performance. Always prioritize:\n\n\
     1. Safety: Never recommend unsafe progression jumps (keep weight increases to 5-10% maximum)\n\
     2. Form over weight: If the user reported poor form, focus on technique at the same or \
     lower weight\n\
     3. Progressive overload: Look for appropriate opportunities to increase difficulty through \
     weight, reps, or sets\n\
     4. Recovery: Consider reported difficulty and RPE when making suggestions\n\n\
     Always provide a clear explanation for your recommendations so the user understands the \
     reasoning. Format your response as valid JSON matching the expected structure."
        .to_string()
}

fn modifications_system_prompt() -> String {
    "You are an expert strength coach and personal trainer with deep knowledge of weight \
     training, progressive overload, and exercise form. Your task is to analyze a workout \
     performance and user feedback to suggest appropriate modifications to the program.\n\n\
     Provide your response as a JSON object with:\n\
     1. A clear explanation of your overall assessment\n\
     2. Specific modifications to individual exercises\n\
     3. Any program adjustments if needed (e.g., deload, volume changes)\n\n\
     Always consider safety first, and ensure your recommendations match the user's available \
     equipment."
        .to_string()
}

/// System prompt for the chat interface, with workout/equipment context inlined
pub fn coach_system_prompt(context: &ChatContext) -> String {
    let mut context_string = String::new();

    if !context.recent_workouts.is_empty() {
        context_string.push_str("\nRecent workout data:\n");
        for workout in &context.recent_workouts {
            context_string.push_str(&format!(
                "Date: {}, Workout: {}\n",
                workout.date, workout.workout_day_id
            ));
            context_string.push_str(&format!(
                "Overall rating: {}\n",
                workout
                    .overall_rating
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "Not provided".to_string())
            ));
            context_string.push_str(&format!(
                "Feedback: {}\n",
                workout.overall_feedback.as_deref().unwrap_or("None")
            ));
        }
    }

    if let Some(profile) = &context.equipment_profile {
        context_string.push_str("\nEquipment constraints:\n");
        context_string.push_str(&equipment_summary(profile));
    }

    if let Some(issue) = context.user_issue {
        context_string.push_str(&format!("\nUser reported issue: {}\n", issue.label()));
    }

    format!(
        "You are an expert strength coach and personal trainer with deep knowledge of weight \
         training, progressive overload, and exercise form. Your role is to provide \
         personalized workout advice based on the user's data, questions, and concerns.\n\n\
         You should be:\n\
         1. Practical - Give actionable, specific advice\n\
         2. Evidence-based - Use proven training principles\n\
         3. Responsive - Address the user's specific question or concern\n\
         4. Safety-focused - Never recommend anything that could lead to injury\n\
         5. Adaptable - Work with the user's available equipment and constraints\n\n\
         When suggesting modifications to a workout:\n\
         - Be specific about exercise changes (sets, reps, weight, etc.)\n\
         - Explain the reasoning behind your recommendations\n\
         - Consider the user's reported feedback and performance\n\
         - Structure your suggestions in a way that can be easily implemented\n\
         {}\n\
         Respond conversationally and directly to the user's questions. If you need additional \
         information to provide good advice, ask clarifying questions.",
        context_string
    )
}

fn equipment_summary(profile: &EquipmentProfile) -> String {
    let mut out = format!("Location: {}\n", profile.location);
    if !profile.constraints.is_empty() {
        out.push_str("Specific constraints:\n");
        for constraint in &profile.constraints {
            match &constraint.exercise_id {
                Some(id) => out.push_str(&format!("Exercise {}: ", id)),
                None => out.push_str("General: "),
            }
            out.push_str(&format!(
                "Min weight: {}, Max weight: {}, Increment: {}\n",
                opt_num(constraint.min_weight),
                opt_num(constraint.max_weight),
                opt_num(constraint.increment_size),
            ));
        }
    }
    out
}

fn opt_num(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn history_entry(perf: &ExercisePerformance) -> String {
    format!(
        "Date: {}\nWeight: {} {}\nSets completed: {}/{}\nReps completed: {}\nRPE: {}\n\
         Form quality: {}\nDifficulty: {}\nNotes: {}\nIssues: {}",
        perf.workout_date.as_deref().unwrap_or("Unknown"),
        perf.weight,
        perf.weight_unit.label(),
        perf.completed_sets,
        perf.target_sets,
        perf.completed_reps
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        perf.rpe
            .map(|r| r.to_string())
            .unwrap_or_else(|| "Not recorded".to_string()),
        perf.form_quality
            .map(|f| f.label())
            .unwrap_or("Not recorded"),
        perf.difficulty.map(|d| d.label()).unwrap_or("Not recorded"),
        perf.notes.as_deref().unwrap_or("None"),
        if perf.issues.is_empty() {
            "None".to_string()
        } else {
            perf.issues
                .iter()
                .map(|i| i.label())
                .collect::<Vec<_>>()
                .join(", ")
        },
    )
}

fn suggestion_prompt(exercise_id: &str, history: &[ExercisePerformance]) -> String {
    // Oldest to newest reads naturally as a progression
    let mut sorted: Vec<&ExercisePerformance> = history.iter().collect();
    sorted.sort_by(|a, b| a.workout_date.cmp(&b.workout_date));
    let history_text = sorted
        .iter()
        .map(|p| history_entry(p))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Please analyze the following workout performance history for exercise ID: {exercise_id} \
         and provide recommendations for the next workout.\n\n\
         Performance History (from oldest to newest):\n{history_text}\n\n\
         Based on this data, please suggest appropriate weight, reps, and sets for the next \
         workout. Explain your reasoning and consider form quality, RPE, difficulty level, and \
         any reported issues.\n\n\
         Return your response in the following JSON format:\n\
         {{\n\
           \"explanation\": \"Clear explanation of your recommendation and reasoning\",\n\
           \"modifications\": [\n\
             {{\n\
               \"exercise_id\": \"{exercise_id}\",\n\
               \"changes\": [\n\
                 {{\n\
                   \"parameter\": \"weight|sets|reps\",\n\
                   \"current_value\": \"current value from most recent workout\",\n\
                   \"recommended_value\": \"your recommendation\",\n\
                   \"reasoning\": \"specific reasoning for this change\"\n\
                 }}\n\
               ]\n\
             }}\n\
           ]\n\
         }}"
    )
}

fn modifications_prompt(
    performance: &WorkoutPerformance,
    feedback: &str,
    profile: Option<&EquipmentProfile>,
) -> String {
    let exercises_text = performance
        .exercises
        .iter()
        .map(|ex| {
            format!(
                "Exercise ID: {}\n{}",
                ex.exercise_id,
                history_entry(ex)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let equipment_string = profile
        .map(|p| format!("\nEquipment constraints:\n{}", equipment_summary(p)))
        .unwrap_or_default();

    format!(
        "Please analyze the following workout performance and suggest appropriate \
         modifications:\n\n\
         Workout ID: {}\nDate: {}\nOverall Rating: {}\nDuration: {} minutes\n\n\
         Exercise performance:\n{}\n\n\
         User feedback:\n{}\n{}\n\
         Please provide your recommendations in the following JSON format:\n\
         {{\n\
           \"explanation\": \"Overall assessment and general advice\",\n\
           \"modifications\": [\n\
             {{\n\
               \"exercise_id\": \"exercise_id\",\n\
               \"changes\": [\n\
                 {{\n\
                   \"parameter\": \"weight|sets|reps|tempo\",\n\
                   \"current_value\": \"current value\",\n\
                   \"recommended_value\": \"recommended value\",\n\
                   \"reasoning\": \"specific reasoning for this change\"\n\
                 }}\n\
               ]\n\
             }}\n\
           ],\n\
           \"program_adjustments\": {{\n\
             \"type\": \"deload|volume_increase|intensity_focus\",\n\
             \"duration_weeks\": 1,\n\
             \"details\": \"Detailed explanation of the program adjustment\"\n\
           }}\n\
         }}",
        performance.workout_day_id,
        performance.date,
        performance
            .overall_rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| "Not provided".to_string()),
        performance
            .duration_mins
            .map(|d| d.to_string())
            .unwrap_or_else(|| "Not recorded".to_string()),
        exercises_text,
        feedback,
        equipment_string,
    )
}
