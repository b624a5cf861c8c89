//! Assistant personas and the learning context folded into the system prompt.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{Message, Role};

const GENERAL_PROMPT: &str = "You are CodeLyft Assistant, an AI helper for the CodeLyft learning platform.
Your purpose is to help users navigate their learning journey, understand technologies,
and make the most of the platform's features. Be concise, helpful, and focus on
providing practical advice related to programming, technology learning paths,
and the CodeLyft platform itself. Avoid long explanations unless specifically asked.

You have the following specialized capabilities:

1. Roadmap Navigation & Explanation
   - Provide detailed explanations of tools/technologies in roadmaps
   - Make intelligent \"next step\" recommendations based on user progress
   - Compare technologies to help users make informed decisions

2. Personalized Learning Path Optimization
   - Suggest modifications to standard roadmaps based on user goals/experience
   - Help users prioritize sections based on their career objectives
   - Identify which topics can be skipped based on prior knowledge

3. Project Ideation & Planning
   - Generate relevant project ideas that apply multiple learned technologies
   - Break complex projects into achievable milestones
   - Match project suggestions to user's current skill level

4. Technology Comparison & Clarification
   - Provide clear comparisons between similar technologies
   - Explain when/why to use specific tools in different contexts
   - Clarify complex technical concepts in simple terms

5. Custom Roadmap Creation Assistance
   - Help users design tailored learning paths for specific goals
   - Suggest technologies to include based on career objectives
   - Ensure logical progression and dependencies in custom roadmaps

When users ask about technologies, roadmaps, or learning paths, provide specific, actionable advice.
For technology comparisons, focus on practical differences, use cases, and tradeoffs.
When suggesting projects, ensure they match the user's current skill level and learning goals.";

const GENERIC_STARTER: &str = "How can I help with your learning?";

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoadmapRef {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "isCustom")]
    pub is_custom: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoRef {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
}

impl Progress {
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed.min(self.total) as u64 * 100) / self.total as u64) as u32
    }
}

/// Partial update: only the fields that are `Some` replace current values.
#[derive(Clone, Debug, Default)]
pub struct ContextUpdate {
    pub roadmap: Option<RoadmapRef>,
    pub topic: Option<String>,
    pub video: Option<VideoRef>,
    pub progress: Option<Progress>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextField {
    Roadmap,
    Topic,
    Video,
    Progress,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LearningContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roadmap: Option<RoadmapRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

impl LearningContext {
    pub fn apply(&mut self, update: ContextUpdate) {
        if let Some(r) = update.roadmap {
            self.roadmap = Some(r);
        }
        if let Some(t) = update.topic {
            self.topic = Some(t);
        }
        if let Some(v) = update.video {
            self.video = Some(v);
        }
        if let Some(p) = update.progress {
            self.progress = Some(p);
        }
    }

    pub fn clear(&mut self, field: ContextField) {
        match field {
            ContextField::Roadmap => self.roadmap = None,
            ContextField::Topic => self.topic = None,
            ContextField::Video => self.video = None,
            ContextField::Progress => self.progress = None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roadmap.is_none() && self.topic.is_none() && self.video.is_none() && self.progress.is_none()
    }

    /// Present fields, in prompt order, with a short human label for display.
    pub fn entries(&self) -> Vec<(ContextField, String)> {
        let mut out = Vec::new();
        if let Some(r) = &self.roadmap {
            let kind = if r.is_custom { "custom roadmap" } else { "roadmap" };
            out.push((ContextField::Roadmap, format!("{}: {}", kind, r.title)));
        }
        if let Some(t) = &self.topic {
            out.push((ContextField::Topic, format!("topic: {}", t)));
        }
        if let Some(v) = &self.video {
            out.push((ContextField::Video, format!("video: {}", v.title)));
        }
        if let Some(p) = &self.progress {
            out.push((
                ContextField::Progress,
                format!("progress: {}/{} ({}%)", p.completed, p.total, p.percent()),
            ));
        }
        out
    }

    /// Context paragraph appended to the system prompt, `None` when nothing is set.
    pub fn context_block(&self) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();
        if let Some(r) = &self.roadmap {
            parts.push(format!("Current roadmap: {}", to_json(r)));
        }
        if let Some(t) = &self.topic {
            parts.push(format!("Current topic: {}", to_json(t)));
        }
        if let Some(v) = &self.video {
            parts.push(format!("Current video: {}", to_json(v)));
        }
        if let Some(p) = &self.progress {
            parts.push(format!("User progress: {}", to_json(p)));
        }
        if parts.is_empty() {
            return None;
        }
        Some(format!(
            "Current user context:\n{}\n\nUse this context to provide more relevant answers when appropriate.",
            parts.join("\n")
        ))
    }
}

fn to_json<T: Serialize>(v: &T) -> String {
    serde_json::to_string(v).unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Persona {
    General,
    Roadmap { title: String },
}

impl Persona {
    pub fn prompt(&self) -> String {
        match self {
            Persona::General => GENERAL_PROMPT.to_string(),
            Persona::Roadmap { title } => format!(
                "You are a specialized AI assistant for the CodeLyft learning platform, specifically helping with roadmap \"{}\".
Focus on providing technical explanations, code examples, and learning guidance related to the current topic.
Be concise, helpful, and focus on practical advice related to programming and technology learning.",
                title
            ),
        }
    }
}

pub fn system_message(persona: &Persona, ctx: &LearningContext) -> Message {
    let base = persona.prompt();
    match ctx.context_block() {
        Some(block) => Message::system(format!("{}\n\n{}", base, block)),
        None => Message::system(base),
    }
}

/// System message first, then history in order. Empty assistant
/// placeholders (pending replies) are not sent.
pub fn build_conversation(system: Message, history: &[Message]) -> Vec<Message> {
    let mut out = Vec::with_capacity(history.len() + 1);
    out.push(system);
    for m in history {
        if m.role == Role::Assistant && m.content.trim().is_empty() {
            debug!(target: "core::assistant", "skip empty assistant placeholder");
            continue;
        }
        out.push(m.clone());
    }
    out
}

pub fn suggested_prompts(ctx: &LearningContext) -> Vec<String> {
    if ctx.roadmap.is_none() && ctx.video.is_none() {
        return vec![GENERIC_STARTER.to_string()];
    }
    let subject = ctx.video.as_ref().map(|v| v.title.clone());
    let s = |fallback: &str| subject.clone().unwrap_or_else(|| fallback.to_string());
    vec![
        format!("How does {} fit into the bigger picture?", s("this topic")),
        format!("What should I learn next after {}?", s("this topic")),
        format!("Explain {} in simple terms", s("this concept")),
        format!("What are some project ideas using {}?", s("this technology")),
        format!("How does {} compare to other technologies?", s("this")),
        format!("What are common challenges when learning {}?", s("this topic")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn react_roadmap() -> RoadmapRef {
        RoadmapRef {
            title: "React".into(),
            description: Some("Frontend path".into()),
            is_custom: false,
        }
    }

    #[test]
    fn empty_context_adds_nothing_to_prompt() {
        let ctx = LearningContext::default();
        assert!(ctx.context_block().is_none());
        let sys = system_message(&Persona::General, &ctx);
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.content, GENERAL_PROMPT);
    }

    #[test]
    fn context_block_lists_fields_in_order() {
        let mut ctx = LearningContext::default();
        ctx.apply(ContextUpdate {
            roadmap: Some(react_roadmap()),
            progress: Some(Progress { completed: 3, total: 12 }),
            ..Default::default()
        });
        let block = ctx.context_block().unwrap();
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0], "Current user context:");
        assert_eq!(
            lines[1],
            r#"Current roadmap: {"title":"React","description":"Frontend path","isCustom":false}"#
        );
        assert_eq!(lines[2], r#"User progress: {"completed":3,"total":12}"#);
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let mut ctx = LearningContext::default();
        ctx.apply(ContextUpdate {
            roadmap: Some(react_roadmap()),
            topic: Some("Hooks".into()),
            ..Default::default()
        });
        ctx.apply(ContextUpdate {
            topic: Some("Context API".into()),
            ..Default::default()
        });
        assert_eq!(ctx.roadmap, Some(react_roadmap()));
        assert_eq!(ctx.topic.as_deref(), Some("Context API"));
        ctx.clear(ContextField::Roadmap);
        assert!(ctx.roadmap.is_none());
        assert!(!ctx.is_empty());
    }

    #[test]
    fn roadmap_persona_names_title_and_appends_context() {
        let mut ctx = LearningContext::default();
        ctx.topic = Some("JSX".into());
        let sys = system_message(&Persona::Roadmap { title: "React".into() }, &ctx);
        assert!(sys.content.contains("roadmap \"React\""));
        assert!(sys.content.ends_with("Use this context to provide more relevant answers when appropriate."));
        assert!(sys.content.contains("\n\nCurrent user context:\nCurrent topic: \"JSX\""));
    }

    #[test]
    fn conversation_starts_with_system_and_drops_placeholders() {
        let history = vec![
            Message::user("what is a hook?"),
            Message::assistant("a function"),
            Message::user("and useEffect?"),
            Message::assistant(""),
        ];
        let conv = build_conversation(Message::system("sys"), &history);
        assert_eq!(
            conv,
            vec![
                Message::system("sys"),
                Message::user("what is a hook?"),
                Message::assistant("a function"),
                Message::user("and useEffect?"),
            ]
        );
    }

    #[test]
    fn suggestions_follow_video_title() {
        assert_eq!(
            suggested_prompts(&LearningContext::default()),
            vec![GENERIC_STARTER.to_string()]
        );
        let ctx = LearningContext {
            video: Some(VideoRef {
                title: "Rust Ownership".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let prompts = suggested_prompts(&ctx);
        assert_eq!(prompts.len(), 6);
        assert_eq!(prompts[1], "What should I learn next after Rust Ownership?");

        let roadmap_only = LearningContext {
            roadmap: Some(react_roadmap()),
            ..Default::default()
        };
        assert_eq!(suggested_prompts(&roadmap_only)[2], "Explain this concept in simple terms");
    }

    #[test]
    fn progress_percent_handles_zero_total() {
        assert_eq!(Progress { completed: 0, total: 0 }.percent(), 0);
        assert_eq!(Progress { completed: 5, total: 8 }.percent(), 62);
        assert_eq!(Progress { completed: 9, total: 8 }.percent(), 100);
    }
}
