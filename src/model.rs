use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

/// A grounding source attached to a model answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
}

impl Citation {
    pub fn web(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            web: Some(WebSource {
                uri: uri.into(),
                title: title.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Concise,
    Detailed,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concise => "concise",
            Self::Detailed => "detailed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "concise" => Some(Self::Concise),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Concise => Self::Detailed,
            Self::Detailed => Self::Concise,
        }
    }

    /// Instruction appended to the system prompt for every request in this mode.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Concise => {
                "Answer briefly and to the point. Keep the reply to a few sentences \
                 unless the question cannot be answered that way."
            }
            Self::Detailed => {
                "Give a complete, detailed and accurate answer. Cover the relevant \
                 background, explain your reasoning, and include specifics from the \
                 sources you found."
            }
        }
    }
}

/// One entry of the conversation. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_chunks: Vec<Citation>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, text: String, is_error: bool, grounding_chunks: Vec<Citation>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text,
            is_error,
            grounding_chunks,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into(), false, Vec::new())
    }

    pub fn model(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self::new(Role::Model, text.into(), false, citations)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text.into(), true, Vec::new())
    }
}
