/// Speaker of a transcript turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The player.
    User,
    /// The generative model (narrator).
    Model,
}

/// One text segment of a turn.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Part {
    pub text: String,
}

/// One role-tagged message in the transcript.
///
/// Serializes to the wire shape the generation endpoint expects:
/// `{"role": "user", "parts": [{"text": "..."}]}`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    /// Creates a single-segment turn.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Creates a player turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Creates a narrator turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    /// Concatenates all segments in order.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            out.push_str(&part.text);
        }
        out
    }
}
