use storyteller_ai_harness::{CatalogEntry, Role, Turn};

pub const OPENING_NARRATION: &str = "You wake on the cold stone floor of a ruined \
watchtower. Rain hammers the broken roof, and somewhere below a door creaks open. \
A lantern lies beside you, still warm. What do you do?";

/// Seed transcript for a new story.
pub fn opening_turns() -> Vec<Turn> {
    vec![Turn::model(OPENING_NARRATION)]
}

pub fn render_turn(turn: &Turn) -> String {
    match turn.role {
        Role::User => format!("> {}", turn.text()),
        Role::Model => turn.text(),
    }
}

pub fn render_models(models: &[CatalogEntry], selected: Option<&str>) -> String {
    if models.is_empty() {
        return "No models available.".to_string();
    }
    models
        .iter()
        .map(|m| {
            let marker = if Some(m.id.as_str()) == selected { '*' } else { ' ' };
            let tier = m.tier.as_deref().map(|t| format!(" [{t}]")).unwrap_or_default();
            format!("{marker} {} ({}){tier}", m.display_name, m.id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_opens_with_a_single_narrator_turn() {
        let seed = opening_turns();
        assert_eq!(seed.len(), 1);
        assert_eq!(seed[0].role, Role::Model);
    }

    #[test]
    fn model_list_marks_selection() {
        let models = vec![
            CatalogEntry {
                id: "gemini-1.5-flash-latest".into(),
                display_name: "Gemini 1.5 Flash".into(),
                description: String::new(),
                tier: Some("Flash".into()),
            },
            CatalogEntry {
                id: "gemini-pro".into(),
                display_name: "Gemini Pro".into(),
                description: String::new(),
                tier: None,
            },
        ];
        let rendered = render_models(&models, Some("gemini-pro"));
        assert_eq!(
            rendered,
            "  Gemini 1.5 Flash (gemini-1.5-flash-latest) [Flash]\n* Gemini Pro (gemini-pro)"
        );
        assert_eq!(render_models(&[], None), "No models available.");
    }

    #[test]
    fn player_turns_are_prefixed() {
        assert_eq!(render_turn(&Turn::user("look")), "> look");
    }
}
