use crate::errors::ClientError;
use crate::transport::HttpReply;

use super::wire::{ErrorEnvelope, GenerateContentResponse, SafetyRating};

const NORMAL_FINISH_REASON: &str = "STOP";

/// A success-status generation payload, classified.
///
/// Every variant ends in a narrator turn; none of them is a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GenerationOutcome {
    /// The prompt was refused by the safety filter.
    Blocked {
        reason: String,
        flagged: Vec<String>,
    },
    /// A candidate came back with no text.
    Empty { finish_reason: Option<String> },
    /// A candidate with text.
    Text {
        text: String,
        finish_reason: Option<String>,
    },
}

impl GenerationOutcome {
    /// Text appended to the transcript as the model's turn.
    pub(crate) fn narration(&self) -> String {
        match self {
            Self::Blocked { reason, flagged } => {
                let mut out = format!(
                    "[The story pauses: your last action was blocked by the safety filter (reason: {reason}).]"
                );
                if !flagged.is_empty() {
                    out.push_str(&format!("\n[Flagged: {}]", flagged.join(", ")));
                }
                out
            }
            Self::Empty { finish_reason } => format!(
                "[The model returned an empty response (finish reason: {}).]",
                finish_reason.as_deref().unwrap_or("UNKNOWN")
            ),
            Self::Text {
                text,
                finish_reason,
            } => match finish_reason {
                Some(reason) if !reason.eq_ignore_ascii_case(NORMAL_FINISH_REASON) => {
                    format!("{text}\n\n[Response ended early: {reason}]")
                }
                _ => text.clone(),
            },
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Blocked { .. } => "blocked",
            Self::Empty { .. } => "empty",
            Self::Text { .. } => "text",
        }
    }
}

/// Classifies the body of a success-status generation reply.
pub(crate) fn classify_generation(body: &str) -> Result<GenerationOutcome, ClientError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ClientError::MalformedResponse(format!("response is not valid JSON: {e}")))?;

    if let Some(feedback) = &response.prompt_feedback
        && let Some(reason) = feedback.block_reason.as_deref()
    {
        return Ok(GenerationOutcome::Blocked {
            reason: reason.to_string(),
            flagged: flagged_categories(feedback.safety_ratings.as_deref().unwrap_or_default()),
        });
    }

    let Some(candidate) = response.candidates.unwrap_or_default().into_iter().next() else {
        return Err(ClientError::MalformedResponse(
            "response contained neither candidates nor a block reason".into(),
        ));
    };

    let text: String = candidate
        .content
        .and_then(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        return Ok(GenerationOutcome::Empty {
            finish_reason: candidate.finish_reason,
        });
    }
    Ok(GenerationOutcome::Text {
        text,
        finish_reason: candidate.finish_reason,
    })
}

fn flagged_categories(ratings: &[SafetyRating]) -> Vec<String> {
    ratings
        .iter()
        .filter(|r| !matches!(r.probability.as_str(), "NEGLIGIBLE" | "LOW" | ""))
        .map(|r| format!("{} ({})", r.category, r.probability))
        .collect()
}

/// Builds the error for a non-success reply from either endpoint.
pub(crate) fn remote_failure(reply: &HttpReply) -> ClientError {
    let detail = serde_json::from_str::<ErrorEnvelope>(&reply.body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .or_else(|| Some(reply.status_text.trim().to_string()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| format!("HTTP {}", reply.status));
    ClientError::RemoteRequestFailed {
        status: reply.status,
        detail,
        guidance: status_guidance(reply.status),
    }
}

fn status_guidance(status: u16) -> Option<&'static str> {
    match status {
        400 => Some(
            "the request was rejected; the prompt may have been blocked by safety policy, or the API may be unavailable in your region",
        ),
        401 | 403 => Some("the API key is invalid or lacks access to the Generative Language API"),
        404 => Some("the selected model was not found; refresh the model list and pick another"),
        429 => Some("rate limit reached; wait a moment before trying again"),
        500..=599 => Some("the service had an internal error; try again later"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(status: u16, status_text: &str, body: &str) -> HttpReply {
        HttpReply {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    #[test]
    fn block_reason_wins_and_lists_flagged_categories() {
        let body = serde_json::json!({
            "promptFeedback": {
                "blockReason": "SAFETY",
                "safetyRatings": [
                    {"category": "HARM_CATEGORY_HARASSMENT", "probability": "NEGLIGIBLE"},
                    {"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "probability": "HIGH"}
                ]
            }
        })
        .to_string();
        let outcome = classify_generation(&body).expect("blocked is not an error");
        assert_eq!(
            outcome,
            GenerationOutcome::Blocked {
                reason: "SAFETY".into(),
                flagged: vec!["HARM_CATEGORY_DANGEROUS_CONTENT (HIGH)".into()],
            }
        );
        let narration = outcome.narration();
        assert!(narration.contains("reason: SAFETY"));
        assert!(narration.contains("HARM_CATEGORY_DANGEROUS_CONTENT"));
    }

    #[test]
    fn candidate_without_text_is_empty_outcome() {
        let body = r#"{"candidates":[{"content":{"parts":[]},"finishReason":"SAFETY"}]}"#;
        let outcome = classify_generation(body).expect("empty is not an error");
        assert_eq!(
            outcome.narration(),
            "[The model returned an empty response (finish reason: SAFETY).]"
        );
    }

    #[test]
    fn candidate_without_content_reports_unknown_reason() {
        let outcome = classify_generation(r#"{"candidates":[{}]}"#).expect("empty");
        assert!(outcome.narration().contains("finish reason: UNKNOWN"));
    }

    #[test]
    fn stop_reason_returns_plain_text() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"The gate "},{"text":"opens."}]},"finishReason":"STOP"}]}"#;
        let outcome = classify_generation(body).expect("text");
        assert_eq!(outcome.narration(), "The gate opens.");
        assert_eq!(outcome.kind(), "text");
    }

    #[test]
    fn early_termination_appends_suffix() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"The gate"}]},"finishReason":"MAX_TOKENS"}]}"#;
        let narration = classify_generation(body).expect("text").narration();
        assert_eq!(narration, "The gate\n\n[Response ended early: MAX_TOKENS]");
    }

    #[test]
    fn no_candidates_and_no_block_reason_is_malformed() {
        for body in [r#"{}"#, r#"{"candidates":[]}"#, r#"{"promptFeedback":{}}"#, "not json"] {
            assert!(
                matches!(classify_generation(body), Err(ClientError::MalformedResponse(_))),
                "{body} should be malformed"
            );
        }
    }

    #[test]
    fn remote_failure_prefers_error_envelope_message() {
        let err = remote_failure(&reply(
            404,
            "Not Found",
            r#"{"error":{"code":404,"message":"models/nope is not found","status":"NOT_FOUND"}}"#,
        ));
        assert!(matches!(
            &err,
            ClientError::RemoteRequestFailed { status: 404, detail, guidance: Some(_) }
                if detail == "models/nope is not found"
        ));
    }

    #[test]
    fn remote_failure_falls_back_to_status_text() {
        let err = remote_failure(&reply(503, "Service Unavailable", "<html>oops</html>"));
        assert!(matches!(
            &err,
            ClientError::RemoteRequestFailed { status: 503, detail, .. } if detail == "Service Unavailable"
        ));
        let err = remote_failure(&reply(599, "", ""));
        assert!(matches!(
            &err,
            ClientError::RemoteRequestFailed { detail, .. } if detail == "HTTP 599"
        ));
    }

    #[test]
    fn well_known_statuses_carry_guidance() {
        for status in [400, 401, 403, 404, 429, 500, 503] {
            assert!(status_guidance(status).is_some(), "{status}");
        }
        assert!(status_guidance(418).is_none());
    }
}
