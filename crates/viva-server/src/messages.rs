//! Inbound WebSocket message shapes.
//!
//! Outbound messages are [`viva_core::SessionEvent`]s serialized directly;
//! only the client-to-server direction needs its own types.

use serde::Deserialize;

use viva_core::model::AnswerMode;

/// A command sent by the candidate's client over the socket.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Begin the interview.
    Start,
    /// Answer the currently presented question.
    #[serde(rename_all = "camelCase")]
    SubmitAnswer {
        /// The answer text.
        text: String,
        /// Delivery mode; defaults to `text`.
        #[serde(default)]
        mode: AnswerMode,
        /// Optional target question; rejected if it is not the active one.
        #[serde(default)]
        question_id: Option<String>,
    },
    /// Request a state snapshot.
    GetState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn start_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"start"}"#).unwrap();
        assert_matches!(msg, ClientMessage::Start);
    }

    #[test]
    fn submit_answer_defaults_to_text_mode() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"submitAnswer","text":"an answer"}"#).unwrap();
        assert_matches!(
            msg,
            ClientMessage::SubmitAnswer { ref text, mode: AnswerMode::Text, .. } if text == "an answer"
        );
    }

    #[test]
    fn submit_answer_accepts_voice_mode() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"submitAnswer","text":"spoken","mode":"voice"}"#)
                .unwrap();
        assert_matches!(msg, ClientMessage::SubmitAnswer { mode: AnswerMode::Voice, .. });
    }

    #[test]
    fn submit_answer_carries_optional_question_id() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"submitAnswer","text":"an answer","questionId":"q_01"}"#,
        )
        .unwrap();
        assert_matches!(
            msg,
            ClientMessage::SubmitAnswer { question_id: Some(ref id), .. } if id == "q_01"
        );
    }

    #[test]
    fn get_state_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"getState"}"#).unwrap();
        assert_matches!(msg, ClientMessage::GetState);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"type":"selfDestruct"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn submit_answer_requires_text() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"type":"submitAnswer"}"#);
        assert!(result.is_err());
    }
}
