//! Prompt construction for the generation ports.
//!
//! Prompts are this adapter's choice, not a contract. They instruct the
//! model to return strict JSON so responses parse with serde.

use std::fmt::Write as _;

use crate::types::{EvaluationRequest, GenerationRequest};

/// System prompt for question generation.
pub const QUESTION_SYSTEM: &str = "You are an expert technical interviewer. \
Respond with a single JSON object: {\"text\": string, \"skills\": [string]}. \
No markdown, no commentary.";

/// System prompt for answer evaluation.
pub const EVALUATION_SYSTEM: &str = "You are an expert technical interviewer \
scoring a candidate's answer. Respond with a single JSON object: \
{\"score\": number 0-100, \"completeness\": number 0-1, \"relevance\": number 0-1, \
\"feedback\": {\"strengths\": [string], \"weaknesses\": [string], \"suggestions\": [string]}, \
\"gaps\": [{\"concept\": string, \"severity\": \"minor\"|\"moderate\"|\"major\"}]}. \
No markdown, no commentary.";

/// Build the user prompt for question generation.
pub fn question_prompt(request: &GenerationRequest) -> String {
    let mut p = String::new();
    let _ = writeln!(
        p,
        "Create one {} interview question on '{}' at {} difficulty for a {}-level candidate.",
        request.question_type.as_str().replace('_', " "),
        request.skill,
        request.difficulty.as_str(),
        request.experience_band.as_str(),
    );

    if let Some(follow_up) = &request.follow_up {
        let _ = writeln!(
            p,
            "\nThis is follow-up attempt {} on a question the candidate has not yet fully answered.",
            follow_up.attempt_number + 1
        );
        if follow_up.unresolved_gaps.is_empty() {
            let _ = writeln!(p, "Probe the weakest part of their previous answer.");
        } else {
            let _ = writeln!(
                p,
                "Target these concepts the candidate has not yet demonstrated: {}.",
                follow_up.unresolved_gaps.join(", ")
            );
        }
    }

    if let Some(exemplars) = request.exemplars.as_deref().filter(|e| !e.is_empty()) {
        let _ = writeln!(
            p,
            "\nHere are similar questions for style and depth calibration. \
             Produce a NEW question inspired by them, never a copy:"
        );
        for (i, exemplar) in exemplars.iter().enumerate() {
            let _ = writeln!(
                p,
                "{}. [{}] {}",
                i + 1,
                exemplar.difficulty.as_str(),
                exemplar.text
            );
        }
    }

    p
}

/// Build the user prompt for ideal answer generation.
pub fn ideal_answer_prompt(question_text: &str) -> String {
    format!(
        "Write the ideal answer a strong candidate would give to this interview \
         question. Answer in plain prose, no preamble.\n\nQuestion: {question_text}"
    )
}

/// Build the user prompt for rationale generation.
pub fn rationale_prompt(question_text: &str, ideal_answer: &str) -> String {
    format!(
        "Explain in 2-3 sentences what the ideal answer below demonstrates and \
         why it satisfies the question.\n\nQuestion: {question_text}\n\n\
         Ideal answer: {ideal_answer}"
    )
}

/// Build the user prompt for answer evaluation.
pub fn evaluation_prompt(request: &EvaluationRequest) -> String {
    let mut p = String::new();
    let _ = writeln!(p, "Question: {}", request.question_text);
    let _ = writeln!(p, "\nCandidate answer: {}", request.answer_text);
    let _ = writeln!(p, "\nAttempt number: {}", request.attempt_number);
    if !request.prior_unresolved_gaps.is_empty() {
        let _ = writeln!(
            p,
            "\nConcepts still missing from earlier attempts: {}. \
             Note in the gaps list any that remain unaddressed.",
            request.prior_unresolved_gaps.join(", ")
        );
    }
    p
}
