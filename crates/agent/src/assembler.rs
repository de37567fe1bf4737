//! Message assembly — the ordered sequence sent to the provider.
//!
//! Assembly rules:
//! 1. The system message is always first; retrieved context, when present,
//!    is appended to it under a fixed heading.
//! 2. Memory-fetched prior messages are spliced directly after the system
//!    message, in their original chronological order.
//! 3. The caller's input is always last. A plain string becomes one user
//!    message; a message list is appended as a block with its internal
//!    relative order untouched.

use conductor_core::message::{AgentInput, Message};

/// Heading under which retrieved context is embedded in the system message.
pub const CONTEXT_HEADING: &str = "\nRelevant Context:\n";

/// Build the ordered message sequence for one operation.
pub fn assemble(
    instructions: &str,
    retrieved_context: Option<&str>,
    prior_messages: &[Message],
    input: &AgentInput,
) -> Vec<Message> {
    let system_content = match retrieved_context {
        Some(context) => format!("{instructions}{CONTEXT_HEADING}{context}"),
        None => instructions.to_string(),
    };

    let mut messages = Vec::with_capacity(
        2 + prior_messages.len()
            + match input {
                AgentInput::Messages(list) => list.len(),
                AgentInput::Text(_) => 1,
            },
    );

    messages.push(Message::system(system_content));
    messages.extend_from_slice(prior_messages);

    match input {
        AgentInput::Text(text) => messages.push(Message::user(text.clone())),
        AgentInput::Messages(list) => messages.extend_from_slice(list),
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_core::message::Role;

    #[test]
    fn first_message_is_always_system() {
        let messages = assemble("Be helpful.", None, &[], &AgentInput::from("Hello!"));
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "Be helpful.");
        assert_eq!(messages.last().unwrap().role, Role::User);
    }

    #[test]
    fn retrieved_context_is_embedded_under_heading() {
        let messages = assemble(
            "Be helpful.",
            Some("Paris is the capital of France."),
            &[],
            &AgentInput::from("Capital of France?"),
        );
        assert_eq!(
            messages[0].content,
            "Be helpful.\nRelevant Context:\nParis is the capital of France."
        );
    }

    #[test]
    fn prior_messages_spliced_after_system_in_order() {
        let prior = vec![Message::user("earlier question"), Message::assistant("earlier answer")];
        let messages = assemble("Be helpful.", None, &prior, &AgentInput::from("follow-up"));

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "earlier question");
        assert_eq!(messages[2].content, "earlier answer");
        assert_eq!(messages[3].content, "follow-up");
    }

    #[test]
    fn message_list_input_keeps_relative_order() {
        let input = AgentInput::from(vec![
            Message::user("step one"),
            Message::assistant("ack"),
            Message::user("step two"),
        ]);
        let messages = assemble("Be helpful.", None, &[], &input);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].content, "step one");
        assert_eq!(messages[2].content, "ack");
        assert_eq!(messages[3].content, "step two");
    }

    #[test]
    fn all_rules_compose() {
        let prior = vec![Message::user("history")];
        let input = AgentInput::from(vec![Message::user("now")]);
        let messages = assemble("sys", Some("ctx"), &prior, &input);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.ends_with("ctx"));
        assert_eq!(messages[1].content, "history");
        assert_eq!(messages[2].content, "now");
    }
}
