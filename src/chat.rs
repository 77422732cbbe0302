use serde::Serialize;

/// Who authored a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation. Serializes directly into the wire shape
/// the completions API expects (`{"role": ..., "content": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// The two ways a turn can fail. Placeholders are fixed strings so the
/// UI (and tests) can rely on exact values instead of free-form error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The service answered, but the reply text was missing (API error
    /// payload, quota exhaustion, unexpected schema).
    Generation,
    /// The request never produced a usable response (network error,
    /// timeout, non-JSON body).
    Communication,
}

impl Failure {
    pub fn placeholder(self) -> &'static str {
        match self {
            Failure::Generation => "Erro ao gerar resposta.",
            Failure::Communication => "Erro na comunicação com a IA.",
        }
    }
}

/// Result of one completion request as the controller sees it:
/// `Ok(Some(text))` is a reply, `Ok(None)` is a well-formed response with
/// no reply in it, `Err` is a transport-level failure.
pub type TurnOutcome = anyhow::Result<Option<String>>;

/// Owns the chat session state: the append-only message list, the draft
/// being typed, and the busy flag for the outstanding request. All
/// mutation goes through these methods; the UI layer only reads.
pub struct Conversation {
    messages: Vec<Message>,
    draft: String,
    cursor: usize, // char index into draft
    busy: bool,
}

/// Convert a character index to a byte index for UTF-8 safe string edits.
pub(crate) fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            draft: String::new(),
            cursor: 0,
            busy: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    // Draft editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.draft, self.cursor);
        self.draft.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.draft.chars().count() {
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.draft.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.draft.chars().count();
    }

    /// Replace the draft wholesale (used by the one-shot CLI path).
    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
        self.cursor = self.draft.chars().count();
    }

    // Turn lifecycle

    /// Submit half of a turn. Appends the draft as a user message, clears
    /// the draft, raises the busy flag, and returns the full updated
    /// message list to send as the request payload.
    ///
    /// Returns `None` without touching any state when the draft trims to
    /// empty or a request is already outstanding; a second submit while
    /// busy is ignored rather than queued.
    pub fn begin_turn(&mut self) -> Option<Vec<Message>> {
        if self.busy || self.draft.trim().is_empty() {
            return None;
        }

        let content = std::mem::take(&mut self.draft);
        self.cursor = 0;
        self.messages.push(Message {
            role: Role::User,
            content,
        });
        self.busy = true;

        Some(self.messages.clone())
    }

    /// Settle half of a turn. Appends the assistant reply, or the fixed
    /// placeholder for whichever failure occurred, and drops the busy flag
    /// unconditionally. A failed turn is terminal; the user resubmits.
    pub fn resolve_turn(&mut self, outcome: TurnOutcome) {
        let content = match outcome {
            Ok(Some(text)) => text,
            Ok(None) => Failure::Generation.placeholder().to_string(),
            Err(err) => {
                tracing::error!("completion request failed: {err:#}");
                Failure::Communication.placeholder().to_string()
            }
        };

        self.messages.push(Message {
            role: Role::Assistant,
            content,
        });
        self.busy = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn submitted(text: &str) -> Conversation {
        let mut conversation = Conversation::new();
        conversation.set_draft(text);
        assert!(conversation.begin_turn().is_some());
        conversation
    }

    #[test]
    fn empty_draft_is_rejected() {
        let mut conversation = Conversation::new();
        assert!(conversation.begin_turn().is_none());
        assert!(conversation.messages().is_empty());
        assert!(!conversation.is_busy());
    }

    #[test]
    fn whitespace_draft_is_rejected() {
        let mut conversation = Conversation::new();
        conversation.set_draft("   \t  ");
        assert!(conversation.begin_turn().is_none());
        assert!(conversation.messages().is_empty());
        assert!(!conversation.is_busy());
        // Draft is left alone on a rejected submit
        assert_eq!(conversation.draft(), "   \t  ");
    }

    #[test]
    fn begin_turn_appends_user_message_and_clears_draft() {
        let mut conversation = Conversation::new();
        conversation.set_draft("Olá");

        let payload = conversation.begin_turn().expect("turn accepted");

        assert_eq!(conversation.draft(), "");
        assert_eq!(conversation.cursor(), 0);
        assert!(conversation.is_busy());
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0].role, Role::User);
        assert_eq!(payload[0].content, "Olá");
    }

    #[test]
    fn payload_carries_full_history_in_order() {
        let mut conversation = submitted("first");
        conversation.resolve_turn(Ok(Some("reply".to_string())));

        conversation.set_draft("second");
        let payload = conversation.begin_turn().expect("turn accepted");

        let contents: Vec<&str> = payload.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "reply", "second"]);
        assert_eq!(payload[0].role, Role::User);
        assert_eq!(payload[1].role, Role::Assistant);
        assert_eq!(payload[2].role, Role::User);
    }

    #[test]
    fn submit_while_busy_is_ignored() {
        let mut conversation = submitted("first");
        conversation.set_draft("second");

        assert!(conversation.begin_turn().is_none());
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(conversation.draft(), "second");
    }

    #[test]
    fn successful_turn_appends_reply() {
        let mut conversation = submitted("hi");
        conversation.resolve_turn(Ok(Some("Hello".to_string())));

        assert!(!conversation.is_busy());
        assert_eq!(conversation.messages().len(), 2);
        let reply = conversation.messages().last().unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Hello");
    }

    #[test]
    fn missing_reply_appends_generation_placeholder() {
        let mut conversation = submitted("hi");
        conversation.resolve_turn(Ok(None));

        assert!(!conversation.is_busy());
        assert_eq!(conversation.messages().len(), 2);
        assert_eq!(
            conversation.messages().last().unwrap().content,
            "Erro ao gerar resposta."
        );
    }

    #[test]
    fn transport_failure_appends_communication_placeholder() {
        let mut conversation = submitted("hi");
        conversation.resolve_turn(Err(anyhow!("connection refused")));

        assert!(!conversation.is_busy());
        assert_eq!(conversation.messages().len(), 2);
        assert_eq!(
            conversation.messages().last().unwrap().content,
            "Erro na comunicação com a IA."
        );
    }

    #[test]
    fn every_settle_path_grows_list_by_two() {
        let outcomes: Vec<TurnOutcome> = vec![
            Ok(Some("ok".to_string())),
            Ok(None),
            Err(anyhow!("boom")),
        ];

        let mut conversation = Conversation::new();
        for (i, outcome) in outcomes.into_iter().enumerate() {
            let before = conversation.messages().len();
            conversation.set_draft("pergunta");
            assert!(conversation.begin_turn().is_some(), "turn {i} accepted");
            conversation.resolve_turn(outcome);
            assert_eq!(conversation.messages().len(), before + 2, "turn {i}");
            assert!(!conversation.is_busy());
        }
    }

    #[test]
    fn draft_editing_is_utf8_safe() {
        let mut conversation = Conversation::new();
        for c in "ação".chars() {
            conversation.insert_char(c);
        }
        conversation.cursor_left();
        conversation.backspace(); // remove 'ã'
        assert_eq!(conversation.draft(), "aço");

        conversation.cursor_home();
        conversation.delete();
        assert_eq!(conversation.draft(), "ço");

        conversation.cursor_end();
        conversation.insert_char('!');
        assert_eq!(conversation.draft(), "ço!");
    }

    #[test]
    fn roles_serialize_lowercase() {
        let message = Message {
            role: Role::Assistant,
            content: "oi".to_string(),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "oi");
    }
}
