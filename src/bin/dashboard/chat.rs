use super::*;

pub(crate) const TYPING_PLACEHOLDER: &str = "Oshi is typing…";
pub(crate) const SEND_FAILED_APOLOGY: &str =
    "Sorry, I couldn't reach the brain right now. Try again in a bit.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChatRole {
    User,
    Assistant,
    Typing,
}

#[derive(Debug, Clone)]
pub(crate) struct ChatEntry {
    pub(crate) role: ChatRole,
    pub(crate) text: String,
}

/// Chat pane state machine: closed or open, an input line, and an
/// append-only transcript. A send appends the user entry and a typing
/// placeholder immediately; the network completion later resolves that
/// placeholder in place to either the reply or the fixed apology, exactly
/// once. Entries are never removed, so placeholder indices stay stable.
#[derive(Debug, Default)]
pub(crate) struct ChatWidget {
    open: bool,
    input: String,
    transcript: Vec<ChatEntry>,
}

impl ChatWidget {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open
    }

    /// Flips the pane. Opening leaves whatever was typed last time in the
    /// input line, focused and ready to edit.
    pub(crate) fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    pub(crate) fn input_char(&mut self, c: char) {
        if !c.is_control() {
            self.input.push(c);
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.input.pop();
    }

    pub(crate) fn entries(&self) -> &[ChatEntry] {
        &self.transcript
    }

    /// Takes the current input and stages a send. Whitespace-only input is a
    /// no-op: nothing is appended and no request should be issued. Otherwise
    /// returns the placeholder index to resolve plus the message to post.
    pub(crate) fn submit(&mut self) -> Option<(usize, String)> {
        let message = sanitize(self.input.trim());
        if message.is_empty() {
            return None;
        }
        self.input.clear();

        self.transcript.push(ChatEntry {
            role: ChatRole::User,
            text: message.clone(),
        });
        self.transcript.push(ChatEntry {
            role: ChatRole::Typing,
            text: TYPING_PLACEHOLDER.to_string(),
        });
        Some((self.transcript.len() - 1, message))
    }

    /// Resolves a pending placeholder with the assistant reply. Ignored if
    /// the slot was already resolved; a send never yields two terminal
    /// entries.
    pub(crate) fn resolve(&mut self, index: usize, reply: &str) {
        self.finish(index, sanitize(reply));
    }

    pub(crate) fn fail(&mut self, index: usize) {
        self.finish(index, SEND_FAILED_APOLOGY.to_string());
    }

    fn finish(&mut self, index: usize, text: String) {
        if let Some(entry) = self.transcript.get_mut(index) {
            if entry.role == ChatRole::Typing {
                entry.role = ChatRole::Assistant;
                entry.text = text;
            }
        }
    }
}

/// Strips ANSI escape sequences and control characters so neither user
/// input nor a server reply can smuggle cursor moves or restyling into the
/// terminal.
pub(crate) fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            if chars.peek() == Some(&'[') {
                chars.next();
                while let Some(&n) = chars.peek() {
                    chars.next();
                    if n.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            continue;
        }
        if c.is_control() && c != '\n' {
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_open_state() {
        let mut chat = ChatWidget::new();
        assert!(!chat.is_open());
        chat.toggle();
        assert!(chat.is_open());
        chat.toggle();
        assert!(!chat.is_open());
    }

    #[test]
    fn whitespace_send_is_a_no_op() {
        let mut chat = ChatWidget::new();
        for junk in ["", "   ", "\t", " \n "] {
            chat.input.clear();
            chat.input.push_str(junk);
            assert!(chat.submit().is_none());
            assert!(chat.entries().is_empty());
        }
    }

    #[test]
    fn send_appends_user_entry_and_placeholder_then_reply() {
        let mut chat = ChatWidget::new();
        for c in "how's the streak?".chars() {
            chat.input_char(c);
        }
        let (index, message) = chat.submit().unwrap();
        assert_eq!(message, "how's the streak?");
        assert!(chat.input().is_empty());
        assert_eq!(chat.entries().len(), 2);
        assert_eq!(chat.entries()[0].role, ChatRole::User);
        assert_eq!(chat.entries()[1].role, ChatRole::Typing);

        chat.resolve(index, "three in a row!");
        assert_eq!(chat.entries().len(), 2);
        assert_eq!(chat.entries()[1].role, ChatRole::Assistant);
        assert_eq!(chat.entries()[1].text, "three in a row!");
    }

    #[test]
    fn failure_resolves_to_the_apology_exactly_once() {
        let mut chat = ChatWidget::new();
        chat.input.push_str("anyone home?");
        let (index, _) = chat.submit().unwrap();

        chat.fail(index);
        assert_eq!(chat.entries()[1].text, SEND_FAILED_APOLOGY);

        // A late duplicate completion must not overwrite the terminal entry.
        chat.resolve(index, "late reply");
        assert_eq!(chat.entries()[1].text, SEND_FAILED_APOLOGY);
        assert_eq!(chat.entries().len(), 2);
    }

    #[test]
    fn concurrent_sends_keep_their_own_placeholders() {
        let mut chat = ChatWidget::new();
        chat.input.push_str("first");
        let (first, _) = chat.submit().unwrap();
        chat.input.push_str("second");
        let (second, _) = chat.submit().unwrap();

        // Out-of-order completion.
        chat.resolve(second, "reply two");
        chat.fail(first);

        assert_eq!(chat.entries()[first].text, SEND_FAILED_APOLOGY);
        assert_eq!(chat.entries()[second].text, "reply two");
        assert_eq!(chat.entries().len(), 4);
    }

    #[test]
    fn sanitize_strips_escapes_and_controls() {
        assert_eq!(sanitize("plain text"), "plain text");
        assert_eq!(sanitize("red \u{1b}[31malert\u{1b}[0m"), "red alert");
        assert_eq!(sanitize("bell\u{7}ring"), "bellring");
        assert_eq!(sanitize("line\nbreak"), "line\nbreak");
        // A bare escape with no CSI introducer just disappears.
        assert_eq!(sanitize("x\u{1b}y"), "xy");
    }

    #[test]
    fn input_rejects_control_characters() {
        let mut chat = ChatWidget::new();
        chat.input_char('h');
        chat.input_char('\u{1b}');
        chat.input_char('i');
        assert_eq!(chat.input(), "hi");
        chat.backspace();
        assert_eq!(chat.input(), "h");
    }
}
