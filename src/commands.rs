//! Command vocabulary and one-shot message classification.
//!
//! Every inbound text is classified exactly once into a tagged
//! [`Interpretation`] — a recognized command (with an optional trailing
//! argument) or free text — before any state transition happens.

/// Fixed slash-command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Registration,
    Cancel,
    Start,
    Add,
    Done,
    Delete,
    Tasks,
}

/// Keyboard button labels, each a synonym for a slash command.
const BUTTON_LABELS: &[(&str, Command)] = &[
    ("Add", Command::Add),
    ("My tasks", Command::Tasks),
    ("Complete", Command::Done),
    ("Delete", Command::Delete),
];

impl Command {
    /// Match a single token against the slash-command vocabulary.
    /// Strips an `@botname` suffix (e.g. "/help@tally_bot" → "/help").
    fn from_token(token: &str) -> Option<Self> {
        let cmd = token.split('@').next().unwrap_or(token);
        match cmd {
            "/help" => Some(Self::Help),
            "/registration" => Some(Self::Registration),
            "/cancel" => Some(Self::Cancel),
            "/start" => Some(Self::Start),
            "/add" => Some(Self::Add),
            "/done" => Some(Self::Done),
            "/delete" => Some(Self::Delete),
            "/tasks" => Some(Self::Tasks),
            _ => None,
        }
    }
}

/// How a piece of inbound text is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpretation<'a> {
    /// A recognized command, possibly carrying an argument after the first
    /// space (`/add Buy milk`). Button labels classify as their command,
    /// always argument-free.
    Command {
        command: Command,
        arg: Option<&'a str>,
    },
    /// Anything else. In an Awaiting state this is the continuation payload;
    /// in Idle it is noise.
    FreeText(&'a str),
}

/// Classify inbound text. Evaluated once per event.
pub fn classify(text: &str) -> Interpretation<'_> {
    // Button labels match on the entire text, exactly.
    for (label, command) in BUTTON_LABELS {
        if text == *label {
            return Interpretation::Command {
                command: *command,
                arg: None,
            };
        }
    }

    // Slash commands match on the first whitespace-separated token; the
    // rest of the line is the argument.
    let mut parts = text.splitn(2, ' ');
    if let Some(first) = parts.next() {
        if let Some(command) = Command::from_token(first) {
            let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());
            return Interpretation::Command { command, arg };
        }
    }

    Interpretation::FreeText(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_all_commands() {
        let cases = [
            ("/help", Command::Help),
            ("/registration", Command::Registration),
            ("/cancel", Command::Cancel),
            ("/start", Command::Start),
            ("/add", Command::Add),
            ("/done", Command::Done),
            ("/delete", Command::Delete),
            ("/tasks", Command::Tasks),
        ];
        for (text, expected) in cases {
            assert_eq!(
                classify(text),
                Interpretation::Command {
                    command: expected,
                    arg: None
                },
                "classifying {text}"
            );
        }
    }

    #[test]
    fn test_classify_command_with_argument() {
        assert_eq!(
            classify("/add Buy milk"),
            Interpretation::Command {
                command: Command::Add,
                arg: Some("Buy milk")
            }
        );
        assert_eq!(
            classify("/done 0"),
            Interpretation::Command {
                command: Command::Done,
                arg: Some("0")
            }
        );
    }

    #[test]
    fn test_classify_trailing_spaces_count_as_no_argument() {
        assert_eq!(
            classify("/add "),
            Interpretation::Command {
                command: Command::Add,
                arg: None
            }
        );
    }

    #[test]
    fn test_classify_botname_suffix() {
        assert_eq!(
            classify("/tasks@tally_bot"),
            Interpretation::Command {
                command: Command::Tasks,
                arg: None
            }
        );
        assert!(matches!(
            classify("/unknown@tally_bot"),
            Interpretation::FreeText(_)
        ));
    }

    #[test]
    fn test_classify_button_labels() {
        let cases = [
            ("Add", Command::Add),
            ("My tasks", Command::Tasks),
            ("Complete", Command::Done),
            ("Delete", Command::Delete),
        ];
        for (label, expected) in cases {
            assert_eq!(
                classify(label),
                Interpretation::Command {
                    command: expected,
                    arg: None
                },
                "classifying button {label}"
            );
        }
    }

    #[test]
    fn test_classify_button_labels_match_whole_text_only() {
        // "Add something" is not the Add button -- free text.
        assert!(matches!(
            classify("Add something"),
            Interpretation::FreeText(_)
        ));
        assert!(matches!(classify("my tasks"), Interpretation::FreeText(_)));
    }

    #[test]
    fn test_classify_free_text() {
        assert_eq!(classify("Buy milk"), Interpretation::FreeText("Buy milk"));
        assert_eq!(classify("/frobnicate"), Interpretation::FreeText("/frobnicate"));
        assert_eq!(classify(""), Interpretation::FreeText(""));
    }
}
