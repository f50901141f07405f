//! FTP reply parsing
//!
//! Turns decoded control-channel text into structured `Reply` values.
//! Completion follows RFC 959: `ddd-text` opens a multi-line reply which only
//! a line `ddd text` carrying the same code terminates. A reply that is not
//! yet terminated keeps the parser waiting for more text.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// `<3 digits>` optionally followed by a space or dash and the message text.
static STATUS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{3})(?:([ -])(.*))?$").expect("status line pattern is valid")
});

/// Reply class derived from the first digit of the status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Preliminary,
    Completion,
    Intermediate,
    TransientNegative,
    PermanentNegative,
    None,
}

impl StatusClass {
    /// Maps a status code to its class; anything outside 100..=599 is `None`.
    pub fn from_code(code: u16) -> Self {
        match code / 100 {
            1 => StatusClass::Preliminary,
            2 => StatusClass::Completion,
            3 => StatusClass::Intermediate,
            4 => StatusClass::TransientNegative,
            5 => StatusClass::PermanentNegative,
            _ => StatusClass::None,
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(
            self,
            StatusClass::Preliminary | StatusClass::Completion | StatusClass::Intermediate
        )
    }
}

/// A complete server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: Option<u16>,
    class: StatusClass,
    message: String,
    lines: Vec<String>,
}

impl Reply {
    pub fn new(code: u16, message: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            code: Some(code),
            class: StatusClass::from_code(code),
            message: message.into(),
            lines,
        }
    }

    /// Sentinel for exchanges that never produced a status line.
    pub fn failed() -> Self {
        Self::without_status(Vec::new())
    }

    fn without_status(lines: Vec<String>) -> Self {
        Self {
            code: None,
            class: StatusClass::None,
            message: String::new(),
            lines,
        }
    }

    /// Parses one reply out of `text`. Text without any status line yields a
    /// reply of class `None` whose lines hold the text.
    pub fn parse(text: &str) -> Self {
        let mut parser = ReplyParser::new();
        match parser.feed(text) {
            Some(reply) => reply,
            None => parser.finish(),
        }
    }

    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// The code as its three-digit text form.
    pub fn status_code(&self) -> Option<String> {
        self.code.map(|code| format!("{:03}", code))
    }

    pub fn class(&self) -> StatusClass {
        self.class
    }

    /// Text of the terminating status line.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Every other line of the reply, in arrival order.
    pub fn message_lines(&self) -> &[String] {
        &self.lines
    }

    /// The path in a `257 "<path>" ...` reply, with doubled quotes undone.
    pub fn quoted_path(&self) -> Option<String> {
        let start = self.message.find('"')? + 1;
        let mut chars = self.message[start..].chars().peekable();
        let mut path = String::new();

        while let Some(c) = chars.next() {
            if c != '"' {
                path.push(c);
            } else if chars.peek() == Some(&'"') {
                chars.next();
                path.push('"');
            } else {
                return Some(path);
            }
        }
        None
    }

    pub fn is_success(&self) -> bool {
        self.class.is_positive()
    }

    /// True for the sentinel and for text that carried no status line.
    pub fn is_transport_failure(&self) -> bool {
        self.code.is_none()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{:03} {}", code, self.message),
            None => write!(f, "<no reply>"),
        }
    }
}

/// Incremental reply parser for one control connection.
///
/// Text is fed as it arrives. Whatever follows the terminating line of a
/// reply stays buffered and starts the next reply.
#[derive(Debug, Default)]
pub struct ReplyParser {
    backlog: String,
    open_code: Option<u16>,
    lines: Vec<String>,
}

impl ReplyParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when buffered text or collected lines are waiting.
    pub fn has_pending(&self) -> bool {
        !self.backlog.is_empty() || !self.lines.is_empty()
    }

    /// Appends `text` and returns the first reply completed by it, if any.
    pub fn feed(&mut self, text: &str) -> Option<Reply> {
        self.backlog.push_str(text);

        while let Some(end) = self.backlog.find('\n') {
            let raw: String = self.backlog.drain(..=end).collect();
            let line = raw.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }
            if let Some(reply) = self.accept_line(line) {
                return Some(reply);
            }
        }

        None
    }

    /// Flushes an unterminated last line and returns the reply, or a reply
    /// without status holding the collected lines. Resets the parser.
    pub fn finish(&mut self) -> Reply {
        if !self.backlog.is_empty() {
            self.backlog.push('\n');
            if let Some(reply) = self.feed("") {
                self.backlog.clear();
                return reply;
            }
        }

        self.open_code = None;
        Reply::without_status(std::mem::take(&mut self.lines))
    }

    /// Drops all buffered state.
    pub fn reset(&mut self) {
        self.backlog.clear();
        self.open_code = None;
        self.lines.clear();
    }

    fn accept_line(&mut self, line: &str) -> Option<Reply> {
        let Some(caps) = STATUS_LINE.captures(line) else {
            self.lines.push(line.to_string());
            return None;
        };

        // Three ASCII digits always fit.
        let code: u16 = caps[1].parse().unwrap_or_default();
        let continued = caps.get(2).is_some_and(|sep| sep.as_str() == "-");
        let text = caps.get(3).map_or("", |m| m.as_str());

        match self.open_code {
            None if continued => {
                self.open_code = Some(code);
                self.lines.push(text.to_string());
                None
            }
            Some(open) if continued || open != code => {
                if open == code {
                    self.lines.push(text.to_string());
                } else {
                    self.lines.push(line.to_string());
                }
                None
            }
            _ => {
                self.open_code = None;
                Some(Reply::new(code, text, std::mem::take(&mut self.lines)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_reply() {
        let reply = Reply::parse("230 User logged in, proceed\r\n");
        assert_eq!(reply.code(), Some(230));
        assert_eq!(reply.status_code().as_deref(), Some("230"));
        assert_eq!(reply.message(), "User logged in, proceed");
        assert_eq!(reply.class(), StatusClass::Completion);
        assert!(reply.is_success());
        assert!(reply.message_lines().is_empty());
    }

    #[test]
    fn test_class_mapping() {
        let cases = [
            ("150 ok", StatusClass::Preliminary, true),
            ("257 ok", StatusClass::Completion, true),
            ("331 ok", StatusClass::Intermediate, true),
            ("421 no", StatusClass::TransientNegative, false),
            ("550 no", StatusClass::PermanentNegative, false),
            ("650 odd", StatusClass::None, false),
            ("050 odd", StatusClass::None, false),
        ];
        for (text, class, success) in cases {
            let reply = Reply::parse(text);
            assert_eq!(reply.class(), class, "{}", text);
            assert_eq!(reply.is_success(), success, "{}", text);
        }
    }

    #[test]
    fn test_text_without_status_is_failure() {
        let reply = Reply::parse("hello\r\nworld\r\n");
        assert_eq!(reply.code(), None);
        assert_eq!(reply.class(), StatusClass::None);
        assert!(!reply.is_success());
        assert_eq!(reply.message_lines(), ["hello", "world"]);
    }

    #[test]
    fn test_free_text_before_status_is_collected() {
        let reply = Reply::parse("drwxr-xr-x dir\n\n226 Transfer complete\n");
        assert_eq!(reply.code(), Some(226));
        assert_eq!(reply.message_lines(), ["drwxr-xr-x dir"]);
    }

    #[test]
    fn test_multi_line_feat_reply() {
        let reply = Reply::parse("211-Features:\r\n MLSD\r\n PRET\r\n211 End\r\n");
        assert_eq!(reply.code(), Some(211));
        assert_eq!(reply.message(), "End");
        assert_eq!(reply.message_lines(), ["Features:", " MLSD", " PRET"]);
    }

    #[test]
    fn test_dash_line_is_not_final() {
        let mut parser = ReplyParser::new();
        assert!(parser.feed("150-Opening data connection\r\n").is_none());
        assert!(parser.feed("226 inner line with other code\r\n").is_none());
        let reply = parser.feed("150 Here it comes\r\n").unwrap();
        assert_eq!(reply.code(), Some(150));
        assert_eq!(
            reply.message_lines(),
            ["Opening data connection", "226 inner line with other code"]
        );
    }

    #[test]
    fn test_reply_split_across_chunks() {
        let mut parser = ReplyParser::new();
        assert!(parser.feed("22").is_none());
        assert!(parser.feed("0 Service ").is_none());
        let reply = parser.feed("ready\r\n").unwrap();
        assert_eq!(reply.code(), Some(220));
        assert_eq!(reply.message(), "Service ready");
    }

    #[test]
    fn test_following_reply_stays_buffered() {
        let mut parser = ReplyParser::new();
        let first = parser.feed("150 Opening\r\n226 Done\r\n").unwrap();
        assert_eq!(first.code(), Some(150));
        assert!(parser.has_pending());
        let second = parser.feed("").unwrap();
        assert_eq!(second.code(), Some(226));
        assert!(!parser.has_pending());
    }

    #[test]
    fn test_finish_accepts_unterminated_status_line() {
        let mut parser = ReplyParser::new();
        assert!(parser.feed("200 OK").is_none());
        let reply = parser.finish();
        assert_eq!(reply.code(), Some(200));
    }

    #[test]
    fn test_bare_code_is_final() {
        let reply = Reply::parse("220\r\n");
        assert_eq!(reply.code(), Some(220));
        assert_eq!(reply.message(), "");
    }

    #[test]
    fn test_quoted_path() {
        let reply = Reply::parse("257 \"/home/al\"\"ice\" is the current directory\r\n");
        assert_eq!(reply.quoted_path().as_deref(), Some("/home/al\"ice"));
        assert_eq!(Reply::parse("257 \"/\"\r\n").quoted_path().as_deref(), Some("/"));
        assert_eq!(Reply::parse("257 no quotes here\r\n").quoted_path(), None);
        assert_eq!(Reply::parse("257 \"unterminated\r\n").quoted_path(), None);
    }

    #[test]
    fn test_failed_sentinel() {
        let reply = Reply::failed();
        assert!(reply.is_transport_failure());
        assert!(!reply.is_success());
        assert_eq!(reply.to_string(), "<no reply>");
    }
}
