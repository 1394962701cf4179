//! Rule block scanning
//!
//! Splits rule-file text into rule blocks. The scanner is a line-driven
//! state machine with three states:
//!
//! - `Idle`: between rules and comments
//! - `InComment`: inside a `/* ... */` block (documentation comments open with `/*@`)
//! - `InRule`: collecting the lines of a rule
//!
//! Comment capture and rule capture never overlap: opening a documentation
//! comment flushes the rule being collected, and plain comments inside a rule
//! are blanked out of its text. A documentation comment attaches to the next
//! rule only, and any other comment in between clears it.

/// Opening marker of a documentation comment
pub const DOC_COMMENT_OPEN: &str = "/*@";

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    InComment {
        /// Documentation comments are kept, plain block comments are skipped
        doc: bool,
        /// Open `/*` minus closed `*/` so far
        depth: usize,
        /// Return to `InRule` when the comment closes
        in_rule: bool,
    },
    InRule,
}

/// What a single line means to the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Blank,
    DocCommentOpen,
    CommentOpen,
    /// A line starting with `//`
    LineComment,
    RuleStart,
    /// A line holding only `[attr, ...]`
    AttributeList,
    ModuleStart,
    EndModule,
    /// `syntax`, `context`, `imports`, `configuration` or `require`
    Declaration,
    Other,
}

/// What the scanner does on a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Nothing,
    BeginComment,
    AppendComment,
    BeginRule,
    AppendRule,
    /// Keep the rule's line numbering without its text
    BlankRuleLine,
    /// Forget the pending documentation comment
    DropPending,
    /// Append the line, then emit the rule
    CloseRule,
    /// Emit the rule without the line
    FlushRule,
    FlushThenBeginComment,
    FlushThenBeginRule,
}

/// A raw rule with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBlock {
    pub text: String,
    /// 1-based line of the `rule` keyword
    pub line_start: usize,
    /// 1-based last non-blank line of the rule
    pub line_end: usize,
    /// Documentation comment directly before the rule
    pub comment: Option<String>,
    /// Module the rule appears in
    pub module: Option<String>,
}

/// Classify a line by its trimmed text
pub fn classify_line(line: &str) -> LineClass {
    let t = line.trim();
    if t.is_empty() {
        LineClass::Blank
    } else if t.starts_with(DOC_COMMENT_OPEN) {
        LineClass::DocCommentOpen
    } else if t.starts_with("/*") {
        LineClass::CommentOpen
    } else if t.starts_with("//") {
        LineClass::LineComment
    } else if is_rule_start(t) {
        LineClass::RuleStart
    } else if t.starts_with('[') && t.ends_with(']') {
        LineClass::AttributeList
    } else if t.starts_with("endmodule") {
        LineClass::EndModule
    } else if keyword_head(t, "module") {
        LineClass::ModuleStart
    } else if ["syntax", "context", "imports", "configuration", "require"]
        .iter()
        .any(|kw| keyword_head(t, kw))
    {
        LineClass::Declaration
    } else {
        LineClass::Other
    }
}

fn is_rule_start(trimmed: &str) -> bool {
    match trimmed.strip_prefix("rule") {
        Some(rest) => {
            rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == '(' || c == '[')
        }
        None => false,
    }
}

fn keyword_head(trimmed: &str, kw: &str) -> bool {
    trimmed
        .strip_prefix(kw)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Module name declared by a `module NAME` line
pub fn module_name(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("module")?;
    let name = rest.split_whitespace().next()?;
    let valid = name
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-');
    (valid && !name.is_empty()).then_some(name)
}

/// The line up to a `//` comment that is outside string literals
pub fn strip_line_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return line[..i].trim_end(),
            _ => {}
        }
        i += 1;
    }
    line
}

/// Net comment depth change on a line
fn depth_delta(line: &str) -> isize {
    line.matches("/*").count() as isize - line.matches("*/").count() as isize
}

/// The transition table
fn transition(state: ScanState, class: LineClass) -> (ScanState, Action) {
    use LineClass as L;
    use ScanState as S;

    match (state, class) {
        (S::InComment { doc, depth, in_rule }, _) => {
            (S::InComment { doc, depth, in_rule }, Action::AppendComment)
        }

        (S::Idle, L::DocCommentOpen) => {
            (S::InComment { doc: true, depth: 0, in_rule: false }, Action::BeginComment)
        }
        (S::Idle, L::CommentOpen) => {
            (S::InComment { doc: false, depth: 0, in_rule: false }, Action::BeginComment)
        }
        (S::Idle, L::LineComment) => (S::Idle, Action::DropPending),
        (S::Idle, L::RuleStart) => (S::InRule, Action::BeginRule),
        (S::Idle, _) => (S::Idle, Action::Nothing),

        (S::InRule, L::DocCommentOpen) => {
            (S::InComment { doc: true, depth: 0, in_rule: false }, Action::FlushThenBeginComment)
        }
        (S::InRule, L::CommentOpen) => {
            (S::InComment { doc: false, depth: 0, in_rule: true }, Action::BeginComment)
        }
        (S::InRule, L::LineComment) => (S::InRule, Action::BlankRuleLine),
        (S::InRule, L::RuleStart) => (S::InRule, Action::FlushThenBeginRule),
        (S::InRule, L::AttributeList) => (S::Idle, Action::CloseRule),
        (S::InRule, L::EndModule | L::ModuleStart | L::Declaration) => (S::Idle, Action::FlushRule),
        (S::InRule, _) => (S::InRule, Action::AppendRule),
    }
}

/// Line-driven rule block scanner
pub struct BlockScanner {
    state: ScanState,
    blocks: Vec<RuleBlock>,
    module: Option<String>,
    pending_comment: Option<String>,
    comment_lines: Vec<String>,
    rule_lines: Vec<String>,
    rule_start: usize,
    rule_last_content: usize,
    rule_comment: Option<String>,
}

impl BlockScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Idle,
            blocks: Vec::new(),
            module: None,
            pending_comment: None,
            comment_lines: Vec::new(),
            rule_lines: Vec::new(),
            rule_start: 0,
            rule_last_content: 0,
            rule_comment: None,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Feed one line (1-based line number)
    pub fn feed(&mut self, line_no: usize, line: &str) {
        let class = classify_line(line);
        let (next, action) = transition(self.state, class);

        match action {
            Action::Nothing => {
                if class == LineClass::ModuleStart {
                    self.module = module_name(line).map(str::to_string);
                }
            }
            Action::BeginComment => self.begin_comment(next, line),
            Action::AppendComment => {
                self.state = next;
                self.append_comment(line);
                return;
            }
            Action::BeginRule => self.begin_rule(line_no, line),
            Action::AppendRule => self.append_rule(line_no, line),
            Action::BlankRuleLine => self.rule_lines.push(String::new()),
            Action::DropPending => self.pending_comment = None,
            Action::CloseRule => {
                self.append_rule(line_no, line);
                self.flush_rule();
            }
            Action::FlushRule => {
                self.flush_rule();
                if class == LineClass::ModuleStart {
                    self.module = module_name(line).map(str::to_string);
                }
            }
            Action::FlushThenBeginComment => {
                self.flush_rule();
                self.begin_comment(next, line);
                return;
            }
            Action::FlushThenBeginRule => {
                self.flush_rule();
                self.begin_rule(line_no, line);
            }
        }

        if !matches!(action, Action::BeginComment) {
            self.state = next;
        }
    }

    /// Flush any trailing rule and return the blocks
    pub fn finish(mut self) -> Vec<RuleBlock> {
        if matches!(self.state, ScanState::InRule | ScanState::InComment { in_rule: true, .. }) {
            self.flush_rule();
        }
        self.blocks
    }

    fn begin_comment(&mut self, next: ScanState, line: &str) {
        let ScanState::InComment { doc, in_rule, .. } = next else {
            return;
        };
        if !doc {
            self.pending_comment = None;
        }
        self.comment_lines.clear();
        self.state = ScanState::InComment { doc, depth: 0, in_rule };
        self.append_comment(line);
    }

    fn append_comment(&mut self, line: &str) {
        let ScanState::InComment { doc, depth, in_rule } = self.state else {
            return;
        };
        if doc {
            self.comment_lines.push(line.to_string());
        }
        if in_rule {
            self.rule_lines.push(String::new());
        }
        let depth = (depth as isize + depth_delta(line)).max(0) as usize;
        if depth == 0 {
            if doc {
                self.pending_comment = Some(self.comment_lines.join("\n"));
            }
            self.comment_lines.clear();
            self.state = if in_rule { ScanState::InRule } else { ScanState::Idle };
        } else {
            self.state = ScanState::InComment { doc, depth, in_rule };
        }
    }

    fn begin_rule(&mut self, line_no: usize, line: &str) {
        self.rule_lines.clear();
        self.rule_lines.push(strip_line_comment(line).to_string());
        self.rule_start = line_no;
        self.rule_last_content = line_no;
        self.rule_comment = self.pending_comment.take();
    }

    fn append_rule(&mut self, line_no: usize, line: &str) {
        let line = strip_line_comment(line);
        self.rule_lines.push(line.to_string());
        if !line.trim().is_empty() {
            self.rule_last_content = line_no;
        }
    }

    fn flush_rule(&mut self) {
        if self.rule_lines.is_empty() {
            return;
        }
        let keep = self.rule_last_content - self.rule_start + 1;
        self.rule_lines.truncate(keep);
        self.blocks.push(RuleBlock {
            text: self.rule_lines.join("\n"),
            line_start: self.rule_start,
            line_end: self.rule_last_content,
            comment: self.rule_comment.take(),
            module: self.module.clone(),
        });
        self.rule_lines.clear();
    }
}

impl Default for BlockScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Split rule-file text into rule blocks
pub fn scan_rule_blocks(source: &str) -> Vec<RuleBlock> {
    let mut scanner = BlockScanner::new();
    for (idx, line) in source.lines().enumerate() {
        scanner.feed(idx + 1, line);
    }
    scanner.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_lines() {
        assert_eq!(classify_line("   "), LineClass::Blank);
        assert_eq!(classify_line("  /*@ doc"), LineClass::DocCommentOpen);
        assert_eq!(classify_line("/* plain */"), LineClass::CommentOpen);
        assert_eq!(classify_line("  rule foo => bar"), LineClass::RuleStart);
        assert_eq!(classify_line("rule(X) => Y"), LineClass::RuleStart);
        assert_eq!(classify_line("rule [label]: X => Y"), LineClass::RuleStart);
        assert_eq!(classify_line("rules are fun"), LineClass::Other);
        assert_eq!(classify_line("  [structural]"), LineClass::AttributeList);
        assert_eq!(classify_line("endmodule"), LineClass::EndModule);
        assert_eq!(classify_line("module LIBC-STDLIB"), LineClass::ModuleStart);
        assert_eq!(classify_line("  syntax KItem ::= foo(K)"), LineClass::Declaration);
    }

    #[test]
    fn test_module_name() {
        assert_eq!(module_name("module C-COMMON-EXPR-MULTIPLICATIVE"), Some("C-COMMON-EXPR-MULTIPLICATIVE"));
        assert_eq!(module_name("module lower"), None);
        assert_eq!(module_name("modules"), None);
    }

    #[test]
    fn test_single_rule_with_attributes() {
        let src = "module M\n  rule foo(X) => X\n    requires X >Int 0\n  [structural]\nendmodule\n";
        let blocks = scan_rule_blocks(src);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].line_start, 2);
        assert_eq!(blocks[0].line_end, 4);
        assert!(blocks[0].text.contains("requires"));
        assert!(blocks[0].text.trim_end().ends_with("[structural]"));
        assert_eq!(blocks[0].module.as_deref(), Some("M"));
    }

    #[test]
    fn test_comment_attaches_to_next_rule_only() {
        let src = "/*@ first\n  more */\nrule a(X) => X\nrule b(X) => X\n";
        let blocks = scan_rule_blocks(src);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].comment.as_deref(), Some("/*@ first\n  more */"));
        assert_eq!(blocks[1].comment, None);
    }

    #[test]
    fn test_doc_comment_flushes_rule() {
        let src = "rule a(X) => X\n/*@ doc for b */\nrule b(X) => X\n";
        let blocks = scan_rule_blocks(src);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "rule a(X) => X");
        assert_eq!(blocks[0].comment, None);
        assert_eq!(blocks[1].comment.as_deref(), Some("/*@ doc for b */"));
    }

    #[test]
    fn test_trailing_rule_flushed_at_eof() {
        let blocks = scan_rule_blocks("rule a(X)\n  => X\n\n\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].line_end, 2);
        assert_eq!(blocks[0].text, "rule a(X)\n  => X");
    }

    #[test]
    fn test_nested_comment_depth() {
        let src = "/*@ outer /* inner */\n still comment\n rule not_a_rule => x\n*/\nrule real(X) => X\n";
        let blocks = scan_rule_blocks(src);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].text.starts_with("rule real"));
        assert!(blocks[0].comment.as_deref().is_some_and(|c| c.contains("not_a_rule")));
    }

    #[test]
    fn test_plain_comment_clears_pending_doc() {
        let src = "/*@ doc */\n/* rule hidden => x */\nrule shown(X) => X\n";
        let blocks = scan_rule_blocks(src);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].text.starts_with("rule shown"));
        assert_eq!(blocks[0].comment, None);

        let blocks = scan_rule_blocks("/*@ doc */\n// unrelated\nrule shown(X) => X\n");
        assert_eq!(blocks[0].comment, None);
    }

    #[test]
    fn test_comments_after_inline_attributes_stay_out_of_rule() {
        let src = "module LIBC-STRING\n  rule strlen(S) => lengthString(S) [structural]\n  \
                   // note: this requires nothing special\n  /* nor does\n     this requires anything */\n  \
                   rule strcpy(D, S) => D\nendmodule\n";
        let blocks = scan_rule_blocks(src);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "  rule strlen(S) => lengthString(S) [structural]");
        assert_eq!(blocks[0].line_end, 2);
        assert!(!blocks[1].text.contains("requires"));
        assert_eq!(blocks[1].line_start, 6);
    }

    #[test]
    fn test_comment_inside_rule_is_blanked() {
        let src = "rule a(X) => X // trailing requires\n  // whole line\n  /* block */\n  requires X >Int 0\n";
        let blocks = scan_rule_blocks(src);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "rule a(X) => X\n\n\n  requires X >Int 0");
        assert_eq!(blocks[0].line_end, 4);
    }

    #[test]
    fn test_strip_line_comment() {
        assert_eq!(strip_line_comment("f(X) // note"), "f(X)");
        assert_eq!(strip_line_comment(r#"g("http://x") => y"#), r#"g("http://x") => y"#);
        assert_eq!(strip_line_comment(r#"h("a\"//") // c"#), r#"h("a\"//")"#);
    }

    #[test]
    fn test_declaration_ends_rule() {
        let src = "rule a(X) => X\nsyntax KItem ::= b(K)\nrule b(X) => X\n";
        let blocks = scan_rule_blocks(src);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "rule a(X) => X");
    }

    #[test]
    fn test_scanner_returns_to_idle() {
        let mut scanner = BlockScanner::new();
        scanner.feed(1, "rule a => b");
        assert_eq!(scanner.state(), ScanState::InRule);
        scanner.feed(2, "[structural]");
        assert_eq!(scanner.state(), ScanState::Idle);
        scanner.feed(3, "/*@ open");
        assert!(matches!(scanner.state(), ScanState::InComment { doc: true, .. }));
        scanner.feed(4, "*/");
        assert_eq!(scanner.state(), ScanState::Idle);
    }
}
