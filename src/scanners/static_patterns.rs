//! Lexical scan of source files for dangerous API uses.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::paths;
use crate::types::{Finding, ScannerKind, ScannerResult, Severity};

use super::{ScanContext, evidence_snippet, read_text_sample, walk_artifact};

struct PatternRule {
    regex: &'static Lazy<Regex>,
    severity: Severity,
    message: &'static str,
    /// Severity drops to info when the manifest declares a CLI entry point.
    cli_expected: bool,
    /// Matches inside string literals or comments drop to info.
    check_string_context: bool,
    /// The bare `exec(` rule, suppressed when a more specific exec rule
    /// already matched the line.
    bare_exec: bool,
}

macro_rules! pattern_regex {
    ($name:ident, $pattern:expr) => {
        static $name: Lazy<Regex> =
            Lazy::new(|| Regex::new($pattern).expect("static pattern regex"));
    };
}

pattern_regex!(RE_EVAL, r"\beval\s*\(");
pattern_regex!(RE_NEW_FUNCTION, r"\bnew\s+Function\s*\(");
pattern_regex!(RE_CHILD_PROCESS, r"\bchild_process\b");
pattern_regex!(RE_EXEC_SYNC, r"\bexecSync\s*\(");
pattern_regex!(RE_EXEC_FILE, r"\bexecFile(?:Sync)?\s*\(");
pattern_regex!(RE_SPAWN, r"\bspawn(?:Sync)?\s*\(");
pattern_regex!(RE_BARE_EXEC, r"(?:^|[^.\w])(exec\s*\()");
pattern_regex!(RE_FETCH, r"\bfetch\s*\(");
pattern_regex!(RE_HTTP_REQUEST, r"\bhttps?\.(?:request|get)\s*\(");
pattern_regex!(RE_XHR, r"\bXMLHttpRequest\b");
pattern_regex!(RE_AXIOS, r"\baxios\b");
pattern_regex!(RE_GOT, r"\bgot\s*\(");
pattern_regex!(RE_NODE_FETCH, r#"['"]node-fetch['"]"#);
pattern_regex!(RE_UNDICI, r#"['"]undici['"]"#);
pattern_regex!(RE_DYNAMIC_REQUIRE, r#"\brequire\s*\(\s*[^'"`)\s]"#);
pattern_regex!(RE_PROCESS_ENV, r"\bprocess\.env\b");
pattern_regex!(
    RE_FS_WRITE,
    r"\bfs\.(?:writeFile|writeFileSync|appendFile|appendFileSync|createWriteStream|rm|rmSync|rmdir|rmdirSync|unlink|unlinkSync)\b"
);

static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule {
            regex: &RE_EVAL,
            severity: Severity::Critical,
            message: "eval() executes arbitrary code",
            cli_expected: false,
            check_string_context: true,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_NEW_FUNCTION,
            severity: Severity::Critical,
            message: "new Function() constructs code from strings",
            cli_expected: true,
            check_string_context: true,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_CHILD_PROCESS,
            severity: Severity::Critical,
            message: "references the child_process module",
            cli_expected: true,
            check_string_context: false,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_EXEC_SYNC,
            severity: Severity::Critical,
            message: "execSync() runs shell commands",
            cli_expected: true,
            check_string_context: true,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_EXEC_FILE,
            severity: Severity::Critical,
            message: "execFile() runs external programs",
            cli_expected: true,
            check_string_context: true,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_SPAWN,
            severity: Severity::Critical,
            message: "spawn() starts child processes",
            cli_expected: true,
            check_string_context: true,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_BARE_EXEC,
            severity: Severity::Critical,
            message: "exec() runs shell commands",
            cli_expected: true,
            check_string_context: true,
            bare_exec: true,
        },
        PatternRule {
            regex: &RE_FETCH,
            severity: Severity::Warning,
            message: "fetch() performs network requests",
            cli_expected: true,
            check_string_context: true,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_HTTP_REQUEST,
            severity: Severity::Warning,
            message: "http(s) request call",
            cli_expected: true,
            check_string_context: false,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_XHR,
            severity: Severity::Warning,
            message: "XMLHttpRequest usage",
            cli_expected: false,
            check_string_context: false,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_AXIOS,
            severity: Severity::Warning,
            message: "axios HTTP client usage",
            cli_expected: true,
            check_string_context: false,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_GOT,
            severity: Severity::Warning,
            message: "got() HTTP client call",
            cli_expected: true,
            check_string_context: true,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_NODE_FETCH,
            severity: Severity::Warning,
            message: "node-fetch HTTP client import",
            cli_expected: true,
            check_string_context: false,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_UNDICI,
            severity: Severity::Warning,
            message: "undici HTTP client import",
            cli_expected: true,
            check_string_context: false,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_DYNAMIC_REQUIRE,
            severity: Severity::Warning,
            message: "require() with a non-literal argument",
            cli_expected: true,
            check_string_context: true,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_PROCESS_ENV,
            severity: Severity::Info,
            message: "reads environment variables",
            cli_expected: false,
            check_string_context: false,
            bare_exec: false,
        },
        PatternRule {
            regex: &RE_FS_WRITE,
            severity: Severity::Warning,
            message: "filesystem write or removal",
            cli_expected: true,
            check_string_context: false,
            bare_exec: false,
        },
    ]
});

pub(super) fn scan(context: &ScanContext) -> ScannerResult {
    let is_cli = context
        .manifest
        .as_ref()
        .is_some_and(|manifest| manifest.has_bin);

    let mut findings = Vec::new();
    let mut scanned_any = false;

    for file in walk_artifact(&context.root) {
        if !paths::is_scannable_source(&file.relative) {
            continue;
        }
        let Some((content, _)) = read_text_sample(&file.absolute, context.max_file_bytes) else {
            continue;
        };
        scanned_any = true;
        scan_content(&content, &file.relative, is_cli, &mut findings);
    }

    if !scanned_any && findings.is_empty() {
        return ScannerResult::empty(ScannerKind::Static, "No source files found");
    }

    let summary = summarize(&findings, is_cli);
    ScannerResult::from_findings(ScannerKind::Static, findings, summary)
}

fn scan_content(content: &str, relative: &str, is_cli: bool, findings: &mut Vec<Finding>) {
    let mut in_block_comment = false;

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        let lex = lex_line(line, in_block_comment);
        let has_specific_exec = RE_EXEC_SYNC.is_match(line) || RE_EXEC_FILE.is_match(line);

        for rule in PATTERNS.iter() {
            if rule.bare_exec && has_specific_exec {
                continue;
            }
            let Some(match_start) = locate(rule, line) else {
                continue;
            };

            let mut severity = rule.severity;
            let mut message = rule.message.to_string();
            if rule.check_string_context && lex.is_masked(match_start) {
                severity = Severity::Info;
                message.push_str(" (in string/comment)");
            } else if is_cli && rule.cli_expected {
                severity = Severity::Info;
                message.push_str(" (expected for CLI tool)");
            }

            findings.push(
                Finding::new(ScannerKind::Static, severity, message)
                    .with_location(relative, line_number)
                    .with_evidence(evidence_snippet(line)),
            );
        }

        in_block_comment = lex.ends_in_block_comment;
    }
}

/// Byte offset of the interesting token: the capture group for the bare
/// exec rule (its regex consumes one leading context character), the whole
/// match otherwise.
fn locate(rule: &PatternRule, line: &str) -> Option<usize> {
    if rule.bare_exec {
        let captures = rule.regex.captures(line)?;
        return Some(captures.get(1)?.start());
    }
    Some(rule.regex.find(line)?.start())
}

/// String/comment mask for one line of source.
struct LineLex {
    /// Byte ranges covered by string literals or comments.
    masked: Vec<(usize, usize)>,
    ends_in_block_comment: bool,
}

impl LineLex {
    fn is_masked(&self, index: usize) -> bool {
        self.masked
            .iter()
            .any(|&(start, end)| index >= start && index < end)
    }
}

/// Single-pass lexer tracking quote and comment state. Good enough for
/// the suppression heuristic; not a JavaScript parser.
fn lex_line(line: &str, starts_in_block_comment: bool) -> LineLex {
    #[derive(PartialEq)]
    enum State {
        Code,
        Single,
        Double,
        Backtick,
        Block,
    }

    let bytes = line.as_bytes();
    let mut masked = Vec::new();
    let mut state = if starts_in_block_comment {
        State::Block
    } else {
        State::Code
    };
    let mut span_start = if starts_in_block_comment { Some(0) } else { None };
    let mut i = 0;

    while i < bytes.len() {
        match state {
            State::Code => match bytes[i] {
                b'\'' => {
                    state = State::Single;
                    span_start = Some(i);
                }
                b'"' => {
                    state = State::Double;
                    span_start = Some(i);
                }
                b'`' => {
                    state = State::Backtick;
                    span_start = Some(i);
                }
                b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                    masked.push((i, bytes.len()));
                    return LineLex {
                        masked,
                        ends_in_block_comment: false,
                    };
                }
                b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                    state = State::Block;
                    span_start = Some(i);
                    i += 1;
                }
                _ => {}
            },
            State::Single | State::Double | State::Backtick => {
                let closer = match state {
                    State::Single => b'\'',
                    State::Double => b'"',
                    _ => b'`',
                };
                if bytes[i] == b'\\' {
                    i += 1;
                } else if bytes[i] == closer {
                    masked.push((span_start.take().unwrap_or(0), i + 1));
                    state = State::Code;
                }
            }
            State::Block => {
                if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    masked.push((span_start.take().unwrap_or(0), i + 2));
                    state = State::Code;
                    i += 1;
                }
            }
        }
        i += 1;
    }

    let ends_in_block_comment = state == State::Block;
    if let Some(start) = span_start {
        // Unterminated string or open block comment masks to end of line.
        masked.push((start, bytes.len()));
    }
    LineLex {
        masked,
        ends_in_block_comment,
    }
}

fn summarize(findings: &[Finding], is_cli: bool) -> String {
    if findings.is_empty() {
        return "No dangerous patterns detected".to_string();
    }
    let critical = findings
        .iter()
        .filter(|f| f.severity == Severity::Critical)
        .count();
    let warning = findings
        .iter()
        .filter(|f| f.severity == Severity::Warning)
        .count();
    let info = findings
        .iter()
        .filter(|f| f.severity == Severity::Info)
        .count();
    let files: std::collections::BTreeSet<&str> = findings
        .iter()
        .filter_map(|f| f.file.as_deref())
        .collect();
    let mut summary = format!(
        "Found {critical} critical, {warning} warning, {info} info pattern(s) across {} files",
        files.len()
    );
    if is_cli {
        summary.push_str(" (CLI tool — shell execution expected)");
    }
    summary
}

#[cfg(test)]
#[path = "static_patterns_tests.rs"]
mod tests;
