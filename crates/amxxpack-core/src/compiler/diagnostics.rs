use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// `end_line` of a diagnostic that covers a single line
pub const SINGLE_LINE: i32 = -1;

/// `<filename>(<line>[ -- <endLine>]) : <warning|error|fatal error> <code>: <text>`
static MESSAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([a-zA-Z0-9.\-_/:\\\s]+)\(([0-9]+)(?:\s--\s([0-9]+))?\)\s:\s((?:fatal\s)?error|warning)\s([0-9]+):\s(.*)",
    )
    .expect("diagnostic pattern is valid")
});

/// Echoes that mean the compiler gave up without a structured error
const ABORT_PREFIXES: [&str; 2] = ["Compilation aborted.", "Could not locate output file"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Any line that is not a structured diagnostic
    Echo,
    Warning,
    Error,
    FatalError,
}

impl Severity {
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error | Severity::FatalError)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Echo => write!(f, "echo"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::FatalError => write!(f, "fatal error"),
        }
    }
}

/// One line of compiler output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub filename: Option<String>,
    pub start_line: Option<u32>,
    /// [`SINGLE_LINE`] when the diagnostic has no line range
    pub end_line: Option<i32>,
    pub severity: Severity,
    pub code: Option<u32>,
    pub text: String,
}

impl Diagnostic {
    pub fn echo(text: impl Into<String>) -> Self {
        Self {
            filename: None,
            start_line: None,
            end_line: None,
            severity: Severity::Echo,
            code: None,
            text: text.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.severity == Severity::Echo {
            return write!(f, "{}", self.text);
        }

        if let Some(filename) = &self.filename {
            write!(f, "{filename}")?;
        }
        if let Some(start) = self.start_line {
            match self.end_line {
                Some(end) if end != SINGLE_LINE => write!(f, "({start} -- {end})")?,
                _ => write!(f, "({start})")?,
            }
        }
        write!(f, " : {}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, " {code}")?;
        }
        write!(f, ": {}", self.text)
    }
}

/// Diagnostics of one compiler run plus the overall verdict
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    pub diagnostics: Vec<Diagnostic>,
    pub had_error: bool,
    pub aborted: bool,
}

/// Classify a single output line
pub fn parse_line(line: &str) -> Diagnostic {
    let Some(captures) = MESSAGE_PATTERN.captures(line) else {
        return Diagnostic::echo(line);
    };

    let number = |index: usize| {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u32>().ok())
    };

    let (Some(start_line), Some(code)) = (number(2), number(5)) else {
        return Diagnostic::echo(line);
    };

    let end_line = captures
        .get(3)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(SINGLE_LINE);

    let severity = match &captures[4] {
        "warning" => Severity::Warning,
        "error" => Severity::Error,
        _ => Severity::FatalError,
    };

    Diagnostic {
        filename: Some(captures[1].trim().to_string()),
        start_line: Some(start_line),
        end_line: Some(end_line),
        severity,
        code: Some(code),
        text: captures[6].to_string(),
    }
}

/// Parse raw compiler output line by line.
///
/// Lines are independent; diagnostic order follows the output.
pub fn parse_output(output: &str) -> ParsedOutput {
    let mut result = ParsedOutput::default();

    for line in output.lines() {
        let diagnostic = parse_line(line);

        if diagnostic.severity.is_error() {
            result.had_error = true;
        } else if diagnostic.severity == Severity::Echo
            && ABORT_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
        {
            result.had_error = true;
            result.aborted = true;
        }

        result.diagnostics.push(diagnostic);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_parse_error_line() {
        let diagnostic = parse_line("plugin.sma(12) : error 35: symbol not found");

        assert_eq!(
            diagnostic,
            Diagnostic {
                filename: Some("plugin.sma".to_string()),
                start_line: Some(12),
                end_line: Some(SINGLE_LINE),
                severity: Severity::Error,
                code: Some(35),
                text: "symbol not found".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_line_range() {
        let diagnostic = parse_line("src/a.sma(10 -- 14) : warning 217: loose indentation");

        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(diagnostic.start_line, Some(10));
        assert_eq!(diagnostic.end_line, Some(14));
        assert_eq!(diagnostic.code, Some(217));
        assert_eq!(diagnostic.text, "loose indentation");
    }

    #[test]
    fn test_parse_fatal_error() {
        let diagnostic =
            parse_line(r"C:\work\plugin.sma(1) : fatal error 100: cannot read from file");

        assert_eq!(diagnostic.severity, Severity::FatalError);
        assert_eq!(diagnostic.filename.as_deref(), Some(r"C:\work\plugin.sma"));
        assert_eq!(diagnostic.code, Some(100));
    }

    #[test]
    fn test_banner_is_echo() {
        let parsed = parse_output("AMX Mod X Compiler 1.8.2\n");

        assert_eq!(
            parsed.diagnostics,
            vec![Diagnostic::echo("AMX Mod X Compiler 1.8.2")]
        );
        assert!(!parsed.had_error);
        assert!(!parsed.aborted);
    }

    #[test]
    fn test_compilation_aborted_echo() {
        let parsed = parse_output("Compilation aborted.");

        assert_eq!(parsed.diagnostics[0].severity, Severity::Echo);
        assert!(parsed.had_error);
        assert!(parsed.aborted);
    }

    #[test]
    fn test_missing_output_file_echo() {
        let parsed = parse_output("Could not locate output file /tmp/out/test.amx (compile failed).");

        assert!(parsed.had_error);
        assert!(parsed.aborted);
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let parsed = parse_output("test.sma(4) : warning 204: symbol is assigned a value that is never used: \"x\"");

        assert!(!parsed.had_error);
        assert_eq!(
            parsed.diagnostics[0].text,
            "symbol is assigned a value that is never used: \"x\""
        );
    }

    #[test]
    fn test_full_output_preserves_order() {
        let output = indoc! {r#"
            AMX Mod X Compiler 1.8.2
            Copyright (c) 1997-2006 ITB CompuPhase

            test.sma(3) : warning 217: loose indentation
            test.sma(7) : error 17: undefined symbol "foo"
            1 Error.
            Could not locate output file test.amx (compile failed).
        "#};

        let parsed = parse_output(output);
        let severities: Vec<Severity> = parsed.diagnostics.iter().map(|d| d.severity).collect();

        assert_eq!(
            severities,
            vec![
                Severity::Echo,
                Severity::Echo,
                Severity::Echo,
                Severity::Warning,
                Severity::Error,
                Severity::Echo,
                Severity::Echo,
            ]
        );
        assert!(parsed.had_error);
        assert!(parsed.aborted);
    }

    #[test]
    fn test_display_round_trips_format() {
        let line = "plugin.sma(10 -- 12) : error 35: symbol not found";
        assert_eq!(parse_line(line).to_string(), line);
        assert_eq!(Diagnostic::echo("banner").to_string(), "banner");
    }
}
