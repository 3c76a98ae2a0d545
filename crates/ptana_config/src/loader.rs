//! Rules-file loading and compilation.

use crate::error::ConfigError;
use crate::pattern::Pattern;
use crate::toggles::Toggle;
use crate::types::{ClockTypeRule, RuleSet};
use ptana_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use ptana_source::{FileId, SourceDb, SourceFile};
use std::path::Path;

/// Code of the warning raised when `dpc` names an undeclared `pc` tag.
pub const DROPPED_DEFAULT_CLASS: DiagnosticCode = DiagnosticCode::new(Category::Config, 101);

/// Loads and compiles a rules file.
///
/// `None` yields the default rule set (every toggle at its default, every
/// table empty). The file is registered in `source_db` so that diagnostics can
/// point at its lines.
pub fn load_rules(
    path: Option<&Path>,
    source_db: &mut SourceDb,
    sink: &DiagnosticSink,
) -> Result<RuleSet, ConfigError> {
    let Some(path) = path else {
        return Ok(RuleSet::default());
    };
    let id = source_db.load_file(path)?;
    compile_rules(source_db.get_file(id), sink)
}

/// Compiles rules held in memory; diagnostics carry no file location.
pub fn compile_rules_str(content: &str, sink: &DiagnosticSink) -> Result<RuleSet, ConfigError> {
    let file = SourceFile::new(FileId::DUMMY, "<rules>".into(), content.to_string());
    compile_rules(&file, sink)
}

/// Compiles every line of a rules file.
///
/// Comments run from `#` to end of line. Each remaining non-blank line is
/// `key: value` with exactly one colon. The first line that fails aborts the
/// whole compilation with [`ConfigError::Syntax`].
pub fn compile_rules(file: &SourceFile, sink: &DiagnosticSink) -> Result<RuleSet, ConfigError> {
    let mut rules = RuleSet::default();
    let mut default_class_line = 0;

    for (ln, raw) in file.lines_from(1) {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let syntax = |reason: String| ConfigError::Syntax { line: ln, reason };
        let (key, value) = split_entry(line).map_err(syntax)?;
        compile_entry(&mut rules, key, value).map_err(syntax)?;
        if key == "dpc" {
            default_class_line = ln;
        }
    }

    if let Some(tag) = rules.default_path_class.take() {
        if rules.path_classes.contains(&tag) {
            rules.default_path_class = Some(tag);
        } else {
            sink.emit(
                Diagnostic::warning(
                    DROPPED_DEFAULT_CLASS,
                    format!("default path group '{tag}' is not declared, ignored"),
                    file.location(default_class_line),
                )
                .with_help(format!("declare it with `pc: {tag} <pattern>`")),
            );
        }
    }

    tracing::debug!(
        path_classes = rules.path_classes.len(),
        cell_classes = rules.cell_classes.len(),
        clock_types = rules.clock_types.len(),
        "compiled rules from {}",
        file.path.display()
    );
    Ok(rules)
}

fn split_entry(line: &str) -> Result<(&str, &str), String> {
    let mut parts = line.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) => Ok((key.trim(), value.trim())),
        _ => Err("expected `key: value` with a single ':'".to_string()),
    }
}

fn compile_pattern(source: &str) -> Result<Pattern, String> {
    Pattern::new(source).map_err(|e| format!("invalid pattern '{source}': {e}"))
}

fn compile_entry(rules: &mut RuleSet, key: &str, value: &str) -> Result<(), String> {
    if let Some(toggle) = Toggle::from_key(key) {
        rules.toggles.apply(toggle, value);
        return Ok(());
    }

    let tokens: Vec<&str> = value.split_whitespace().collect();
    match key {
        "bds" => {
            let (tag, codes) = tokens
                .split_first()
                .ok_or_else(|| "bds needs a tag".to_string())?;
            rules
                .bar_sets
                .insert(tag.to_string(), codes.iter().map(|c| c.to_string()).collect());
        }
        "ckt" => {
            let [tag, pattern] = tokens[..] else {
                return Err("ckt expects `y|n <pattern>`".to_string());
            };
            let pattern = compile_pattern(pattern)?;
            let is_clock = match tag.to_lowercase().as_str() {
                "y" => true,
                "n" => false,
                other => return Err(format!("ckt tag must be y or n, found '{other}'")),
            };
            rules.clock_types.push(ClockTypeRule { is_clock, pattern });
        }
        "ckp" => {
            let (kind, items) = tokens
                .split_first()
                .ok_or_else(|| "ckp needs a type".to_string())?;
            let clock_pins = &mut rules.clock_pins;
            match *kind {
                "c" => clock_pins.cells.extend(items.iter().map(|s| s.to_string())),
                "i" => clock_pins
                    .instances
                    .extend(items.iter().map(|s| s.to_string())),
                "r" => {
                    for item in items {
                        clock_pins.patterns.push(compile_pattern(item)?);
                    }
                }
                other => return Err(format!("unknown ckp type '{other}'")),
            }
        }
        "ckm" => {
            let pattern = tokens
                .first()
                .ok_or_else(|| "ckm needs a pattern".to_string())?;
            rules.clock_overrides.push(compile_pattern(pattern)?);
        }
        "dpc" => rules.default_path_class = Some(value.to_string()),
        "pc" | "cc" => {
            let [tag, pattern] = tokens[..] else {
                return Err(format!("{key} expects `<tag> <pattern>`"));
            };
            let pattern = compile_pattern(pattern)?;
            let table = if key == "pc" {
                &mut rules.path_classes
            } else {
                &mut rules.cell_classes
            };
            table.insert(tag, pattern);
        }
        "dc" => {
            let [first, second, ..] = tokens[..] else {
                return Err("dc expects `r <pattern>` or `<value> <cell>`".to_string());
            };
            if first == "r" {
                rules.drive_classes.pattern = Some(compile_pattern(second)?);
            } else {
                let value: f64 = first
                    .parse()
                    .map_err(|_| format!("invalid drive value '{first}'"))?;
                rules.drive_classes.cells.insert(second.to_string(), value);
            }
        }
        "hcd" => {
            let (cell, pin_in, pin_out, tag) = split_hold_check(value)?;
            rules.hold_checks.insert(cell, pin_in, pin_out, tag);
        }
        other => return Err(format!("unknown key '{other}'")),
    }
    Ok(())
}

/// Splits `type pin_in pin_out tag`, where the tag may be double-quoted to
/// contain spaces.
fn split_hold_check(value: &str) -> Result<(&str, &str, &str, &str), String> {
    let usage = || "hcd expects `<cell> <pin_in> <pin_out> <tag>`".to_string();
    let mut quoted = value.split('"');
    let head = quoted.next().unwrap_or_default();
    let mut words = head.split_whitespace();
    let (cell, pin_in, pin_out) = match (words.next(), words.next(), words.next()) {
        (Some(c), Some(i), Some(o)) => (c, i, o),
        _ => return Err(usage()),
    };
    let tag = match quoted.next() {
        Some(tag) if words.next().is_none() => tag,
        Some(_) => return Err(usage()),
        None => match (words.next(), words.next()) {
            (Some(tag), None) => tag,
            _ => return Err(usage()),
        },
    };
    Ok((cell, pin_in, pin_out, tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptana_diagnostics::Severity;

    fn compile(text: &str) -> (Result<RuleSet, ConfigError>, Vec<Diagnostic>) {
        let sink = DiagnosticSink::new();
        let result = compile_rules_str(text, &sink);
        (result, sink.take_all())
    }

    fn syntax_line(text: &str) -> Option<usize> {
        compile(text).0.err().and_then(|e| e.line())
    }

    #[test]
    fn empty_file_gives_defaults() {
        let (rules, diags) = compile("# only a comment\n\n");
        let rules = rules.unwrap();
        assert!(rules.toggle(Toggle::SlackOnReport));
        assert!(rules.path_classes.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn toggles_flip_on_opposite_only() {
        let text = "\
clock_check_enable: TRUE
slack_on_report: false
clock_skew_on_report: true
delta_sum_enable: on
";
        let rules = compile(text).0.unwrap();
        assert!(rules.toggle(Toggle::ClockCheckEnable));
        assert!(!rules.toggle(Toggle::SlackOnReport));
        assert!(rules.toggle(Toggle::ClockSkewOnReport));
        assert!(!rules.toggle(Toggle::DeltaSumEnable));
    }

    #[test]
    fn full_rules_file() {
        let text = r#"
bds: phy p c t
ckt: y CK.*      # clock cells
ckt: N .*
ckp: c CKBUFX4 CKINVX2
ckp: i top/clkgen
ckp: r .*/CLK
ckm: ICG.*
pc:  CORE core/.*
pc:  IO   io/.*
cc:  BUF  BUF.*
dpc: CORE
dc:  r BUFX(\d+)
dc:  12 SPECIALBUF
hcd: ICG CK GCK gating
hcd: LATCH G Q "latch through"
"#;
        let (rules, diags) = compile(text);
        let rules = rules.unwrap();
        assert!(diags.is_empty());
        assert_eq!(rules.bar_set("phy").unwrap(), ["p", "c", "t"]);
        assert_eq!(rules.clock_types.len(), 2);
        assert!(!rules.clock_types[1].is_clock);
        assert!(rules.clock_pins.cells.contains("CKINVX2"));
        assert!(rules.clock_pins.instances.contains("top/clkgen"));
        assert_eq!(rules.clock_pins.patterns.len(), 1);
        assert_eq!(rules.clock_overrides.len(), 1);
        assert_eq!(rules.default_path_class(), Some("CORE"));
        assert_eq!(rules.cell_classes.first_match("BUFX2"), Some("BUF"));
        assert_eq!(rules.drive_classes.classify("BUFX16"), Some(16.0));
        assert_eq!(rules.drive_classes.classify("SPECIALBUF"), Some(12.0));
        assert_eq!(rules.hold_checks.tag("ICG", "CK", "GCK"), Some("gating"));
        assert_eq!(
            rules.hold_checks.tag("LATCH", "G", "Q"),
            Some("latch through")
        );
    }

    #[test]
    fn missing_default_class_is_dropped_with_warning() {
        let (rules, diags) = compile("pc: CORE core/.*\ndpc: TOP\n");
        assert_eq!(rules.unwrap().default_path_class(), None);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].code, DROPPED_DEFAULT_CLASS);
        assert_eq!(diags[0].location.line, 2);
    }

    #[test]
    fn unknown_ckp_type_reports_its_line() {
        assert_eq!(syntax_line("pc: A a.*\n\nckp: x foo\n"), Some(3));
    }

    #[test]
    fn malformed_lines_report_their_line() {
        assert_eq!(syntax_line("ckt: maybe CK.*"), Some(1));
        assert_eq!(syntax_line("ckt: y"), Some(1));
        assert_eq!(syntax_line("# c\npc: A"), Some(2));
        assert_eq!(syntax_line("pc: A a.* extra"), Some(1));
        assert_eq!(syntax_line("cc: A (unclosed"), Some(1));
        assert_eq!(syntax_line("dc: fast BUF"), Some(1));
        assert_eq!(syntax_line("dc: 1"), Some(1));
        assert_eq!(syntax_line("hcd: ICG CK"), Some(1));
        assert_eq!(syntax_line("ckm:"), Some(1));
        assert_eq!(syntax_line("bds:"), Some(1));
        assert_eq!(syntax_line("no_such_key: 1"), Some(1));
        assert_eq!(syntax_line("just text"), Some(1));
        assert_eq!(syntax_line("pc: A a:b"), Some(1));
    }

    #[test]
    fn redeclared_class_keeps_priority() {
        let text = "pc: A a.*\npc: B .*\npc: A ab.*\n";
        let rules = compile(text).0.unwrap();
        let tags: Vec<_> = rules.path_classes.iter().map(|(t, _)| t).collect();
        assert_eq!(tags, ["A", "B"]);
        assert_eq!(rules.path_classes.first_match("abc"), Some("A"));
        assert_eq!(rules.path_classes.first_match("ax"), Some("B"));
    }

    #[test]
    fn compilation_is_deterministic() {
        let text = "pc: A a.*\npc: B .*b\nckt: y X.*\nckt: n .*\n";
        let first = compile(text).0.unwrap();
        let second = compile(text).0.unwrap();
        for name in ["ab", "xb", "a", "zz"] {
            assert_eq!(
                first.path_classes.first_match(name),
                second.path_classes.first_match(name)
            );
        }
        for cell in ["XBUF", "BUF"] {
            assert_eq!(first.clock_type(cell), second.clock_type(cell));
        }
    }

    #[test]
    fn load_rules_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ptana.setup");
        std::fs::write(&path, "path_segment_enable: true\ndpc: NOPE\n").unwrap();

        let mut db = SourceDb::new();
        let sink = DiagnosticSink::new();
        let rules = load_rules(Some(&path), &mut db, &sink).unwrap();
        assert!(rules.toggle(Toggle::PathSegmentEnable));

        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert!(db.describe(diags[0].location).unwrap().ends_with(":2"));
    }

    #[test]
    fn load_rules_without_file_is_default() {
        let mut db = SourceDb::new();
        let rules = load_rules(None, &mut db, &DiagnosticSink::new()).unwrap();
        assert!(!rules.toggle(Toggle::ClockCheckEnable));
    }

    #[test]
    fn load_rules_missing_file_is_io_error() {
        let mut db = SourceDb::new();
        let err = load_rules(
            Some(Path::new("/nonexistent/.ptana.setup")),
            &mut db,
            &DiagnosticSink::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
