//! Compiled rule tables and the queries the report analyzer runs against them.

use crate::pattern::Pattern;
use crate::toggles::{Toggle, Toggles};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Returns the instance part of a hierarchical pin name (`u1/u2/Z` → `u1/u2`).
///
/// Ports have no instance and yield the empty string.
pub fn instance_of(pin_name: &str) -> &str {
    pin_name.rsplit_once('/').map_or("", |(inst, _)| inst)
}

/// Returns the pin part of a hierarchical pin name (`u1/u2/Z` → `Z`).
pub fn pin_of(pin_name: &str) -> &str {
    pin_name.rsplit_once('/').map_or(pin_name, |(_, pin)| pin)
}

/// Clock-network membership classifiers declared with `ckp`.
#[derive(Clone, Debug, Default)]
pub struct ClockPinRules {
    /// Library cells whose pins are clock pins (`ckp: c ...`).
    pub cells: BTreeSet<String>,
    /// Instances whose pins are clock pins (`ckp: i ...`).
    pub instances: BTreeSet<String>,
    /// Pin-name patterns (`ckp: r ...`), tried in declaration order.
    pub patterns: Vec<Pattern>,
}

impl ClockPinRules {
    /// Returns `true` if any classifier claims the pin.
    pub fn matches(&self, pin_name: &str, cell: &str) -> bool {
        self.cells.contains(cell)
            || self.instances.contains(instance_of(pin_name))
            || self.patterns.iter().any(|p| p.is_full_match(pin_name))
    }
}

/// One `ckt` rule: cells matching `pattern` are clock cells when `is_clock`.
#[derive(Clone, Debug)]
pub struct ClockTypeRule {
    /// The tag (`y` → `true`, `n` → `false`).
    pub is_clock: bool,
    /// Cell-name pattern.
    pub pattern: Pattern,
}

/// An insertion-ordered tag → pattern table (`pc`, `cc`).
///
/// Re-declaring a tag replaces its pattern but keeps its position, so
/// priority is decided by first declaration.
#[derive(Clone, Debug, Default)]
pub struct ClassTable {
    entries: IndexMap<String, Pattern>,
}

impl ClassTable {
    /// Adds or replaces the pattern of `tag`.
    pub fn insert(&mut self, tag: impl Into<String>, pattern: Pattern) {
        self.entries.insert(tag.into(), pattern);
    }

    /// Returns the pattern of `tag`.
    pub fn get(&self, tag: &str) -> Option<&Pattern> {
        self.entries.get(tag)
    }

    /// Returns `true` if `tag` is declared.
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Returns the first tag (in declaration order) whose pattern fully matches `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, pattern)| pattern.is_full_match(text))
            .map(|(tag, _)| tag.as_str())
    }

    /// Iterates over `(tag, pattern)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Pattern)> {
        self.entries.iter().map(|(tag, p)| (tag.as_str(), p))
    }

    /// Returns the number of tags.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no tag is declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Driving-cell classification declared with `dc`.
#[derive(Clone, Debug, Default)]
pub struct DriveClasses {
    /// Catch-all pattern; its first capture group is the classification value.
    pub pattern: Option<Pattern>,
    /// Explicit per-cell values, which take precedence over the pattern.
    pub cells: IndexMap<String, f64>,
}

impl DriveClasses {
    /// Classifies `cell`, returning `None` when no rule gives it a value.
    pub fn classify(&self, cell: &str) -> Option<f64> {
        if let Some(value) = self.cells.get(cell) {
            return Some(*value);
        }
        let caps = self.pattern.as_ref()?.full_captures(cell)?;
        caps.get(1)?.as_str().parse().ok()
    }
}

/// Hold/check descriptions declared with `hcd`: cell → `"pin_in:pin_out"` → tag.
#[derive(Clone, Debug, Default)]
pub struct HoldCheckTable {
    cells: IndexMap<String, IndexMap<String, String>>,
}

impl HoldCheckTable {
    /// Records the arc `pin_in → pin_out` of `cell` under `tag`.
    pub fn insert(&mut self, cell: &str, pin_in: &str, pin_out: &str, tag: &str) {
        self.cells
            .entry(cell.to_string())
            .or_default()
            .insert(format!("{pin_in}:{pin_out}"), tag.to_string());
    }

    /// Returns the tag of the arc `pin_in → pin_out` of `cell`.
    pub fn tag(&self, cell: &str, pin_in: &str, pin_out: &str) -> Option<&str> {
        self.cells
            .get(cell)?
            .get(&format!("{pin_in}:{pin_out}"))
            .map(String::as_str)
    }

    /// Returns `true` if no arc is described.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Every compiled rule of one rules file. Immutable once built.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    /// Boolean switches.
    pub toggles: Toggles,
    /// Named bar-dataset groups (`bds`): tag → data-type codes.
    pub bar_sets: IndexMap<String, Vec<String>>,
    /// Clock-network membership classifiers (`ckp`).
    pub clock_pins: ClockPinRules,
    /// Ordered clock-cell type rules (`ckt`), first match wins.
    pub clock_types: Vec<ClockTypeRule>,
    /// Clock-membership override patterns on cell names (`ckm`).
    pub clock_overrides: Vec<Pattern>,
    /// Hold/check descriptions (`hcd`).
    pub hold_checks: HoldCheckTable,
    /// Default path classification tag (`dpc`); always a key of `path_classes`.
    pub default_path_class: Option<String>,
    /// Path classification on pin names (`pc`).
    pub path_classes: ClassTable,
    /// Cell classification on cell names (`cc`).
    pub cell_classes: ClassTable,
    /// Driving-cell classification (`dc`).
    pub drive_classes: DriveClasses,
}

impl RuleSet {
    /// Returns the value of a toggle.
    pub fn toggle(&self, toggle: Toggle) -> bool {
        self.toggles.get(toggle)
    }

    /// Returns the `ckt` tag of `cell`: first matching rule wins, `None` if no rule matches.
    pub fn clock_type(&self, cell: &str) -> Option<bool> {
        self.clock_types
            .iter()
            .find(|rule| rule.pattern.is_full_match(cell))
            .map(|rule| rule.is_clock)
    }

    /// Returns the `hcd` tag of the arc `pin_in → pin_out` of `cell`.
    pub fn hold_check_tag(&self, cell: &str, pin_in: &str, pin_out: &str) -> Option<&str> {
        self.hold_checks.tag(cell, pin_in, pin_out)
    }

    /// Decides clock-network membership of a pin.
    ///
    /// A pin is a clock pin if a `ckp` classifier claims it and no `ckm`
    /// override removes it. With `ckm_with_non_clock_cell` set, overrides only
    /// apply to cells whose `ckt` tag is clock.
    pub fn is_clock_pin(&self, pin_name: &str, cell: &str) -> bool {
        if !self.clock_pins.matches(pin_name, cell) {
            return false;
        }
        let overridden = self.clock_overrides.iter().any(|p| p.is_full_match(cell));
        if !overridden {
            return true;
        }
        self.toggle(Toggle::CkmWithNonClockCell) && self.clock_type(cell) != Some(true)
    }

    /// Returns the default path tag, if one survived validation.
    pub fn default_path_class(&self) -> Option<&str> {
        self.default_path_class.as_deref()
    }

    /// Returns the data-type codes of a bar-dataset group.
    pub fn bar_set(&self, tag: &str) -> Option<&[String]> {
        self.bar_sets.get(tag).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat(s: &str) -> Pattern {
        Pattern::new(s).unwrap()
    }

    #[test]
    fn name_helpers() {
        assert_eq!(instance_of("top/u1/Z"), "top/u1");
        assert_eq!(pin_of("top/u1/Z"), "Z");
        assert_eq!(instance_of("clk"), "");
        assert_eq!(pin_of("clk"), "clk");
    }

    #[test]
    fn class_table_first_match_in_declaration_order() {
        let mut table = ClassTable::default();
        table.insert("CORE", pat("core/.*"));
        table.insert("ANY", pat(".*"));
        assert_eq!(table.first_match("core/u1/Z"), Some("CORE"));
        assert_eq!(table.first_match("io/u1/Z"), Some("ANY"));

        table.insert("CORE", pat("nothing"));
        assert_eq!(table.iter().next().map(|(t, _)| t), Some("CORE"));
        assert_eq!(table.first_match("core/u1/Z"), Some("ANY"));
    }

    #[test]
    fn drive_class_override_beats_pattern() {
        let drive = DriveClasses {
            pattern: Some(pat(r"BUFX(\d+)")),
            cells: IndexMap::from([("BUFX4".to_string(), 9.0)]),
        };
        assert_eq!(drive.classify("BUFX4"), Some(9.0));
        assert_eq!(drive.classify("BUFX8"), Some(8.0));
        assert_eq!(drive.classify("INVX2"), None);
    }

    #[test]
    fn drive_class_pattern_without_group_is_unclassified() {
        let drive = DriveClasses {
            pattern: Some(pat("BUF.*")),
            cells: IndexMap::new(),
        };
        assert_eq!(drive.classify("BUFX8"), None);
    }

    #[test]
    fn hold_check_lookup() {
        let mut hcd = HoldCheckTable::default();
        hcd.insert("ICG", "CK", "GCK", "gate");
        assert_eq!(hcd.tag("ICG", "CK", "GCK"), Some("gate"));
        assert_eq!(hcd.tag("ICG", "E", "GCK"), None);
        assert_eq!(hcd.tag("BUF", "CK", "GCK"), None);

        let rules = RuleSet {
            hold_checks: hcd,
            ..RuleSet::default()
        };
        assert_eq!(rules.hold_check_tag("ICG", "CK", "GCK"), Some("gate"));
    }

    #[test]
    fn clock_type_first_match_wins() {
        let rules = RuleSet {
            clock_types: vec![
                ClockTypeRule {
                    is_clock: true,
                    pattern: pat("CK.*"),
                },
                ClockTypeRule {
                    is_clock: false,
                    pattern: pat("CKMUX.*"),
                },
            ],
            ..RuleSet::default()
        };
        assert_eq!(rules.clock_type("CKMUX2"), Some(true));
        assert_eq!(rules.clock_type("BUF"), None);
    }

    #[test]
    fn clock_override_respects_non_clock_cell_toggle() {
        let mut rules = RuleSet {
            clock_pins: ClockPinRules {
                cells: BTreeSet::from(["CKBUF".to_string(), "MUX".to_string()]),
                ..ClockPinRules::default()
            },
            clock_types: vec![ClockTypeRule {
                is_clock: true,
                pattern: pat("CKBUF"),
            }],
            clock_overrides: vec![pat("CKBUF|MUX")],
            ..RuleSet::default()
        };
        assert!(!rules.is_clock_pin("u1/Z", "CKBUF"));
        assert!(!rules.is_clock_pin("u2/Z", "MUX"));

        rules.toggles.set(Toggle::CkmWithNonClockCell, true);
        assert!(!rules.is_clock_pin("u1/Z", "CKBUF"));
        assert!(rules.is_clock_pin("u2/Z", "MUX"));
        assert!(!rules.is_clock_pin("u3/Z", "INV"));
    }

    #[test]
    fn clock_pin_by_instance_and_pattern() {
        let rules = RuleSet {
            clock_pins: ClockPinRules {
                instances: BTreeSet::from(["top/cgen".to_string()]),
                patterns: vec![pat(".*/CK")],
                ..ClockPinRules::default()
            },
            ..RuleSet::default()
        };
        assert!(rules.is_clock_pin("top/cgen/Z", "DIV"));
        assert!(rules.is_clock_pin("top/ff/CK", "DFF"));
        assert!(!rules.is_clock_pin("top/ff/Q", "DFF"));
    }
}
