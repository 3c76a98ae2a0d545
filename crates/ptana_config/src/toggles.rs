//! Boolean switches of a rules file.
//!
//! Every toggle has a hard-coded default. A rules line only flips a toggle when
//! its value spells the opposite of that default (`"true"` for a default of
//! `false`, and vice versa, compared case-insensitively). Any other value,
//! including misspellings, restores the default.

/// Names every boolean switch a rules file can set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Toggle {
    /// Run the clock-path check on every path.
    ClockCheckEnable,
    /// Print delta totals.
    DeltaSumEnable,
    /// Print path segments.
    PathSegmentEnable,
    /// Apply `ckm` overrides only to cells typed as clock cells.
    CkmWithNonClockCell,
    /// Print the `-through` pins.
    ThroughPinOnReport,
    /// Print slack.
    SlackOnReport,
    /// Print clock uncertainty.
    ClockUncertaintyOnReport,
    /// Print library setup/hold time.
    LibraryRequiredOnReport,
    /// Print datapath level.
    DatapathLevelOnReport,
    /// Print clock skew.
    ClockSkewOnReport,
    /// Print data-path latency segments.
    SegmentDataLatencyOnReport,
    /// Print data-path delta segments.
    SegmentDataDeltaOnReport,
    /// Print launch-clock latency segments.
    SegmentLaunchClkLatencyOnReport,
    /// Print launch-clock delta segments.
    SegmentLaunchClkDeltaOnReport,
    /// Print capture-clock latency segments.
    SegmentCaptureClkLatencyOnReport,
    /// Print capture-clock delta segments.
    SegmentCaptureClkDeltaOnReport,
    /// Fold CRPR into the capture source latency.
    SegmentCaptureClkLatencyIncludeCrpr,
}

impl Toggle {
    /// Every toggle, in declaration order.
    pub const ALL: [Toggle; 17] = [
        Toggle::ClockCheckEnable,
        Toggle::DeltaSumEnable,
        Toggle::PathSegmentEnable,
        Toggle::CkmWithNonClockCell,
        Toggle::ThroughPinOnReport,
        Toggle::SlackOnReport,
        Toggle::ClockUncertaintyOnReport,
        Toggle::LibraryRequiredOnReport,
        Toggle::DatapathLevelOnReport,
        Toggle::ClockSkewOnReport,
        Toggle::SegmentDataLatencyOnReport,
        Toggle::SegmentDataDeltaOnReport,
        Toggle::SegmentLaunchClkLatencyOnReport,
        Toggle::SegmentLaunchClkDeltaOnReport,
        Toggle::SegmentCaptureClkLatencyOnReport,
        Toggle::SegmentCaptureClkDeltaOnReport,
        Toggle::SegmentCaptureClkLatencyIncludeCrpr,
    ];

    /// Returns the rules-file key of this toggle.
    pub fn key(self) -> &'static str {
        match self {
            Toggle::ClockCheckEnable => "clock_check_enable",
            Toggle::DeltaSumEnable => "delta_sum_enable",
            Toggle::PathSegmentEnable => "path_segment_enable",
            Toggle::CkmWithNonClockCell => "ckm_with_non_clock_cell",
            Toggle::ThroughPinOnReport => "through_pin_on_report",
            Toggle::SlackOnReport => "slack_on_report",
            Toggle::ClockUncertaintyOnReport => "clock_uncertainty_on_report",
            Toggle::LibraryRequiredOnReport => "library_required_on_report",
            Toggle::DatapathLevelOnReport => "datapath_level_on_report",
            Toggle::ClockSkewOnReport => "clock_skew_on_report",
            Toggle::SegmentDataLatencyOnReport => "segment_data_latency_on_report",
            Toggle::SegmentDataDeltaOnReport => "segment_data_delta_on_report",
            Toggle::SegmentLaunchClkLatencyOnReport => "segment_launch_clk_latency_on_report",
            Toggle::SegmentLaunchClkDeltaOnReport => "segment_launch_clk_delta_on_report",
            Toggle::SegmentCaptureClkLatencyOnReport => "segment_capture_clk_latency_on_report",
            Toggle::SegmentCaptureClkDeltaOnReport => "segment_capture_clk_delta_on_report",
            Toggle::SegmentCaptureClkLatencyIncludeCrpr => {
                "segment_capture_clk_latency_include_crpr"
            }
        }
    }

    /// Looks a toggle up by its rules-file key.
    pub fn from_key(key: &str) -> Option<Toggle> {
        Toggle::ALL.into_iter().find(|t| t.key() == key)
    }

    /// Returns the value the toggle has when the rules file does not flip it.
    pub fn default_value(self) -> bool {
        matches!(
            self,
            Toggle::SlackOnReport
                | Toggle::ClockSkewOnReport
                | Toggle::SegmentDataLatencyOnReport
                | Toggle::SegmentDataDeltaOnReport
                | Toggle::SegmentLaunchClkLatencyOnReport
                | Toggle::SegmentLaunchClkDeltaOnReport
                | Toggle::SegmentCaptureClkLatencyOnReport
                | Toggle::SegmentCaptureClkDeltaOnReport
                | Toggle::SegmentCaptureClkLatencyIncludeCrpr
        )
    }

    /// Resolves a rules-file value for this toggle.
    ///
    /// Only the exact (case-insensitive) spelling of the opposite of the
    /// default flips it.
    pub fn resolve(self, value: &str) -> bool {
        let default = self.default_value();
        let flip = (!default).to_string();
        if value.to_lowercase() == flip {
            !default
        } else {
            default
        }
    }
}

/// Current values of all toggles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toggles {
    values: [bool; 17],
}

impl Toggles {
    /// Returns the value of `toggle`.
    pub fn get(&self, toggle: Toggle) -> bool {
        self.values[toggle as usize]
    }

    /// Sets `toggle` to `value`.
    pub fn set(&mut self, toggle: Toggle, value: bool) {
        self.values[toggle as usize] = value;
    }

    /// Applies a rules-file value with toggle-on-opposite semantics.
    pub fn apply(&mut self, toggle: Toggle, value: &str) {
        self.set(toggle, toggle.resolve(value));
    }
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            values: Toggle::ALL.map(Toggle::default_value),
        }
    }
}
