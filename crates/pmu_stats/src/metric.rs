use std::fmt;

/// Hardware counters reported by the PMU benchmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    /// Retired instructions
    Instructions,
    /// L1 instruction cache references
    L1iRef,
    /// L1 instruction cache misses
    L1iMiss,
    /// L1 data cache references
    L1dRef,
    /// L1 data cache misses
    L1dMiss,
    /// Last-level cache misses
    LlcMiss,
    /// CPU cycles
    Cycles,
}

impl Metric {
    /// All metrics, in the order they are matched against report lines
    pub const ALL: [Metric; 7] = [
        Metric::Instructions,
        Metric::L1iRef,
        Metric::L1iMiss,
        Metric::L1dRef,
        Metric::L1dMiss,
        Metric::LlcMiss,
        Metric::Cycles,
    ];

    /// Column name used in tables and reports
    pub fn name(self) -> &'static str {
        match self {
            Metric::Instructions => "instructions",
            Metric::L1iRef => "l1i_ref",
            Metric::L1iMiss => "l1i_miss",
            Metric::L1dRef => "l1d_ref",
            Metric::L1dMiss => "l1d_miss",
            Metric::LlcMiss => "llc_miss",
            Metric::Cycles => "cycles",
        }
    }

    /// Finds the metric whose name is a prefix of `key`.
    ///
    /// Prefix matching lets the kernel module spellings (`l1i_references`,
    /// `llc_misses`) land on the same metrics as the benchmark spellings.
    pub fn match_prefix(key: &str) -> Option<Metric> {
        Metric::ALL
            .into_iter()
            .find(|metric| key.starts_with(metric.name()))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Miss ratios derived from the raw counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissRate {
    L1i,
    L1d,
    Llc,
}

impl MissRate {
    pub const ALL: [MissRate; 3] = [MissRate::L1i, MissRate::L1d, MissRate::Llc];

    pub fn name(self) -> &'static str {
        match self {
            MissRate::L1i => "l1i_miss_rate",
            MissRate::L1d => "l1d_miss_rate",
            MissRate::Llc => "llc_miss_rate",
        }
    }

    pub fn numerator(self) -> Metric {
        match self {
            MissRate::L1i => Metric::L1iMiss,
            MissRate::L1d => Metric::L1dMiss,
            MissRate::Llc => Metric::LlcMiss,
        }
    }

    /// LLC misses are normalised by L1D references, not by LLC references.
    pub fn denominator(self) -> Metric {
        match self {
            MissRate::L1i => Metric::L1iRef,
            MissRate::L1d | MissRate::Llc => Metric::L1dRef,
        }
    }

    /// Legend label used in charts
    pub fn label(self) -> &'static str {
        match self {
            MissRate::L1i => "L1I Miss Rate",
            MissRate::L1d => "L1D Miss Rate",
            MissRate::Llc => "LLC Miss Rate (per L1D ref)",
        }
    }
}

impl fmt::Display for MissRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("instructions", Some(Metric::Instructions))]
    #[case("l1i_references", Some(Metric::L1iRef))]
    #[case("l1i_misses", Some(Metric::L1iMiss))]
    #[case("l1d_references", Some(Metric::L1dRef))]
    #[case("llc_misses", Some(Metric::LlcMiss))]
    #[case("cycles", Some(Metric::Cycles))]
    #[case("l1_references", None)]
    #[case("state", None)]
    #[case("", None)]
    fn test_match_prefix(#[case] key: &str, #[case] expected: Option<Metric>) {
        assert_eq!(Metric::match_prefix(key), expected);
    }

    #[test]
    fn test_llc_rate_uses_l1d_references() {
        assert_eq!(MissRate::Llc.numerator(), Metric::LlcMiss);
        assert_eq!(MissRate::Llc.denominator(), Metric::L1dRef);
    }
}
