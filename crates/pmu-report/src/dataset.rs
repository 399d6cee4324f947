use crate::config::ImageFormat;

/// The three charts rendered for every dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Instructions and cycles side by side
    InstructionsCycles,
    /// L1I, L1D and LLC miss counts stacked
    CacheMisses,
    /// Derived miss rates as lines
    MissRates,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [
        ChartKind::InstructionsCycles,
        ChartKind::CacheMisses,
        ChartKind::MissRates,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Workloads,
    Phases,
}

/// Identity of a charted table; decides chart titles and file names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    kind: Kind,
    prefix: String,
}

impl Dataset {
    /// A results table with one row per workload
    pub fn workloads() -> Self {
        Self {
            kind: Kind::Workloads,
            prefix: "pmu".to_string(),
        }
    }

    /// A table with one row per phase of the `prefix` benchmark
    pub fn phases(prefix: &str) -> Self {
        Self {
            kind: Kind::Phases,
            prefix: prefix.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn file_name(&self, chart: ChartKind, format: ImageFormat) -> String {
        let stem = match (&self.kind, chart) {
            (_, ChartKind::InstructionsCycles) => "instructions_cycles",
            (Kind::Workloads, ChartKind::CacheMisses) => "cache_misses_stacked",
            (Kind::Phases, ChartKind::CacheMisses) => "cache_misses",
            (_, ChartKind::MissRates) => "cache_miss_rates",
        };
        format!("{}_{}.{}", self.prefix, stem, format.extension())
    }

    pub fn title(&self, chart: ChartKind) -> String {
        match self.kind {
            Kind::Workloads => match chart {
                ChartKind::InstructionsCycles => "Instructions vs Cycles per Workload",
                ChartKind::CacheMisses => "Cache Misses (L1I / L1D / LLC) per Workload",
                ChartKind::MissRates => "Cache Miss Rates per Workload",
            }
            .to_string(),
            Kind::Phases => {
                let what = match chart {
                    ChartKind::InstructionsCycles => "Instructions vs Cycles",
                    ChartKind::CacheMisses => "Cache Miss Counts",
                    ChartKind::MissRates => "Cache Miss Rates",
                };
                format!("{} workload: {}", capitalize(&self.prefix), what)
            }
        }
    }
}

/// Upper-cases the first character and lower-cases the rest
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
