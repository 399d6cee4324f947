use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Image format of the rendered charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Where and how charts are rendered
#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub output_dir: PathBuf,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Where the phase tables are written
#[derive(Debug, Clone)]
pub struct ResultsConfig {
    pub results_dir: PathBuf,
    /// Also write each table as Parquet next to the CSV
    pub parquet: bool,
}

/// A benchmark executable and the prefix its outputs are named with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchTarget {
    pub prefix: String,
    pub path: PathBuf,
}

impl FromStr for BenchTarget {
    type Err = String;

    /// Parses `prefix=path`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected PREFIX=PATH, got '{}'", s))?;
        let prefix = prefix.trim();
        if prefix.is_empty() || path.trim().is_empty() {
            return Err(format!("expected PREFIX=PATH, got '{}'", s));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            path: PathBuf::from(path.trim()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_target_parse() {
        let target: BenchTarget = "random=./bin/random_access_phases".parse().unwrap();
        assert_eq!(target.prefix, "random");
        assert_eq!(target.path, PathBuf::from("./bin/random_access_phases"));
    }

    #[test]
    fn test_bench_target_rejects_missing_parts() {
        assert!("./bin/matrix_phases".parse::<BenchTarget>().is_err());
        assert!("=./bin/matrix_phases".parse::<BenchTarget>().is_err());
        assert!("matrix=".parse::<BenchTarget>().is_err());
    }
}
