use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use pmu_stats::{add_miss_rates, load_table, parse_pmu_output, run_executable, save_table, Table};

use crate::charts;
use crate::config::{BenchTarget, ChartConfig, ResultsConfig};
use crate::dataset::Dataset;
use crate::parquet_writer::ParquetWriter;

/// Index column of tables built from benchmark phases
pub const PHASE_INDEX: &str = "phase";

/// Charts an existing results CSV with one row per workload.
pub fn workloads(input: &Path, index_column: &str, charts: &ChartConfig) -> Result<Vec<PathBuf>> {
    let mut table = load_table(input, index_column)
        .with_context(|| format!("Failed to load results: {}", input.display()))?;
    log_missing(&table);
    // Recomputed even if the CSV already carries rate columns
    add_miss_rates(&mut table);

    println!("\n[{}] Table:", input.display());
    println!("{}", table);

    charts::render_all(&table, &Dataset::workloads(), charts)
}

/// Runs each benchmark and reports its phases.
///
/// A benchmark whose executable is missing is skipped with a notice; the
/// remaining benchmarks still run.
pub fn benches(
    targets: &[BenchTarget],
    results: &ResultsConfig,
    charts: &ChartConfig,
) -> Result<Vec<PathBuf>> {
    let mut generated = Vec::new();
    for target in targets {
        if !target.path.exists() {
            println!("{} not found. Compile it first.", target.path.display());
            continue;
        }

        let output = run_executable(&target.path)
            .with_context(|| format!("Failed to run {} benchmark", target.prefix))?;
        generated.extend(phases(&output, &target.prefix, results, charts)?);
    }
    Ok(generated)
}

/// Parses benchmark output, writes the phase table, and renders its charts.
pub fn phases(
    output: &str,
    prefix: &str,
    results: &ResultsConfig,
    charts: &ChartConfig,
) -> Result<Vec<PathBuf>> {
    let sections = parse_pmu_output(output)
        .with_context(|| format!("Failed to parse {} benchmark output", prefix))?;
    info!("{}: parsed {} phases", prefix, sections.len());

    // Aggregate into one row per phase, then derive the rates
    let mut table = Table::from_sections(PHASE_INDEX, &sections);
    add_miss_rates(&mut table);

    let mut generated = write_results(&table, prefix, results)?;

    println!("\n[{}] Table:", prefix);
    println!("{}", table);

    generated.extend(charts::render_all(&table, &Dataset::phases(prefix), charts)?);
    Ok(generated)
}

/// Reads saved benchmark output from `input` and reports it like a live run.
pub fn saved_output(
    input: &Path,
    prefix: &str,
    results: &ResultsConfig,
    charts: &ChartConfig,
) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(pmu_stats::Error::MissingInput(input.to_path_buf()).into());
    }
    let output = fs::read_to_string(input)
        .with_context(|| format!("Failed to read benchmark output: {}", input.display()))?;
    phases(&output, prefix, results, charts)
}

fn write_results(table: &Table, prefix: &str, results: &ResultsConfig) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&results.results_dir).with_context(|| {
        format!(
            "Failed to create results directory: {}",
            results.results_dir.display()
        )
    })?;

    // CSV is always written, Parquet only on request
    let csv_path = results.results_dir.join(format!("{}_results.csv", prefix));
    save_table(&csv_path, table)
        .with_context(|| format!("Failed to write results: {}", csv_path.display()))?;
    info!("Wrote {}", csv_path.display());
    let mut written = vec![csv_path];

    if results.parquet {
        let parquet_path = results
            .results_dir
            .join(format!("{}_results.parquet", prefix));
        // One batch holds the whole table
        let file = File::create(&parquet_path).with_context(|| {
            format!("Failed to create output file: {}", parquet_path.display())
        })?;
        let mut writer = ParquetWriter::new(file, table)?;
        writer.write(table)?;
        writer.close()?;
        info!("Wrote {}", parquet_path.display());
        written.push(parquet_path);
    }

    Ok(written)
}

fn log_missing(table: &Table) {
    for (label, column) in table.missing_cells() {
        debug!("Row '{}' has no value for {}", label, column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageFormat;

    const MATRIX_OUTPUT: &str = "\
Matrix size: 256x256, each 0.50 MB (total ~1.50 MB)
[Phase 1] Initializing matrices A and B...
==== PMU statistics for init ====
instructions : 1000
l1i_ref      : 500
l1i_miss     : 50
l1d_ref      : 400
l1d_miss     : 40
llc_miss     : 4
cycles       : 2000

[Phase 2] Performing matrix multiplication C = A * B...
==== PMU statistics for multiply ====
instructions : 9000
l1i_ref      : 100
l1i_miss     : 1
l1d_ref      : 0
l1d_miss     : 7
llc_miss     : 3
cycles       : 12000

Checksum: 123456
";

    fn configs(dir: &Path, parquet: bool) -> (ResultsConfig, ChartConfig) {
        (
            ResultsConfig {
                results_dir: dir.to_path_buf(),
                parquet,
            },
            ChartConfig {
                output_dir: dir.join("plot"),
                format: ImageFormat::Svg,
                width: 640,
                height: 400,
            },
        )
    }

    #[test]
    fn test_phases_writes_results_and_charts() {
        let dir = tempfile::tempdir().unwrap();
        let (results, charts) = configs(dir.path(), true);

        let generated = phases(MATRIX_OUTPUT, "matrix", &results, &charts).unwrap();

        assert_eq!(
            generated,
            vec![
                dir.path().join("matrix_results.csv"),
                dir.path().join("matrix_results.parquet"),
                dir.path().join("plot/matrix_instructions_cycles.svg"),
                dir.path().join("plot/matrix_cache_misses.svg"),
                dir.path().join("plot/matrix_cache_miss_rates.svg"),
            ]
        );

        let table = load_table(&dir.path().join("matrix_results.csv"), PHASE_INDEX).unwrap();
        assert_eq!(table.labels().collect::<Vec<_>>(), vec!["init", "multiply"]);
        assert_eq!(table.value("init", "llc_miss_rate"), Some(0.01));
        assert_eq!(table.value("multiply", "l1d_miss_rate"), Some(0.0));
        assert_eq!(table.value("multiply", "llc_miss_rate"), Some(0.0));
        assert_eq!(table.value("multiply", "l1i_miss_rate"), Some(0.01));
    }

    #[test]
    fn test_phases_renders_png() {
        let dir = tempfile::tempdir().unwrap();
        let (results, mut charts) = configs(dir.path(), false);
        charts.format = ImageFormat::Png;

        let matrix = phases(MATRIX_OUTPUT, "matrix", &results, &charts).unwrap();
        let random = phases(MATRIX_OUTPUT, "random", &results, &charts).unwrap();

        let matrix_charts = &matrix[1..];
        let random_charts = &random[1..];
        assert_eq!(
            matrix_charts,
            [
                charts.output_dir.join("matrix_instructions_cycles.png"),
                charts.output_dir.join("matrix_cache_misses.png"),
                charts.output_dir.join("matrix_cache_miss_rates.png"),
            ]
        );
        for (a, b) in matrix_charts.iter().zip(random_charts) {
            let a = fs::read(a).unwrap();
            let b = fs::read(b).unwrap();
            assert_eq!(&a[..8], b"\x89PNG\r\n\x1a\n");
            // Only the titles differ between the two datasets
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_empty_output_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let (results, charts) = configs(dir.path(), false);

        let generated = phases("no statistics here\n", "random", &results, &charts).unwrap();

        assert_eq!(generated, vec![dir.path().join("random_results.csv")]);
        let csv = fs::read_to_string(dir.path().join("random_results.csv")).unwrap();
        assert_eq!(csv, "phase,l1i_miss_rate,l1d_miss_rate,llc_miss_rate\n");
    }

    #[test]
    fn test_malformed_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (results, charts) = configs(dir.path(), false);

        let err = phases(
            "==== PMU statistics for init ====\ncycles: ???\n",
            "random",
            &results,
            &charts,
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<pmu_stats::Error>(),
            Some(pmu_stats::Error::MalformedMetric { line_number: 2, .. })
        ));
        assert!(!dir.path().join("random_results.csv").exists());
    }

    #[test]
    fn test_missing_bench_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (results, charts) = configs(dir.path(), false);
        let targets = vec![BenchTarget {
            prefix: "random".to_string(),
            path: dir.path().join("bin/random_access_phases"),
        }];

        let generated = benches(&targets, &results, &charts).unwrap();

        assert!(generated.is_empty());
        assert!(!dir.path().join("random_results.csv").exists());
    }

    #[test]
    fn test_workloads_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let (_, charts) = configs(dir.path(), false);
        let input = dir.path().join("results.csv");

        let err = workloads(&input, "workload", &charts).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<pmu_stats::Error>(),
            Some(pmu_stats::Error::MissingInput(_))
        ));
        assert!(!charts.output_dir.exists());
    }

    #[test]
    fn test_workloads() {
        let dir = tempfile::tempdir().unwrap();
        let (_, charts) = configs(dir.path(), false);
        let input = dir.path().join("results.csv");
        fs::write(
            &input,
            "workload,instructions,l1i_ref,l1i_miss,l1d_ref,l1d_miss,llc_miss,cycles\n\
             stream,1000,500,50,400,40,4,2000\n\
             pointer_chase,10,0,0,0,0,0,20\n",
        )
        .unwrap();

        let generated = workloads(&input, "workload", &charts).unwrap();

        assert_eq!(
            generated,
            vec![
                charts.output_dir.join("pmu_instructions_cycles.svg"),
                charts.output_dir.join("pmu_cache_misses_stacked.svg"),
                charts.output_dir.join("pmu_cache_miss_rates.svg"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_benches_runs_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let (results, charts) = configs(dir.path(), false);
        let script = dir.path().join("matrix_phases");
        fs::write(
            &script,
            format!("#!/bin/sh\ncat <<'EOF'\n{}EOF\n", MATRIX_OUTPUT),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let targets = vec![
            BenchTarget {
                prefix: "random".to_string(),
                path: dir.path().join("random_access_phases"),
            },
            BenchTarget {
                prefix: "matrix".to_string(),
                path: script,
            },
        ];
        let generated = benches(&targets, &results, &charts).unwrap();

        assert_eq!(generated.len(), 4);
        assert_eq!(generated[0], dir.path().join("matrix_results.csv"));
        assert!(!dir.path().join("random_results.csv").exists());
    }
}
