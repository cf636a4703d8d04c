//! Benchmark runner for the GEMM paths.

use std::time::Instant;

use anyhow::{Context, Result};
use blocked_gemm::matrix::{matmul_naive_ijk, matmul_naive_ikj};
use blocked_gemm::{BlockParams, Gemm, KernelKind, Layout, MatMut, MatRef, dispatch, gemm};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "gemm-bench",
    about = "Benchmark blocked GEMM kernels against naive baselines"
)]
struct Args {
    /// Square matrix sizes to run
    #[arg(long, value_delimiter = ',', default_values_t = [256, 512, 1024])]
    sizes: Vec<usize>,

    /// Timed runs per method (after one warmup)
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// Threads for the multi-threaded variants
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Override MC for an extra "custom" row
    #[arg(long)]
    mc: Option<usize>,
    /// Override KC for an extra "custom" row
    #[arg(long)]
    kc: Option<usize>,
    /// Override NC for an extra "custom" row
    #[arg(long)]
    nc: Option<usize>,
    /// Override MR for an extra "custom" row
    #[arg(long)]
    mr: Option<usize>,
    /// Override NR for an extra "custom" row
    #[arg(long)]
    nr: Option<usize>,

    /// Print results as JSON instead of tables
    #[arg(long)]
    json: bool,
}

impl Args {
    /// Portable params with the command-line overrides applied, if any were given.
    fn custom_params(&self) -> Option<BlockParams> {
        if [self.mc, self.kc, self.nc, self.mr, self.nr].iter().all(Option::is_none) {
            return None;
        }
        let base = BlockParams::PORTABLE;
        Some(BlockParams::new(
            self.mc.unwrap_or(base.mc),
            self.kc.unwrap_or(base.kc),
            self.nc.unwrap_or(base.nc),
            self.mr.unwrap_or(base.mr),
            self.nr.unwrap_or(base.nr),
        ))
    }
}

#[derive(Debug, Serialize)]
struct BenchRecord {
    size: usize,
    method: String,
    time_ms: f64,
    gflops: f64,
    speedup: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<BlockParams>,
}

type RunFn<'a> =
    Box<dyn Fn(&[f64], &[f64], &mut [f64], usize, usize, usize) -> blocked_gemm::Result<()> + 'a>;

type Method<'a> = (String, Option<BlockParams>, RunFn<'a>);

fn method<'a, F>(name: impl Into<String>, params: Option<BlockParams>, f: F) -> Method<'a>
where
    F: Fn(&[f64], &[f64], &mut [f64], usize, usize, usize) -> blocked_gemm::Result<()> + 'a,
{
    (name.into(), params, Box::new(f))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Some(params) = args.custom_params() {
        params.validate().context("invalid block parameter override")?;
    }

    let available = KernelKind::available();
    info!(
        kernels = ?available.iter().map(|k| k.name()).collect::<Vec<_>>(),
        compiled = ?BlockParams::COMPILED,
        "starting benchmark"
    );

    let methods = build_methods(&args, &available);
    let mut records = Vec::new();

    for &size in &args.sizes {
        let (m, n, k) = (size, size, size);
        let a: Vec<f64> = (0..m * k).map(|i| (i % 100) as f64).collect();
        let b: Vec<f64> = (0..k * n).map(|i| (i % 100) as f64).collect();

        let mut baseline_ms = None;
        for (name, params, f) in &methods {
            let (time_ms, gflops) = bench_fn(&a, &b, m, n, k, args.iterations, f)
                .with_context(|| format!("{} failed at {}×{}", name, size, size))?;
            let baseline = *baseline_ms.get_or_insert(time_ms);
            records.push(BenchRecord {
                size,
                method: name.clone(),
                time_ms,
                gflops,
                speedup: baseline / time_ms,
                params: *params,
            });
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_size_tables(&args.sizes, &records);
        print_summary_table(&args.sizes, &methods, &records);
    }

    Ok(())
}

fn build_methods(args: &Args, available: &[KernelKind]) -> Vec<Method<'static>> {
    let mut methods = vec![
        method("Naive (i-j-k)", None, |a, b, c, m, n, k| {
            matmul_naive_ijk(a, b, c, m, n, k);
            Ok(())
        }),
        method("Scalar (i-k-j)", None, |a, b, c, m, n, k| {
            matmul_naive_ikj(a, b, c, m, n, k);
            Ok(())
        }),
        method(
            "Blocked (built-in)",
            Some(BlockParams::COMPILED),
            |a, b, c, m, n, k| {
                gemm(
                    1.0,
                    MatRef::from_slice(a, m, k, Layout::RowMajor)?,
                    MatRef::from_slice(b, k, n, Layout::RowMajor)?,
                    1.0,
                    MatMut::from_slice(c, m, n, Layout::RowMajor)?,
                )
            },
        ),
    ];

    if let Some(params) = args.custom_params() {
        let config = Gemm::new(params).with_threads(args.threads);
        methods.push(method(
            "Blocked (custom)",
            Some(params),
            move |a, b, c, m, n, k| {
                config.run(
                    1.0,
                    MatRef::from_slice(a, m, k, Layout::RowMajor)?,
                    MatRef::from_slice(b, k, n, Layout::RowMajor)?,
                    1.0,
                    MatMut::from_slice(c, m, n, Layout::RowMajor)?,
                )
            },
        ));
    }

    for &kind in available {
        for threads in [1, args.threads] {
            let label = if threads == 1 {
                kind.name().to_string()
            } else {
                format!("{} MT", kind.name())
            };
            methods.push(method(
                label,
                Some(kind.params()),
                move |a, b, c, m, n, k| {
                    dispatch::run_f64(
                        kind,
                        threads,
                        1.0,
                        MatRef::from_slice(a, m, k, Layout::RowMajor)?,
                        MatRef::from_slice(b, k, n, Layout::RowMajor)?,
                        1.0,
                        MatMut::from_slice(c, m, n, Layout::RowMajor)?,
                    )
                },
            ));
            if args.threads <= 1 {
                break;
            }
        }
    }

    methods
}

/// Time one method: a warmup run, then the average of `iterations` runs.
///
/// Returns `(milliseconds, GFLOPS)`.
fn bench_fn<F>(
    a: &[f64],
    b: &[f64],
    m: usize,
    n: usize,
    k: usize,
    iterations: usize,
    f: F,
) -> blocked_gemm::Result<(f64, f64)>
where
    F: Fn(&[f64], &[f64], &mut [f64], usize, usize, usize) -> blocked_gemm::Result<()>,
{
    // Warmup
    let mut c = vec![0.0; m * n];
    f(a, b, &mut c, m, n, k)?;

    let iterations = iterations.max(1);
    let mut total = 0.0;
    for _ in 0..iterations {
        let mut c = vec![0.0; m * n];
        let start = Instant::now();
        f(a, b, &mut c, m, n, k)?;
        total += start.elapsed().as_secs_f64();
    }

    let avg = total / iterations as f64;
    let gflops = 2.0 * (m * n * k) as f64 / avg / 1e9;
    Ok((avg * 1000.0, gflops))
}

fn print_size_tables(sizes: &[usize], records: &[BenchRecord]) {
    for &size in sizes {
        println!("Matrix: {}×{}", size, size);
        println!("{}", "-".repeat(56));
        for (i, r) in records.iter().filter(|r| r.size == size).enumerate() {
            println!(
                "{:2}. {:20} {:9.2} ms  {:6.2} GFLOPS  ({:.1}×)",
                i + 1,
                r.method,
                r.time_ms,
                r.gflops,
                r.speedup
            );
        }
        println!();
    }
}

fn print_summary_table(sizes: &[usize], methods: &[Method<'_>], records: &[BenchRecord]) {
    let width = 22 + 16 * sizes.len() + 12;
    println!("\n{}", "=".repeat(width));
    println!("SUMMARY");
    println!("{}", "=".repeat(width));

    print!("\n{:<22}", "Method");
    for size in sizes {
        print!(" {:>15}", format!("{}×{}", size, size));
    }
    println!(" {:>11}", "Speedup");
    println!("{}", "-".repeat(width));

    for (name, _, _) in methods {
        let rows: Vec<&BenchRecord> = records.iter().filter(|r| &r.method == name).collect();
        if rows.is_empty() {
            continue;
        }
        print!("{:<22}", name);
        for r in &rows {
            print!(" {:>12.2} GF", r.gflops);
        }
        let avg_speedup = rows.iter().map(|r| r.speedup).sum::<f64>() / rows.len() as f64;
        println!(" {:>10.1}×", avg_speedup);
    }

    println!("{}", "=".repeat(width));
    println!("\nGF = GFLOPS (billion floating point operations per second)");
    println!("Speedup relative to Naive (i-j-k). Higher is better.\n");
}
