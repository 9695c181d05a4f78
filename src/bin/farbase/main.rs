// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! FarBase CLI.
//!
//! One subcommand per pipeline stage: exact ground truth, index builds for
//! both flavours, index queries, and the paged linear-scan baseline. All
//! fatal errors exit with status 1.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

mod commands;

use commands::{build, linear, query, truth};

#[derive(Parser)]
#[command(name = "farbase")]
#[command(version)]
#[command(about = "External-memory c-k-AFN search (RQALSH / RQALSH*)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute exact top-10 furthest neighbors by brute force
    GroundTruth {
        /// Number of data objects
        #[arg(short)]
        n: usize,

        /// Number of query objects
        #[arg(long)]
        qn: usize,

        /// Dimensionality
        #[arg(short)]
        d: usize,

        /// Data set (text, one object per line)
        #[arg(long)]
        ds: PathBuf,

        /// Query set (text)
        #[arg(long)]
        qs: PathBuf,

        /// Truth set to write
        #[arg(long)]
        ts: PathBuf,
    },

    /// Build an RQALSH* index (Drusilla selection + inner RQALSH)
    BuildStar {
        /// Number of data objects
        #[arg(short)]
        n: usize,

        /// Dimensionality
        #[arg(short)]
        d: usize,

        /// Page size in bytes
        #[arg(short = 'B', long = "B")]
        page: usize,

        /// Number of Drusilla projections
        #[arg(short = 'L', long = "L")]
        l: usize,

        /// Candidates kept per projection
        #[arg(short = 'M', long = "M")]
        m: usize,

        /// False-positive numerator (rate is beta/n)
        #[arg(long)]
        beta: usize,

        /// Error probability in (0, 1)
        #[arg(long)]
        delta: f32,

        /// Approximation ratio c > 1
        #[arg(short)]
        c: f32,

        /// Data set (text)
        #[arg(long)]
        ds: PathBuf,

        /// Data folder for the paged dataset
        #[arg(long)]
        df: PathBuf,

        /// Output folder for index artifacts
        #[arg(long)]
        of: PathBuf,
    },

    /// Query an RQALSH* index
    QueryStar {
        /// Number of query objects
        #[arg(long)]
        qn: usize,

        /// Dimensionality
        #[arg(short)]
        d: usize,

        /// Number of Drusilla projections (names the index directory)
        #[arg(short = 'L', long = "L")]
        l: usize,

        /// Candidates kept per projection
        #[arg(short = 'M', long = "M")]
        m: usize,

        /// Query set (text)
        #[arg(long)]
        qs: PathBuf,

        /// Truth set (text)
        #[arg(long)]
        ts: PathBuf,

        /// Data folder holding the paged dataset
        #[arg(long)]
        df: PathBuf,

        /// Output folder with the index artifacts
        #[arg(long)]
        of: PathBuf,
    },

    /// Build an RQALSH index
    Build {
        /// Number of data objects
        #[arg(short)]
        n: usize,

        /// Dimensionality
        #[arg(short)]
        d: usize,

        /// Page size in bytes
        #[arg(short = 'B', long = "B")]
        page: usize,

        /// False-positive numerator (rate is beta/n)
        #[arg(long)]
        beta: usize,

        /// Error probability in (0, 1)
        #[arg(long)]
        delta: f32,

        /// Approximation ratio c > 1
        #[arg(short)]
        c: f32,

        /// Data set (text)
        #[arg(long)]
        ds: PathBuf,

        /// Data folder for the paged dataset
        #[arg(long)]
        df: PathBuf,

        /// Output folder for index artifacts
        #[arg(long)]
        of: PathBuf,
    },

    /// Query an RQALSH index
    Query {
        /// Number of query objects
        #[arg(long)]
        qn: usize,

        /// Dimensionality
        #[arg(short)]
        d: usize,

        /// Query set (text)
        #[arg(long)]
        qs: PathBuf,

        /// Truth set (text)
        #[arg(long)]
        ts: PathBuf,

        /// Data folder holding the paged dataset
        #[arg(long)]
        df: PathBuf,

        /// Output folder with the index artifacts
        #[arg(long)]
        of: PathBuf,
    },

    /// Exact k-FN by paged linear scan
    Linear {
        /// Number of data objects
        #[arg(short)]
        n: usize,

        /// Number of query objects
        #[arg(long)]
        qn: usize,

        /// Dimensionality
        #[arg(short)]
        d: usize,

        /// Page size in bytes
        #[arg(short = 'B', long = "B")]
        page: usize,

        /// Query set (text)
        #[arg(long)]
        qs: PathBuf,

        /// Truth set (text)
        #[arg(long)]
        ts: PathBuf,

        /// Data folder holding the paged dataset
        #[arg(long)]
        df: PathBuf,

        /// Output folder for result files
        #[arg(long)]
        of: PathBuf,
    },
}

fn main() {
    env_logger::init();

    // Parse failures print usage; every failure path exits 1.
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        let _ = e.print();
        process::exit(1);
    });

    if let Err(e) = run(cli) {
        eprintln!("farbase: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::GroundTruth { n, qn, d, ds, qs, ts } => truth::execute(n, qn, d, &ds, &qs, &ts),

        Commands::BuildStar {
            n,
            d,
            page,
            l,
            m,
            beta,
            delta,
            c,
            ds,
            df,
            of,
        } => build::execute_star(n, d, page, l, m, beta, delta, c, &ds, &df, &of),

        Commands::QueryStar {
            qn,
            d,
            l,
            m,
            qs,
            ts,
            df,
            of,
        } => query::execute_star(qn, d, l, m, &qs, &ts, &df, &of),

        Commands::Build {
            n,
            d,
            page,
            beta,
            delta,
            c,
            ds,
            df,
            of,
        } => build::execute(n, d, page, beta, delta, c, &ds, &df, &of),

        Commands::Query { qn, d, qs, ts, df, of } => query::execute(qn, d, &qs, &ts, &df, &of),

        Commands::Linear {
            n,
            qn,
            d,
            page,
            qs,
            ts,
            df,
            of,
        } => linear::execute(n, qn, d, page, &qs, &ts, &df, &of),
    }
}
