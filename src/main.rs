// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use sqldump_masker::{mask_dump, DigitSource, PolicyTable};

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Masking table of the `individu` export
    Individu,
}

#[derive(Parser)]
#[command(name = "sqldump-masker")]
#[command(author, version, about = "Mask sensitive INSERT values in SQL dumps")]
struct Cli {
    /// Dump to read (defaults to stdin)
    input: Option<PathBuf>,

    /// Where to write the masked dump (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Column policies, e.g. `0=code15,1=mask,2=mask:2:#:4,18=id16`
    #[arg(short, long, conflicts_with = "preset")]
    policy: Option<PolicyTable>,

    /// Use a built-in policy table
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Seed for synthetic identifiers, for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let policy = match (cli.policy, cli.preset) {
        (Some(policy), _) => policy,
        (None, Some(Preset::Individu)) => PolicyTable::individu(),
        (None, None) => PolicyTable::new(),
    };
    if policy.is_empty() {
        warn!("no column policy given, values will only be re-quoted");
    }
    info!("column policy: {}", policy);

    let mut source: Box<dyn DigitSource> = match cli.seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(StdRng::from_entropy()),
    };

    let mut input: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let mut output: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    mask_dump(&mut *input, &mut *output, &policy, &mut *source)?;

    Ok(())
}
