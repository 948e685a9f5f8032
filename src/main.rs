//! osse: encrypt a corpus, run one encrypted conjunctive query over it and
//! print the obfuscated matches.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use osse::{
    observe, EncryptedDatabase, KeySource, Osse, OsseConfig, Result, SearchResults,
};

#[derive(Parser)]
#[command(name = "osse")]
#[command(about = "Obfuscated searchable symmetric encryption")]
#[command(version)]
struct Args {
    /// Corpus file, one document of whitespace-separated keywords per line
    #[arg(short, long)]
    db: Option<PathBuf>,

    /// Query keywords. A random query is drawn from the corpus if omitted
    #[arg(short, long, num_args = 1..)]
    query: Option<Vec<String>>,

    /// Check every ciphertext and the search result against the plaintext
    #[arg(short, long)]
    test: bool,

    /// Permutation key file
    #[arg(long)]
    pk: Option<PathBuf>,

    /// Inverse permutation key file
    #[arg(long)]
    ik: Option<PathBuf>,

    /// fresh, ephemeral or stored
    #[arg(long)]
    key_source: Option<KeySource>,

    /// Bit length of each secret prime
    #[arg(long)]
    prime_bits: Option<u64>,
}

impl Args {
    fn into_config(self, mut config: OsseConfig) -> OsseConfig {
        if let Some(db) = self.db {
            config.db_path = db;
        }
        if let Some(pk) = self.pk {
            config.permutation_key_path = pk;
        }
        if let Some(ik) = self.ik {
            config.inverse_key_path = ik;
        }
        if let Some(source) = self.key_source {
            config.key_source = source;
        }
        if let Some(bits) = self.prime_bits {
            config.engine.prime_bits = bits;
        }
        config
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            if err.is_configuration() {
                error!("configuration error: {}", err);
            } else {
                error!("{}", err);
            }
            ExitCode::from(1)
        }
    }
}

fn run(mut args: Args) -> Result<bool> {
    let query = args.query.take();
    let test = args.test;
    let config = args.into_config(OsseConfig::from_env()?);
    config.validate()?;

    let osse = Osse::from_config(&config, observe::tracing_observer())?;
    info!(
        documents = osse.database().len(),
        keywords = osse.database().universe().len(),
        "corpus loaded"
    );

    let (edb, eidx) = osse.setup()?;

    let keywords = match query {
        Some(keywords) => keywords,
        None => osse.random_query()?,
    };
    let c = osse.query(&keywords)?;
    let results = osse.execute(&edb, &eidx, &c)?;

    println!("Query: {:?}", keywords);
    println!("Results: {:?}", results.ids);

    if test {
        return self_check(&osse, &edb, &keywords, &results);
    }
    Ok(true)
}

/// Decrypts every document and compares the recovered matches with a
/// plaintext search.
fn self_check(
    osse: &Osse,
    edb: &EncryptedDatabase,
    keywords: &[String],
    results: &SearchResults,
) -> Result<bool> {
    let db = osse.database();
    let universe = db.universe();
    let mut ok = true;

    for (id, (doc, c)) in db.documents().iter().zip(edb.iter()).enumerate() {
        let expected = universe.vectorize(doc).complement();
        if osse.decrypt(c)? != expected {
            warn!(id, "document ciphertext does not decrypt to its absence vector");
            ok = false;
        }
    }

    let expected: Vec<usize> = db
        .documents()
        .iter()
        .enumerate()
        .filter(|(_, doc)| keywords.iter().all(|kw| doc.contains(kw)))
        .map(|(id, _)| id)
        .collect();
    let recovered = results.recover();
    if recovered != expected {
        warn!(?expected, ?recovered, "search result differs from plaintext search");
        ok = false;
    }

    if ok {
        info!(documents = db.len(), matches = recovered.len(), "self-check passed");
    } else {
        error!("self-check failed");
    }
    Ok(ok)
}
