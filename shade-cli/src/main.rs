//! SHADE CLI
//!
//! Command-line interface for the SHADE stealth address protocol.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shade_core::traits::AnnouncementRegistry;
use shade_core::types::{EthAddress, KeyPair, MetaAddress, PublicKey, RecipientKeys};
use shade_crypto::generate_keypair;
use shade_registry::{FileRegistry, MemoryRegistry};
use shade_scanner::{ProgressCallback, ScanReport, Scanner, ScannerConfig};
use shade_stealth::{create_stealth_payment, StealthPaymentBuilder, ShadeWallet};

/// SHADE - ERC-5564 stealth addresses
#[derive(Parser)]
#[command(name = "shade")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate new recipient keys
    Generate {
        /// Output file for keys (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a stealth payment for a meta-address
    Create {
        /// Recipient's meta-address (st:eth:0x...)
        recipient: String,
        /// Publish the announcement to this registry file
        #[arg(short, long, env = "SHADE_REGISTRY")]
        registry: Option<PathBuf>,
        /// Account emitting the announcement
        #[arg(long)]
        caller: Option<String>,
        /// Block number to record on the announcement
        #[arg(long)]
        block: Option<u64>,
        /// Print every derivation step
        #[arg(long)]
        trace: bool,
    },

    /// Scan announcements for payments
    Scan {
        /// Path to keys file
        #[arg(short, long, env = "SHADE_KEYS")]
        keys: PathBuf,
        /// Path to registry file
        #[arg(short, long, env = "SHADE_REGISTRY")]
        registry: PathBuf,
        /// Scan registry pages on all cores
        #[arg(long)]
        parallel: bool,
        /// Lowest block to scan (inclusive)
        #[arg(long)]
        from_block: Option<u64>,
        /// Highest block to scan (inclusive)
        #[arg(long)]
        to_block: Option<u64>,
        /// Registry page size
        #[arg(long, default_value_t = shade_core::DEFAULT_SCAN_BATCH_SIZE)]
        batch_size: usize,
        /// Print recovered stealth private keys
        #[arg(long)]
        show_keys: bool,
    },

    /// Run a synthetic scan benchmark
    Bench {
        /// Number of announcements to generate
        #[arg(short, long, default_value = "10000")]
        count: usize,
        /// Scan on all cores
        #[arg(long)]
        parallel: bool,
    },
}

/// On-disk key file written by `generate` and read by `scan`.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    spending_sk: String,
    viewing_sk: String,
    spending_pk: PublicKey,
    viewing_pk: PublicKey,
    meta_address: MetaAddress,
}

impl KeyFile {
    fn from_keys(keys: &RecipientKeys) -> Self {
        Self {
            spending_sk: keys.spending.secret.to_hex().to_string(),
            viewing_sk: keys.viewing.secret.to_hex().to_string(),
            spending_pk: keys.spending.public,
            viewing_pk: keys.viewing.public,
            meta_address: keys.meta_address(),
        }
    }

    fn into_keys(self) -> Result<RecipientKeys> {
        let spending = KeyPair::from_secret_hex(&self.spending_sk).context("Invalid spending_sk")?;
        let viewing = KeyPair::from_secret_hex(&self.viewing_sk).context("Invalid viewing_sk")?;

        if spending.public != self.spending_pk || viewing.public != self.viewing_pk {
            bail!("Key file is inconsistent: public keys do not match the secret keys");
        }

        let keys = RecipientKeys::new(spending, viewing);
        if keys.meta_address() != self.meta_address {
            bail!("Key file is inconsistent: meta-address does not match the keys");
        }
        Ok(keys)
    }

    fn load(path: &Path) -> Result<RecipientKeys> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open keys file {}", path.display()))?;
        let key_file: KeyFile =
            serde_json::from_reader(file).context("Failed to parse keys file")?;
        key_file.into_keys()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "info,shade=debug,shade_stealth=debug,shade_registry=debug,shade_scanner=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Generate { output } => cmd_generate(output),
        Commands::Create {
            recipient,
            registry,
            caller,
            block,
            trace,
        } => cmd_create(&recipient, registry.as_deref(), caller.as_deref(), block, trace).await,
        Commands::Scan {
            keys,
            registry,
            parallel,
            from_block,
            to_block,
            batch_size,
            show_keys,
        } => {
            let mut config = ScannerConfig::new().batch_size(batch_size).parallel(parallel);
            if let Some(from) = from_block {
                config = config.from_block(from);
            }
            if let Some(to) = to_block {
                config = config.to_block(to);
            }
            cmd_scan(&keys, &registry, config, show_keys).await
        }
        Commands::Bench { count, parallel } => cmd_bench(count, parallel).await,
    }
}

/// Generate new recipient keys
fn cmd_generate(output: Option<PathBuf>) -> Result<()> {
    println!("{}", "🔑 Generating SHADE keys...".cyan().bold());

    let keys = RecipientKeys::new(generate_keypair(), generate_keypair());
    let key_file = KeyFile::from_keys(&keys);
    let json = serde_json::to_string_pretty(&key_file)?;

    if let Some(path) = output {
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write keys to {}", path.display()))?;
        println!("{} {}", "✅ Keys saved to:".green(), path.display());
    } else {
        println!("\n{}", "Keys (JSON):".yellow().bold());
        println!("{}", json);
    }

    println!("\n{}", "Meta-address (publish this):".yellow().bold());
    println!("   {}", keys.meta_address());

    println!("\n{}", "⚠️  IMPORTANT: Keep your secret keys safe!".red().bold());
    println!("   spending_sk controls funds; viewing_sk reveals which payments are yours.");

    Ok(())
}

/// Create a stealth payment
async fn cmd_create(
    recipient: &str,
    registry_path: Option<&Path>,
    caller: Option<&str>,
    block: Option<u64>,
    trace: bool,
) -> Result<()> {
    println!("{} {}", "💸 Creating stealth payment to:".cyan().bold(), recipient);

    let meta: MetaAddress = recipient.parse().context("Invalid meta-address")?;

    let mut builder = StealthPaymentBuilder::new().recipient(meta);
    if let Some(caller) = caller {
        let caller: EthAddress = caller.parse().context("Invalid caller address")?;
        builder = builder.caller(caller);
    }

    let mut payment = if trace {
        let (payment, steps) = builder
            .build_traced(&mut OsRng)
            .context("Failed to create stealth payment")?;
        println!("\n{}", "🧮 Derivation:".yellow().bold());
        for line in steps.to_string().lines() {
            println!("   {}", line.dimmed());
        }
        payment
    } else {
        builder.build().context("Failed to create stealth payment")?
    };
    payment.announcement.block_number = block;

    println!("\n{}", "✅ Stealth payment created:".green().bold());
    println!("   {} {}", "Address:".yellow(), payment.stealth_address);
    println!("   {} 0x{:02x}", "View tag:".dimmed(), payment.view_tag);
    println!("   {} {}", "Ephemeral key:".dimmed(), PublicKey::from_bytes(&payment.announcement.ephemeral_public_key)?);

    println!("\n{}", "📋 Announcement (JSON):".yellow().bold());
    println!("{}", serde_json::to_string_pretty(&payment.announcement)?);

    if let Some(path) = registry_path {
        let registry = FileRegistry::new(path)
            .await
            .with_context(|| format!("Failed to open registry {}", path.display()))?;
        let id = registry
            .publish(payment.announcement.clone())
            .await
            .context("Failed to publish announcement")?;
        registry.save().await.context("Failed to save registry")?;
        info!(id, view_tag = payment.view_tag, registry = %path.display(), "Published announcement");
        println!("\n{} #{} → {}", "📣 Published announcement".green(), id, path.display());
    } else {
        println!("\n{}", "ℹ️  Next steps:".cyan());
        println!("   1. Send funds to the stealth address above");
        println!("   2. Publish the announcement (use --registry to store it locally)");
    }

    Ok(())
}

/// Scan a registry file for payments
async fn cmd_scan(
    keys_path: &Path,
    registry_path: &Path,
    config: ScannerConfig,
    show_keys: bool,
) -> Result<()> {
    println!("{}", "🔎 Scanning for payments...".cyan().bold());

    let keys = KeyFile::load(keys_path)?;

    println!("   Loading registry from: {}", registry_path.display());
    let registry = FileRegistry::new(registry_path)
        .await
        .with_context(|| format!("Failed to load registry {}", registry_path.display()))?;

    let count = registry.count().await?;
    debug!(count, registry = %registry_path.display(), "Loaded registry");
    if count == 0 {
        println!("\n{}", "⚠️  Registry is empty. No announcements to scan.".yellow());
        return Ok(());
    }

    let scanner = Scanner::new(keys);
    let report = scan_with_bar(&scanner, &registry, config, count).await?;

    print_report(&report, show_keys);
    Ok(())
}

/// Run a synthetic scan benchmark
async fn cmd_bench(count: usize, parallel: bool) -> Result<()> {
    println!("{} {} announcements", "📊 Benchmarking with".cyan().bold(), count);

    println!("\n{}", "1. Generating keys...".dimmed());
    let start = Instant::now();
    let wallet = ShadeWallet::generate();
    let stranger = ShadeWallet::generate();
    println!("   ✓ Key generation: {:?}", start.elapsed());

    println!("\n{}", "2. Creating announcements...".dimmed());
    let registry = MemoryRegistry::with_capacity(count);
    let pb = bar(count as u64, "   [{bar:40.cyan/blue}] {pos}/{len}")?;

    let start = Instant::now();
    let mut expected = 0;
    for i in 0..count {
        // One in a hundred is ours
        let target = if i % 100 == 0 {
            expected += 1;
            wallet.meta_address()
        } else {
            stranger.meta_address()
        };
        let payment = create_stealth_payment(target)?;
        registry.publish(payment.announcement).await?;
        pb.inc(1);
    }
    pb.finish();
    println!("   ✓ Created {} announcements: {:?}", count, start.elapsed());

    println!("\n{}", "3. Scanning...".dimmed());
    let scanner = Scanner::from_wallet(wallet);
    let report = scanner
        .scan_with_config(&registry, ScannerConfig::new().parallel(parallel))
        .await?;
    let summary = &report.summary;

    println!(
        "   ✓ Scanned {} announcements: {} ms",
        summary.total_scanned, summary.duration_ms
    );
    println!("   ✓ Found {} payments", report.discoveries.len());

    println!("\n{}", "📈 Results:".green().bold());
    println!("   Scan rate: {:.0} announcements/sec", summary.rate);
    println!("   View-tag filter: {:.2}% skipped", summary.filter_efficiency);
    if summary.total_scanned > 0 {
        println!(
            "   Time per announcement: {:.2}µs",
            summary.duration_ms as f64 * 1000.0 / summary.total_scanned as f64
        );
    }

    if report.discoveries.len() == expected {
        println!("   {} All expected payments found!", "✅".green());
    } else {
        println!(
            "   {} Expected {}, found {}",
            "❌".red(),
            expected,
            report.discoveries.len()
        );
    }

    Ok(())
}

fn bar(len: u64, template: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(template)?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

async fn scan_with_bar(
    scanner: &Scanner,
    registry: &dyn AnnouncementRegistry,
    config: ScannerConfig,
    total: u64,
) -> Result<ScanReport> {
    let pb = bar(total, "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?;

    let progress_bar = pb.clone();
    let callback: ProgressCallback = Box::new(move |progress| {
        progress_bar.set_position(progress.scanned);
    });

    let report = scanner
        .scan_with_progress(registry, config, callback)
        .await
        .context("Scan failed")?;
    pb.finish_and_clear();
    Ok(report)
}

fn print_report(report: &ScanReport, show_keys: bool) {
    let summary = &report.summary;
    println!(
        "\n   Scanned {} announcement(s) in {} ms, {} view-tag match(es)",
        summary.total_scanned, summary.duration_ms, summary.view_tag_matches
    );

    if report.discoveries.is_empty() {
        println!("\n{}", "No payments found.".yellow());
    } else {
        println!(
            "\n{} {} payment(s) found:",
            "✅".green(),
            report.discoveries.len()
        );
        for discovery in &report.discoveries {
            println!("   {} {}", "Address:".green(), discovery.keys.address);
            println!("      Announcement #{}", discovery.announcement.id);
            if let Some(block) = discovery.announcement.block_number {
                println!("      Block {}", block);
            }
            if show_keys {
                println!(
                    "      {} 0x{}",
                    "Private key:".red(),
                    discovery.keys.private_key.to_hex().as_str()
                );
            }
        }
    }

    if !report.failures.is_empty() {
        println!(
            "\n{} {} announcement(s) could not be scanned:",
            "⚠️ ".yellow(),
            report.failures.len()
        );
        for failure in &report.failures {
            let label = if failure.error.is_protocol_inconsistency() {
                "mismatch".red()
            } else {
                "invalid".yellow()
            };
            println!(
                "   #{} [{}] {}",
                failure.announcement_id, label, failure.error
            );
        }
    }
}
