use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use log::{LevelFilter, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use rs_lm_core::corpus::{CorpusKind, parse_reviews};
use rs_lm_core::io::read_to_string;
use rs_lm_core::model::config::{DEFAULT_CUTOFF, DEFAULT_MAX_STEPS};
use rs_lm_core::model::smoothing::Smoothed;
use rs_lm_core::{Discount, GenerationConfig, Generator, LanguageModel, ModelConfig, Order, PerplexityScorer, WeightSource};

mod classify;

use classify::ReviewClassifier;

#[derive(Parser, Debug)]
#[command(name = "rs-lm", version, about = "N-gram language models with Good-Turing smoothing")]
struct Cli {
	/// Increase verbosity (-v, -vv)
	#[arg(short = 'v', long, global = true, action = ArgAction::Count)]
	verbose: u8,

	/// Decrease verbosity (-q, -qq)
	#[arg(short = 'q', long, global = true, action = ArgAction::Count)]
	quiet: u8,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Generate random sentences from a trained model
	Generate(GenerateArgs),
	/// Score a held-out text
	Perplexity(PerplexityArgs),
	/// Print counts, smoothed masses and discount tables
	Dump(DumpArgs),
	/// Label hotel reviews as truthful (1) or deceptive (0)
	Classify(ClassifyArgs),
}

#[derive(Args, Debug)]
struct SmoothingArgs {
	/// Counts below this value are discounted
	#[arg(long, value_name = "K", default_value_t = DEFAULT_CUTOFF)]
	cutoff: usize,

	/// Discounting strategy (good-turing, katz, katz-standard)
	#[arg(long, value_name = "STRATEGY", default_value = "good-turing")]
	discount: Discount,

	/// Also count and smooth trigrams
	#[arg(long)]
	trigrams: bool,
}

impl SmoothingArgs {
	fn model_config(&self) -> rs_lm_core::Result<ModelConfig> {
		ModelConfig::builder()
			.cutoff(self.cutoff)
			.discount(self.discount)
			.trigrams(self.trigrams)
			.build()
	}
}

#[derive(Args, Debug)]
struct ModelArgs {
	/// Training corpus
	#[arg(long, value_name = "FILE")]
	corpus: PathBuf,

	/// Corpus layout (bible, hotel, plain)
	#[arg(long, value_name = "KIND", default_value = "plain")]
	kind: CorpusKind,

	#[command(flatten)]
	smoothing: SmoothingArgs,
}

impl ModelArgs {
	fn train(&self) -> rs_lm_core::Result<LanguageModel> {
		LanguageModel::from_file(&self.corpus, self.kind, self.smoothing.model_config()?)
	}
}

#[derive(Args, Debug)]
struct GenerateArgs {
	#[command(flatten)]
	model: ModelArgs,

	/// N-gram order to generate with (unigram, bigram, trigram)
	#[arg(long, value_name = "ORDER", default_value = "bigram")]
	order: Order,

	/// Number of sentences
	#[arg(short = 'n', long, value_name = "N", default_value_t = 1)]
	count: usize,

	/// Sample from raw counts instead of smoothed masses
	#[arg(long)]
	raw: bool,

	/// Seed for reproducible output
	#[arg(long, value_name = "SEED")]
	seed: Option<u64>,

	/// Maximum number of tokens per sentence
	#[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_STEPS)]
	max_steps: usize,
}

#[derive(Args, Debug)]
struct PerplexityArgs {
	#[command(flatten)]
	model: ModelArgs,

	/// Held-out text, read with the same layout as the corpus
	#[arg(long, value_name = "FILE")]
	test: PathBuf,

	/// Print the log-probability of every token
	#[arg(long)]
	trace: bool,
}

#[derive(Args, Debug)]
struct DumpArgs {
	#[command(flatten)]
	model: ModelArgs,

	/// Only dump this order
	#[arg(long, value_name = "ORDER")]
	order: Option<Order>,

	/// Maximum entries printed per order
	#[arg(long, value_name = "N", default_value_t = 20)]
	limit: usize,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
	/// Labelled reviews, `label,rating,text` per line
	#[arg(long, value_name = "FILE")]
	train: PathBuf,

	/// Reviews to label
	#[arg(long, value_name = "FILE")]
	test: PathBuf,

	#[command(flatten)]
	smoothing: SmoothingArgs,
}

/// Maps `-v`/`-q` onto a level filter; without either flag `RUST_LOG` applies.
fn level_filter(verbose: u8, quiet: u8) -> Option<LevelFilter> {
	match (verbose, quiet) {
		(0, 0) => None,
		(_, 1) => Some(LevelFilter::Error),
		(_, q) if q > 1 => Some(LevelFilter::Off),
		(1, _) => Some(LevelFilter::Info),
		(2, _) => Some(LevelFilter::Debug),
		_ => Some(LevelFilter::Trace),
	}
}

fn init_logging(verbose: u8, quiet: u8) {
	let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
	if let Some(level) = level_filter(verbose, quiet) {
		builder.filter_level(level);
	}
	let _ = builder.try_init();
}

fn run_generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
	let model = args.model.train()?;
	let weights = if args.raw { WeightSource::Raw } else { WeightSource::Smoothed };
	let config = GenerationConfig::builder().max_steps(args.max_steps).weights(weights).build()?;
	let generator = Generator::new(&model, config)?;

	let mut rng = match args.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_rng(&mut rand::rng()),
	};

	for _ in 0..args.count {
		println!("{}", generator.sentence(args.order, &mut rng)?);
	}
	Ok(())
}

fn run_perplexity(args: PerplexityArgs) -> Result<(), Box<dyn std::error::Error>> {
	let model = args.model.train()?;
	let text = args.model.kind.sentences(&read_to_string(&args.test)?).join("\n");
	let report = PerplexityScorer::new(&model).score(&text)?;
	info!("scored {} tokens from {}", report.token_count, args.test.display());

	if args.trace {
		for score in &report.trace {
			println!("{}\t{:.6}", score.token, score.log10_prob);
		}
	}
	println!("perplexity: {:.6}", report.perplexity);
	Ok(())
}

fn dump_order<K>(order: Order, counts: &HashMap<K, u64>, smoothed: &Smoothed<K>, limit: usize)
where
	K: Eq + Hash + Ord + Display,
{
	println!("== {} ==", order);
	println!("types: {}", counts.len());
	println!("unseen mass: {}", smoothed.unseen());
	println!("total mass: {}", smoothed.total());
	for (c, discounted) in smoothed.discounts().iter().enumerate() {
		println!("c*[{}] = {} (N_{} = {})", c, discounted, c, smoothed.frequency_table().get(c));
	}

	let mut entries: Vec<(&K, u64)> = counts.iter().map(|(key, count)| (key, *count)).collect();
	entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
	for (key, count) in entries.into_iter().take(limit) {
		println!("{}\t{}\t{}", key, count, smoothed.get_or_unseen(key));
	}
}

fn run_dump(args: DumpArgs) -> Result<(), Box<dyn std::error::Error>> {
	let model = args.model.train()?;
	let counts = model.counts();
	println!("sentences: {}", counts.sentence_count());
	println!("tokens: {}", counts.token_count());
	println!("vocabulary: {}", model.vocabulary_size());

	let wanted = |order: Order| args.order.is_none_or(|only| only == order);
	if wanted(Order::Unigram) {
		dump_order(Order::Unigram, counts.unigrams(), model.smoothed_unigrams(), args.limit);
	}
	if wanted(Order::Bigram) {
		dump_order(Order::Bigram, counts.bigrams(), model.smoothed_bigrams(), args.limit);
	}
	if wanted(Order::Trigram) {
		match (counts.trigrams(), model.smoothed_trigrams()) {
			(Some(raw), Some(smoothed)) => dump_order(Order::Trigram, raw, smoothed, args.limit),
			_ if args.order.is_some() => return Err(rs_lm_core::LmError::OrderNotTrained(Order::Trigram).into()),
			_ => (),
		}
	}
	Ok(())
}

fn run_classify(args: ClassifyArgs) -> Result<(), Box<dyn std::error::Error>> {
	let config = args.smoothing.model_config()?;
	let training = parse_reviews(&read_to_string(&args.train)?);
	let classifier = ReviewClassifier::train(&training, &config)?;
	let test = parse_reviews(&read_to_string(&args.test)?);
	info!("labelling {} reviews", test.len());
	classifier.print_labels(&test);
	Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let cli = Cli::parse();
	init_logging(cli.verbose, cli.quiet);

	match cli.command {
		Commands::Generate(args) => run_generate(args),
		Commands::Perplexity(args) => run_perplexity(args),
		Commands::Dump(args) => run_dump(args),
		Commands::Classify(args) => run_classify(args),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flags_override_the_environment_only_when_given() {
		assert_eq!(level_filter(0, 0), None);
		assert_eq!(level_filter(1, 0), Some(LevelFilter::Info));
		assert_eq!(level_filter(2, 0), Some(LevelFilter::Debug));
		assert_eq!(level_filter(5, 0), Some(LevelFilter::Trace));
		assert_eq!(level_filter(0, 1), Some(LevelFilter::Error));
		assert_eq!(level_filter(3, 2), Some(LevelFilter::Off));
	}
}
