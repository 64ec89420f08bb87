use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, post, put, web};
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use rs_lm_core::corpus::CorpusKind;
use rs_lm_core::io::{get_filename, list_files, normalize_folder};
use rs_lm_core::model::config::DEFAULT_CUTOFF;
use rs_lm_core::{
	Discount, GenerationConfig, Generator, LanguageModel, LmError, ModelConfig, Order, PerplexityScorer, WeightSource,
};

#[derive(Parser, Debug)]
#[command(name = "rs-lm-server", version, about = "HTTP front end for n-gram language models")]
struct ServerArgs {
	/// Directory holding the `*.txt` corpora
	#[arg(long, value_name = "DIR", default_value = "./data")]
	data: String,

	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	#[arg(long, default_value_t = 5000)]
	port: u16,

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

/// Query parameters of the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	order: Option<String>,
	raw: Option<bool>,
	max_steps: Option<usize>,
}

#[derive(Deserialize)]
struct CorpusQuery {
	name: Option<String>,
	kind: Option<String>,
}

#[derive(Serialize)]
struct Stats {
	corpus: String,
	sentences: u64,
	tokens: u64,
	vocabulary: usize,
	unigram_types: usize,
	bigram_types: usize,
	trigram_types: Option<usize>,
	cutoff: usize,
	discount: Discount,
}

struct SharedData {
	data_dir: PathBuf,
	config: ModelConfig,
	corpus: Option<String>,
	model: Option<LanguageModel>,
}

impl SharedData {
	fn new(data_dir: PathBuf, config: ModelConfig) -> Self {
		Self { data_dir, config, corpus: None, model: None }
	}
}

/// Maps a core error onto an HTTP response.
fn error_response(e: &LmError) -> HttpResponse {
	match e {
		LmError::Io { .. } => HttpResponse::NotFound().body(e.to_string()),
		LmError::InvalidConfig(_) | LmError::EmptyText | LmError::OrderNotTrained(_) => {
			HttpResponse::BadRequest().body(e.to_string())
		}
		_ => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

fn no_model() -> HttpResponse {
	HttpResponse::Conflict().body("No corpus loaded, call /v1/load_corpus first")
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates one sentence from the loaded model. `order` defaults to bigram,
/// `raw` samples raw counts instead of smoothed masses.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let order = match query.order.as_deref().map(str::parse::<Order>).transpose() {
		Ok(order) => order.unwrap_or(Order::Bigram),
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	let weights = if query.raw.unwrap_or(false) { WeightSource::Raw } else { WeightSource::Smoothed };
	let mut config = GenerationConfig::builder().weights(weights);
	if let Some(max_steps) = query.max_steps {
		config = config.max_steps(max_steps);
	}
	let config = match config.build() {
		Ok(config) => config,
		Err(e) => return error_response(&e),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let Some(model) = shared_data.model.as_ref() else {
		return no_model();
	};

	let generated = Generator::new(model, config).and_then(|generator| generator.sentence(order, &mut rand::rng()));
	match generated {
		Ok(sentence) => HttpResponse::Ok().body(sentence),
		Err(e) => error_response(&e),
	}
}

/// HTTP POST endpoint `/v1/perplexity`
///
/// Scores the request body and returns the JSON report.
#[post("/v1/perplexity")]
async fn post_perplexity(data: web::Data<Mutex<SharedData>>, body: String) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let Some(model) = shared_data.model.as_ref() else {
		return no_model();
	};

	match PerplexityScorer::new(model).score(&body) {
		Ok(report) => HttpResponse::Ok().json(report),
		Err(e) => error_response(&e),
	}
}

#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let data_dir = match data.lock() {
		Ok(m) => m.data_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match list_files(&data_dir, "txt") {
		Ok(files) => {
			let names: Vec<String> = files.iter().filter_map(|file| get_filename(file).ok()).collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let (Some(model), Some(corpus)) = (shared_data.model.as_ref(), shared_data.corpus.as_ref()) else {
		return no_model();
	};

	let counts = model.counts();
	HttpResponse::Ok().json(Stats {
		corpus: corpus.clone(),
		sentences: counts.sentence_count(),
		tokens: counts.token_count(),
		vocabulary: model.vocabulary_size(),
		unigram_types: counts.observed_types(Order::Unigram),
		bigram_types: counts.observed_types(Order::Bigram),
		trigram_types: model.has_order(Order::Trigram).then(|| counts.observed_types(Order::Trigram)),
		cutoff: model.config().cutoff,
		discount: model.config().discount,
	})
}

/// HTTP PUT endpoint `/v1/load_corpus`
///
/// Trains a new model from `<data>/<name>.txt` and replaces the loaded one.
/// Training runs without holding the lock.
#[put("/v1/load_corpus")]
async fn put_corpus(data: web::Data<Mutex<SharedData>>, query: web::Query<CorpusQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};
	if name.contains(['/', '\\']) || name.contains("..") {
		return HttpResponse::BadRequest().body("Corpus name must not contain a path");
	}
	let kind = match query.kind.as_deref().map(str::parse::<CorpusKind>).transpose() {
		Ok(kind) => kind.unwrap_or_default(),
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	let (path, config) = match data.lock() {
		Ok(m) => (m.data_dir.join(format!("{}.txt", name)), m.config.clone()),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let model = match LanguageModel::from_file(&path, kind, config) {
		Ok(model) => model,
		Err(e) => {
			warn!("failed to load corpus {}: {}", name, e);
			return error_response(&e);
		}
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	shared_data.model = Some(model);
	shared_data.corpus = Some(name.to_owned());
	info!("corpus {} loaded", name);

	HttpResponse::Ok().body("Corpus loaded successfully")
}

/// Main entry point for the server.
///
/// Starts with no model loaded; corpora are trained on demand through
/// `/v1/load_corpus` with the smoothing settings given on the command line.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = ServerArgs::parse();

	let config = ModelConfig::builder()
		.cutoff(args.cutoff)
		.discount(args.discount)
		.trigrams(args.trigrams)
		.build()
		.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

	let shared_data = SharedData::new(normalize_folder(&args.data), config);
	let shared_model = web::Data::new(Mutex::new(shared_data));
	info!("serving on {}:{}", args.host, args.port);

	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(post_perplexity)
			.service(get_corpora)
			.service(get_stats)
			.service(put_corpus)
	})
	.bind((args.host.as_str(), args.port))?
	.run()
	.await
}
