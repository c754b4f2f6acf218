use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use docintel_core::clean::TextCleaner;
use docintel_core::config::{expand_path, Config, Settings};
use docintel_core::data_processor::DataProcessor;
use docintel_core::traits::{KeywordIndex, TextGenerator};
use docintel_core::Chunker;
use docintel_query::{suggest_strategy, QueryAnalyzer};
use docintel_rag::{ContextualGenerator, DocumentPipeline, PromptLibrary};
use docintel_retrieval::{chunk_statistics, retrieval_metrics, Retriever};
use docintel_text::TantivyKeywordIndex;
use docintel_vector::{HashEmbedder, MemoryVectorIndex};

const USAGE: &str = "Usage:
  docintel chunk <file> [recursive|semantic|sentence|paragraph]
  docintel analyze \"<query>\"
  docintel ask [<data_dir>] \"<query>\" [--hybrid] [--k N] [--show-prompt]

Without --hybrid the query intent decides how many chunks are retrieved.";

/// Offline stand-in for a text-generation service: answers with the first
/// cited chunk of the prompt's context.
struct ExtractiveAnswerer;

impl TextGenerator for ExtractiveAnswerer {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let Some(start) = prompt.find("[Source 1,") else { return Ok(String::new()) };
        let block = &prompt[start..];
        let body = block.split_once('\n').map_or("", |(_, rest)| rest);
        let end = ["\n\n---\n\n", "\n\nQuestion:"].iter().filter_map(|sep| body.find(sep)).min().unwrap_or(body.len());
        Ok(body[..end].trim().to_string())
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    args.remove(0);
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "chunk" => chunk_cmd(&settings, &args),
        "analyze" => analyze_cmd(&args),
        "ask" => ask_cmd(&settings, &args),
        _ => { eprintln!("Unknown command: {}\n{USAGE}", cmd); std::process::exit(1); }
    }
}

fn chunk_cmd(settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let Some(file) = args.first() else { bail!("chunk needs a file\n{USAGE}") };
    let mut chunking = settings.chunking.clone();
    if let Some(name) = args.get(1) { chunking.strategy = name.parse()?; }
    let content = fs::read_to_string(file).with_context(|| format!("reading {file}"))?;
    let chunker = Chunker::new(chunking)?;
    let chunks = chunker.chunk(&content, None);
    for c in &chunks {
        println!("#{} [{}..{}] ~{} tokens", c.id, c.start, c.end, c.token_count);
        println!("{}\n", c.text);
    }
    let stats = chunk_statistics(&chunks);
    println!("📊 {} chunks, avg {} chars (min {}, max {}), {} chars total", stats.total_chunks, stats.avg_chunk_size, stats.min_chunk_size, stats.max_chunk_size, stats.total_characters);
    Ok(())
}

fn analyze_cmd(args: &[String]) -> anyhow::Result<()> {
    let Some(query) = args.first() else { bail!("analyze needs a query\n{USAGE}") };
    let intent = QueryAnalyzer::new().with_expansion(true).analyze(query)?;
    println!("{}", serde_json::to_string_pretty(&intent)?);
    println!("{}", serde_json::to_string_pretty(&suggest_strategy(&intent))?);
    Ok(())
}

struct AskArgs { data_dir: PathBuf, query: String, hybrid: bool, k: Option<usize>, show_prompt: bool }

fn parse_ask_args(settings: &Settings, args: &[String]) -> anyhow::Result<AskArgs> {
    let mut positional = Vec::new();
    let (mut hybrid, mut k, mut show_prompt) = (false, None, false);
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--hybrid" => hybrid = true,
            "--show-prompt" => show_prompt = true,
            "--k" => {
                let value = args.get(i + 1).and_then(|v| v.parse::<usize>().ok());
                let Some(value) = value else { bail!("--k requires a number") };
                k = Some(value);
                i += 1;
            }
            other if !other.starts_with('-') => positional.push(other.to_string()),
            other => bail!("unknown flag {other}\n{USAGE}"),
        }
        i += 1;
    }
    let (data_dir, query) = match positional.as_slice() {
        [query] => (expand_path(&settings.data.raw_txt_dir), query.clone()),
        [dir, query] => (expand_path(dir), query.clone()),
        _ => bail!("ask needs a query\n{USAGE}"),
    };
    Ok(AskArgs { data_dir, query, hybrid, k, show_prompt })
}

fn keyword_index(settings: &Settings) -> anyhow::Result<TantivyKeywordIndex> {
    match &settings.data.keyword_index_dir {
        Some(dir) => TantivyKeywordIndex::create_in_dir(expand_path(dir)),
        None => TantivyKeywordIndex::in_memory(),
    }
}

fn ask_cmd(settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let ask = parse_ask_args(settings, args)?;
    let cleaner = settings.data.clean_text.then(TextCleaner::default);
    let processor = DataProcessor::new(Chunker::new(settings.chunking.clone())?).with_cleaner(cleaner);
    let mut retriever = Retriever::new(MemoryVectorIndex::new(Box::new(HashEmbedder::default())), settings.retrieval.clone());
    if ask.hybrid {
        let index: Box<dyn KeywordIndex> = Box::new(keyword_index(settings)?);
        retriever = retriever.with_keyword_index(index);
    }
    let prompts = match &settings.generation.prompts_file {
        Some(path) => PromptLibrary::from_toml(expand_path(path))?,
        None => PromptLibrary::new(),
    };
    let generator = ContextualGenerator::new(ExtractiveAnswerer, prompts, settings.generation.clone());
    let pipeline = DocumentPipeline::new(processor, retriever, generator).with_analyzer(QueryAnalyzer::new());

    let files = pipeline.processor().list_txt_files(&ask.data_dir);
    if files.is_empty() { bail!("no .txt files under {}", ask.data_dir.display()); }
    println!("Ingesting {} files from {}", files.len(), ask.data_dir.display());
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")?.progress_chars("#>-"));
    let mut chunk_count = 0;
    for file in &files {
        chunk_count += pipeline.ingest_file(file, &ask.data_dir).with_context(|| format!("ingesting {}", file.display()))?;
        pb.inc(1);
    }
    pb.finish_with_message(format!("{chunk_count} chunks"));

    let out = if ask.hybrid { pipeline.ask_hybrid(&ask.query, ask.k)? } else { pipeline.ask(&ask.query)? };
    println!("\nIntent: {} (confidence {:.1})", out.intent.query_type, out.intent.confidence);
    for r in &out.results {
        let source = r.metadata.source.as_deref().unwrap_or("?");
        let preview: String = r.text.chars().take(120).collect();
        println!("{:>2}. {:.3}  {}#{}  {}", r.rank, r.score, source, r.chunk_id.map_or("-".to_string(), |id| id.to_string()), preview.replace('\n', " "));
    }
    let metrics = retrieval_metrics(&out.results, 0.7);
    println!("Retrieval quality: {} (avg {:.3}, {} above 0.7)", metrics.quality_grade, metrics.avg_score, metrics.above_threshold);
    if ask.show_prompt {
        println!("\n--- prompt ---\n{}", pipeline.generator().build_prompt(&ask.query, &out.results, Some(&out.intent)));
    }
    println!("\nAnswer ({:.2}{}):\n{}", out.answer.confidence, if out.answer.fallback_used { ", fallback" } else { "" }, out.answer.answer);
    Ok(())
}
