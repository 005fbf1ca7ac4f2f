use anyhow::{Context, Result};
use autolinker_config::{Config, LinkPattern};
use autolinker_engine::autolink::{AutoLinker, LinkMatcher};
use autolinker_engine::emoticon::{EmoticonMatcher, EmoticonStrategy};
use autolinker_engine::replace::{MatcherPipeline, Replacer, Separator};
use autolinker_engine::transform::{NodeTransform, run_transforms};
use autolinker_engine::tree::Document;
use regex::Regex;
use std::io::{self, BufRead};
use std::{env, path::PathBuf, process};

fn link_matcher(pattern: &LinkPattern) -> Result<LinkMatcher> {
    let regex = Regex::new(&pattern.pattern)
        .with_context(|| format!("Invalid link pattern '{}'", pattern.pattern))?;

    let mut matcher = LinkMatcher::new(regex);
    if let Some(prefix) = &pattern.url_prefix {
        matcher = matcher.with_url_prefix(prefix.clone());
    }
    if let Some(rel) = &pattern.rel {
        matcher = matcher.with_rel(rel.clone());
    }
    if let Some(target) = &pattern.target {
        matcher = matcher.with_target(target.clone());
    }
    Ok(matcher)
}

fn build_transforms(config: &Config) -> Result<Vec<Box<dyn NodeTransform>>> {
    let separator = Separator::new(&config.separators)
        .with_context(|| format!("Invalid separator class '{}'", config.separators))?;

    let matchers = if config.links.is_empty() {
        vec![LinkMatcher::url()]
    } else {
        config
            .links
            .iter()
            .map(link_matcher)
            .collect::<Result<Vec<_>>>()?
    };
    let linker = AutoLinker::new(matchers)
        .with_separator(separator.clone())
        .on_change(|url, prev_url| match (url, prev_url) {
            (Some(url), None) => log::info!("Linked {url}"),
            (None, Some(prev_url)) => log::info!("Unlinked {prev_url}"),
            (Some(url), Some(prev_url)) => log::info!("Relinked {prev_url} as {url}"),
            (None, None) => {}
        });

    let mut transforms: Vec<Box<dyn NodeTransform>> = vec![Box::new(linker)];
    if let Some(catalog) = config.emoticons()? {
        log::info!("Loaded {} emoticons", catalog.len());
        let emoticons = Replacer::new(
            EmoticonStrategy,
            MatcherPipeline::new().with(EmoticonMatcher::new(catalog.entries)),
        )
        .with_separator(separator);
        transforms.push(Box::new(emoticons));
    }
    Ok(transforms)
}

/// Run the transforms over a one-paragraph document holding `line`
fn process_line(line: &str, transforms: &[&dyn NodeTransform]) -> Result<String> {
    let mut doc = Document::new();
    let paragraph = doc.create_element("paragraph");
    doc.append(doc.root(), paragraph)?;
    let text = doc.create_text(line);
    doc.append(paragraph, text)?;

    let events = run_transforms(&mut doc, transforms)?;
    log::debug!("{} replacement events for {line:?}", events.len());
    Ok(doc.dump())
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} [--config <config-file>] [text...]");
    eprintln!("Reads lines from stdin when no text is given.");
    process::exit(1);
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("autolinker");

    let (config_path, texts) = match args.get(1).map(String::as_str) {
        Some("-h" | "--help") => usage(program),
        Some("--config") => match args.get(2) {
            Some(path) => (PathBuf::from(path), &args[3..]),
            None => usage(program),
        },
        _ => (Config::config_path(), args.get(1..).unwrap_or_default()),
    };

    let config = match Config::load_from_path(&config_path) {
        Ok(Some(config)) => {
            log::info!("Using config file {}", config_path.display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let transforms = build_transforms(&config)?;
    let transforms: Vec<&dyn NodeTransform> = transforms.iter().map(|t| &**t).collect();

    if texts.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line.context("Failed to read stdin")?;
            println!("{}", process_line(&line, &transforms)?);
        }
    } else {
        for text in texts {
            println!("{}", process_line(text, &transforms)?);
        }
    }
    Ok(())
}
