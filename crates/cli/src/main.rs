//! CLI tool for building slide decks from AI content and template slides.

use anyhow::{Context, Result};
use clap::Parser;
use deckbind_core::{
    insert_slides, parse_ai_slides, EmMetrics, Engine, GenerationOptions, ImagePoolItem,
    MissingTemplatePolicy, PresentationStore, RandomSource, SeededRandom, Session, Slide,
    TemplateDocument, TemplateLibrary, ThreadRandom,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Bind AI-generated slide content onto template slides.
#[derive(Parser, Debug)]
#[command(name = "deckbind")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Template document (JSON slide list, each slide tagged with its type)
    templates: PathBuf,

    /// AI output: slide descriptors as a JSON array or concatenated objects,
    /// optionally inside a ```json fence
    slides: PathBuf,

    /// Image pool (JSON array of {id, src, width, height})
    #[arg(short, long)]
    images: Option<PathBuf>,

    /// Deck file to write; generated slides are appended if it already has
    /// slides (default: <slides>.deck.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the generated slides to stdout instead of writing a deck file
    #[arg(short, long)]
    print: bool,

    /// Seed template and image choice for reproducible output
    #[arg(short, long)]
    seed: Option<u64>,

    /// Generation options (JSON, camelCase keys; missing keys use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip slides whose type has no template instead of reporting an error
    #[arg(long)]
    skip_missing_templates: bool,

    /// Font family for slots whose markup names none
    #[arg(long)]
    font_family: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let options = load_options(&args)?;
    log::debug!("Generation options: {:?}", options);
    let template_text = fs::read_to_string(&args.templates)
        .with_context(|| format!("Failed to read {}", args.templates.display()))?;
    let document = TemplateDocument::from_json(&template_text)
        .with_context(|| format!("Failed to parse templates in {}", args.templates.display()))?;
    let deck_extra = document.extra.clone();
    let library = TemplateLibrary::from_document(document);

    let slide_text = fs::read_to_string(&args.slides)
        .with_context(|| format!("Failed to read {}", args.slides.display()))?;
    let descriptors = parse_ai_slides(&slide_text).with_context(|| {
        format!("Failed to parse slide descriptors in {}", args.slides.display())
    })?;

    let images = args.images.as_deref().map(load_images).transpose()?;

    if args.verbose {
        eprintln!(
            "Loaded {} templates, {} descriptors, {} images",
            library.len(),
            descriptors.len(),
            images.as_ref().map_or(0, Vec::len)
        );
    }

    let engine = Engine::new(EmMetrics::new()).with_options(options);
    let mut session = Session::new();
    let mut rng: Box<dyn RandomSource> = match args.seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom),
    };

    let mut slides = Vec::new();
    let mut failed = 0;
    for result in engine.generate(&library, descriptors, images, &mut session, rng.as_mut()) {
        match result {
            Ok(slide) => slides.push(slide),
            Err(e) => {
                failed += 1;
                eprintln!("Error generating slide: {}", e);
            }
        }
    }

    if args.verbose {
        eprintln!("  Generated {} slides, {} failed", slides.len(), failed);
    }

    if args.print {
        println!("{}", serde_json::to_string_pretty(&slides)?);
        return Ok(());
    }

    let output_path = args.output.clone().unwrap_or_else(|| default_output_path(&args.slides));
    let mut deck = DeckFile::open(&output_path, deck_extra)?;
    insert_slides(&mut deck, slides).context("Failed to store generated slides")?;
    deck.save()?;

    if args.verbose {
        eprintln!("Written to: {}", output_path.display());
    }

    Ok(())
}

fn load_options(args: &Args) -> Result<GenerationOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse options in {}", path.display()))?
        }
        None => GenerationOptions::new(),
    };

    if args.skip_missing_templates {
        options = options.with_missing_template(MissingTemplatePolicy::Skip);
    }
    if let Some(family) = &args.font_family {
        options = options.with_default_font_family(family.clone());
    }
    Ok(options)
}

fn load_images(path: &Path) -> Result<Vec<ImagePoolItem>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse image pool in {}", path.display()))
}

/// `talk.json` becomes `talk.deck.json` next to it.
fn default_output_path(slides_path: &Path) -> PathBuf {
    let stem = slides_path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    slides_path.with_file_name(format!("{}.deck.json", stem))
}

/// A deck stored as a template-format JSON document.
struct DeckFile {
    path: PathBuf,
    document: TemplateDocument,
}

impl DeckFile {
    /// Open `path`, or start an empty deck carrying `extra` deck-level
    /// fields when it does not exist.
    fn open(path: &Path, extra: serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let document = if path.exists() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            TemplateDocument::from_json(&text)
                .with_context(|| format!("Failed to parse deck {}", path.display()))?
        } else {
            TemplateDocument {
                slides: Vec::new(),
                extra,
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.document)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl PresentationStore for DeckFile {
    fn slide_count(&self) -> usize {
        self.document.slides.len()
    }

    fn replace_slides(&mut self, slides: Vec<Slide>) -> deckbind_core::Result<()> {
        self.document.slides = slides;
        Ok(())
    }

    fn append_slides(&mut self, slides: Vec<Slide>) -> deckbind_core::Result<()> {
        self.document.slides.extend(slides);
        Ok(())
    }
}
