//! Summanote CLI - structured note summaries
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use dialoguer::Input;
use std::io::Read;
use std::path::{Path, PathBuf};
use summanote::search::WebResult;
use summanote::{agent, media, render, scraper, search, share, transcript, Config, SearchResult, Session};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "summanote")]
#[command(author, version, about = "Structured note summaries you can edit, enrich and share", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise text into a new session file
    Summarise {
        /// Text to summarise (otherwise read from --file or stdin)
        text: Option<String>,
        /// Read the text from a file, e.g. OCR output
        #[arg(long)]
        file: Option<PathBuf>,
        /// Crawl a page and append its text to the input
        #[arg(long)]
        url: Vec<String>,
        /// Session file to create
        #[arg(long, short, default_value = "note.json")]
        out: PathBuf,
        /// Show the collected input text instead of summarising
        #[arg(long)]
        raw: bool,
    },
    /// Show a session document
    Show {
        session: PathBuf,
    },
    /// Set the document title
    Title {
        session: PathBuf,
        title: String,
    },
    /// Edit keywords
    #[command(subcommand)]
    Keyword(KeywordCommand),
    /// Replace the summary body (opens $EDITOR unless --text or --file is given)
    Sections {
        session: PathBuf,
        #[command(flatten)]
        source: TextSource,
    },
    /// Replace the insights (opens $EDITOR unless --text or --file is given)
    Insights {
        session: PathBuf,
        #[command(flatten)]
        source: TextSource,
    },
    /// Search for media to attach, or for related web pages
    Search {
        #[arg(value_enum)]
        kind: SearchKind,
        /// Search query, defaults to the session document's title
        query: Option<String>,
        #[arg(long)]
        session: Option<PathBuf>,
        #[arg(long)]
        max: Option<usize>,
    },
    /// Attach a video or image to the summary body
    #[command(subcommand)]
    Media(MediaCommand),
    /// Fetch and cache a one-line summary for a video
    VideoSummary {
        session: PathBuf,
        video_id: String,
        /// Transcript or description to summarise. Fetched from the video
        /// captions when neither --text nor --file is given
        #[command(flatten)]
        source: TextSource,
    },
    /// Print the document as one markdown text
    Export {
        session: PathBuf,
    },
    /// Print a share link for the document
    Share {
        session: PathBuf,
    },
    /// Open a share link read-only
    Open {
        /// Share URL or bare fragment
        link: String,
        /// Also save the shared document as a session file
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum KeywordCommand {
    /// Append a keyword (prompts when no value is given)
    Add {
        session: PathBuf,
        value: Option<String>,
    },
    /// Replace the keyword at INDEX
    Set {
        session: PathBuf,
        index: usize,
        value: String,
    },
    /// Remove the keyword at INDEX
    Remove {
        session: PathBuf,
        index: usize,
    },
}

#[derive(Subcommand)]
enum MediaCommand {
    /// Attach a video thumbnail link (with its cached summary, if any)
    Video {
        session: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: String,
        /// Put the video in its own section under this heading
        #[arg(long)]
        heading: Option<String>,
    },
    /// Attach an image
    Image {
        session: PathBuf,
        #[arg(long)]
        url: String,
        #[arg(long)]
        alt: Option<String>,
        /// Put the image in its own section under this heading
        #[arg(long)]
        heading: Option<String>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SearchKind {
    Videos,
    Images,
    Web,
}

#[derive(clap::Args)]
struct TextSource {
    /// Use this text
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,
    /// Read the text from a file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl TextSource {
    fn is_given(&self) -> bool {
        self.text.is_some() || self.file.is_some()
    }

    /// Text from --text/--file, or from the user's editor seeded with `current`
    fn read(&self, current: &str) -> anyhow::Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
        edit::edit(current).context("failed to run editor")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("summanote=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summarise {
            text,
            file,
            url,
            out,
            raw,
        } => {
            let mut input = collect_input(text, file.as_deref())?;

            for link in &url {
                println!("Fetching: {}", link);
                let content = scraper::fetch_content(link).await?;
                input = scraper::append_text(&input, &content.text);
            }

            if input.trim().is_empty() {
                bail!("nothing to summarise: give text, --file, --url or pipe it on stdin");
            }

            if raw {
                println!("{}", input);
                println!("\n--- Collected {} characters ---", input.len());
                return Ok(());
            }

            println!("Summarising {} characters...\n", input.len());
            let config = Config::load()?;
            let document = agent::summarize(&input, &config).await?;

            let mut session = Session::new(document);
            session.save(&out)?;
            print!("{}", render::render(&session.document));
            println!("\n{} {}", "Saved session:".green(), out.display());
        }
        Commands::Show { session } => {
            let session = Session::open(&session)?;
            print!("{}", render::render(&session.document));
        }
        Commands::Title { session, title } => {
            update(&session, |s| Ok(s.document.set_title(title)?))?;
        }
        Commands::Keyword(KeywordCommand::Add { session, value }) => {
            let value = match value {
                Some(value) => value,
                None => Input::<String>::new().with_prompt("Keyword").interact_text()?,
            };
            update(&session, |s| {
                let index = s.document.add_keyword()?;
                Ok(s.document.set_keyword(index, value)?)
            })?;
        }
        Commands::Keyword(KeywordCommand::Set {
            session,
            index,
            value,
        }) => {
            update(&session, |s| Ok(s.document.set_keyword(index, value)?))?;
        }
        Commands::Keyword(KeywordCommand::Remove { session, index }) => {
            update(&session, |s| {
                let removed = s.document.remove_keyword(index)?;
                println!("Removed keyword: {}", removed);
                Ok(())
            })?;
        }
        Commands::Sections { session, source } => {
            update(&session, |s| {
                s.document.ensure_editable()?;
                let edited = source.read(&s.document.body())?;
                Ok(s.document.replace_sections(&edited)?)
            })?;
        }
        Commands::Insights { session, source } => {
            update(&session, |s| {
                s.document.ensure_editable()?;
                let edited = source.read(s.document.insights())?;
                Ok(s.document.set_insights(edited)?)
            })?;
        }
        Commands::Search {
            kind,
            query,
            session,
            max,
        } => {
            let config = Config::load()?;
            let query = match (query, session) {
                (Some(query), _) => query,
                (None, Some(path)) => Session::open(&path)?.document.title().to_string(),
                (None, None) => bail!("give a query or --session to search by title"),
            };
            if query.trim().is_empty() {
                bail!("search query is empty");
            }
            let max = max.unwrap_or(config.search.max_results);

            match kind {
                SearchKind::Videos => print_results(&query, &search::search_videos(&query, max).await?),
                SearchKind::Images => print_results(&query, &search::search_images(&query, max).await?),
                SearchKind::Web => print_web_results(&query, &search::search_web(&query, max).await?),
            }
        }
        Commands::Media(MediaCommand::Video {
            session,
            id,
            title,
            heading,
        }) => {
            let result = SearchResult::Video {
                id,
                title,
                description: String::new(),
                duration_label: String::new(),
            };
            attach(&session, &result, heading.as_deref())?;
        }
        Commands::Media(MediaCommand::Image {
            session,
            url,
            alt,
            heading,
        }) => {
            let result = SearchResult::Image { url, alt_title: alt };
            attach(&session, &result, heading.as_deref())?;
        }
        Commands::VideoSummary {
            session: path,
            video_id,
            source,
        } => {
            let mut session = Session::open(&path)?;
            if let Some(existing) = session.video_summaries.get(&video_id) {
                println!("Already summarised: {}", existing);
                return Ok(());
            }

            let config = Config::load()?;
            let text = if source.is_given() {
                source.read("")?
            } else {
                let cues =
                    transcript::fetch_transcript(&video_id, &config.search.transcript_languages).await?;
                if cues.is_empty() {
                    bail!("no transcript for {}; pass --text or --file", video_id);
                }
                transcript::transcript_text(&cues)
            };
            let summary = agent::summarize_item(&text, &config).await?;
            println!("{} {}", "Video summary:".cyan(), summary);

            session.video_summaries.insert(video_id, summary);
            session.save(&path)?;
        }
        Commands::Export { session } => {
            let session = Session::open(&session)?;
            println!("{}", session.document.to_markdown());
        }
        Commands::Share { session } => {
            let session = Session::open(&session)?;
            let config = Config::load()?;
            println!("{}", share::share_url(&config.share.base_url, &session.document));
        }
        Commands::Open { link, save } => {
            let document = share::decode(share::fragment_of(&link))?;
            print!("{}", render::render(&document));
            if let Some(path) = save {
                Session::new(document).save(&path)?;
                println!("\n{} {}", "Saved read-only copy:".green(), path.display());
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "summanote", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Input text from the argument, a file, or piped stdin
fn collect_input(text: Option<String>, file: Option<&Path>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    Ok(String::new())
}

/// Open a session, apply one edit, and save it back
fn update<F>(path: &Path, edit: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut Session) -> anyhow::Result<()>,
{
    let mut session = Session::open(path)?;
    edit(&mut session)?;
    session.save(path)?;
    print!("{}", render::render(&session.document));
    Ok(())
}

fn attach(path: &Path, result: &SearchResult, heading: Option<&str>) -> anyhow::Result<()> {
    update(path, |s| {
        match heading {
            Some(heading) => {
                media::append_media_section(&mut s.document, heading, result, &s.video_summaries)?
            }
            None => media::append_media(&mut s.document, result, &s.video_summaries)?,
        }
        Ok(())
    })
}

fn print_results(query: &str, results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results found for: {}", query);
        return;
    }

    println!("Search results for '{}':\n", query);
    for (index, result) in results.iter().enumerate() {
        match result {
            SearchResult::Video {
                id,
                title,
                duration_label,
                ..
            } => {
                println!("{}. 🎬 {} ({})", index + 1, title.bold(), duration_label);
                println!("   {}", media::watch_url(id));
                println!("   attach: summanote media video <SESSION> --id {} --title {:?}\n", id, title);
            }
            SearchResult::Image { url, .. } => {
                println!("{}. 🖼️  {}", index + 1, url);
                println!("   attach: summanote media image <SESSION> --url {:?}\n", url);
            }
        }
    }
}

fn print_web_results(query: &str, results: &[WebResult]) {
    if results.is_empty() {
        println!("No results found for: {}", query);
        return;
    }

    println!("Search results for '{}':\n", query);
    for (index, result) in results.iter().enumerate() {
        println!("{}. 🔗 {}", index + 1, result.display_title().bold());
        println!("   {}", result.url);
        if let Some(description) = &result.og_description {
            println!("   {}", description.dimmed());
        } else if !result.snippet.is_empty() {
            println!("   {}...", result.snippet.dimmed());
        }
        println!();
    }
}
