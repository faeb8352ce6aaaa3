use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dreamai::app::App;
use dreamai::models::{Config, Dream, Interpretation};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "dreamai")]
#[command(about = "Record dreams and ask for AI interpretations")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record a new dream.
    Record {
        text: String,
        /// Mood title, e.g. "Calm".
        #[arg(long)]
        mood: Option<String>,
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Interpret a recorded dream and store the result.
    Interpret { id: Uuid },
    /// List recorded dreams, newest first.
    List,
    /// Show a dream and its interpretation.
    Show { id: Uuid },
    /// Delete dreams and their interpretations.
    Delete {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    /// List or edit moods.
    Moods {
        #[command(subcommand)]
        action: Option<MoodAction>,
    },
    /// List or edit tags.
    Tags {
        #[command(subcommand)]
        action: Option<TagAction>,
    },
}

#[derive(Debug, Subcommand)]
enum MoodAction {
    Add { title: String, emoji: String },
    Remove { id: Uuid },
}

#[derive(Debug, Subcommand)]
enum TagAction {
    Add { tag: String },
    Remove { tag: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dreamai=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    if let Err(e) = run(args.command).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Command) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let mut app = App::new(&config).context("Failed to open dream journal")?;

    match command {
        Command::Record { text, mood, tags } => {
            let mood = match mood {
                Some(title) => Some(
                    app.moods()
                        .find(&title)
                        .cloned()
                        .with_context(|| format!("Unknown mood '{}'", title))?,
                ),
                None => None,
            };
            let dream = app.record_dream(&text, mood, &tags)?;
            println!("{}", dream.id);
        }
        Command::Interpret { id } => {
            let interpretation = app.interpret_dream(id).await?;
            print_interpretation(&interpretation);
        }
        Command::List => {
            for dream in app.dreams()? {
                print_dream_line(&dream, app.interpretation(dream.id)?.is_some());
            }
        }
        Command::Show { id } => {
            let dream = app.dream(id)?;
            print_dream_line(&dream, false);
            println!("\n{}", dream.text);
            if let Some(interpretation) = app.interpretation(id)? {
                println!();
                print_interpretation(&interpretation);
            }
        }
        Command::Delete { ids } => {
            let removed = app.delete_dreams(&ids)?;
            println!("Deleted {} dream(s)", removed);
        }
        Command::Moods { action } => {
            match action {
                Some(MoodAction::Add { title, emoji }) => {
                    app.moods_mut().add_mood(&title, &emoji)?;
                }
                Some(MoodAction::Remove { id }) => {
                    app.moods_mut().remove_mood(id)?;
                }
                None => {}
            }
            for mood in app.moods().moods() {
                let kind = if mood.is_default { "default" } else { "custom" };
                println!("{}  {}  ({})", mood.id, mood.label(), kind);
            }
        }
        Command::Tags { action } => {
            match action {
                Some(TagAction::Add { tag }) => {
                    app.tags_mut().add_tag(&tag)?;
                }
                Some(TagAction::Remove { tag }) => app.tags_mut().remove_tag(&tag)?,
                None => {}
            }
            for tag in app.tags().tags() {
                println!("{}", tag);
            }
        }
    }

    Ok(())
}

fn print_dream_line(dream: &Dream, interpreted: bool) {
    let mood = dream.mood.as_ref().map(|m| m.emoji.as_str()).unwrap_or(" ");
    let marker = if interpreted { "*" } else { " " };
    let preview: String = dream.text.chars().take(60).collect();
    println!(
        "{} {} {} {} {}",
        dream.id,
        dream.created_at.format("%Y-%m-%d"),
        marker,
        mood,
        preview
    );
}

fn print_interpretation(interpretation: &Interpretation) {
    println!("{}", interpretation.dream_title);
    println!("{}\n", interpretation.dream_summary);
    println!("{}\n", interpretation.full_interpretation);

    for insight in &interpretation.mood_insights {
        let filled = ((insight.score() * 10.0).round() as usize).min(10);
        println!(
            "{} {:<12} {}{} {:.0}%",
            insight.emoji,
            insight.label,
            "█".repeat(filled),
            "░".repeat(10 - filled),
            insight.score() * 100.0
        );
    }
    if !interpretation.symbolism.is_empty() {
        println!();
        for symbol in &interpretation.symbolism {
            println!("{} {}", symbol.icon, symbol.meaning);
        }
    }
    if !interpretation.reflection_prompts.is_empty() {
        println!();
        for prompt in &interpretation.reflection_prompts {
            println!("- {}", prompt);
        }
    }
    println!(
        "\n\"{}\" ({})",
        interpretation.quote.text, interpretation.quote.author
    );
    if !interpretation.tags.is_empty() {
        println!("\n#{}", interpretation.tags.join(" #"));
    }
}
