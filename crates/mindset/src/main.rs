use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use mindset::advice::Role;
use mindset::commands;
use mindset::config::{self, ConfigOverrides, ConfigUpdate};
use mindset::context::AppContext;
use mindset::record::GameResult;

#[derive(Parser)]
#[command(name = "mindset")]
#[command(
  about = "Mindset - coaching journal for ranked games\nTurn coaching videos into a checklist and track how well you follow it"
)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), ", courtesy of Kernelle Software"))]
struct Cli {
  /// Directory holding config, sign-in and session state (default ~/.mindset)
  #[arg(long, env = "MINDSET_DIR", global = true)]
  dir: Option<PathBuf>,

  /// Spreadsheet id for this run only
  #[arg(long, env = "MINDSET_SPREADSHEET_ID", hide_env_values = true)]
  spreadsheet_id: Option<String>,

  /// OAuth client id for this run only
  #[arg(long, env = "MINDSET_CLIENT_ID", hide_env_values = true)]
  client_id: Option<String>,

  /// Gemini API key for this run only
  #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
  gemini_key: Option<String>,

  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Show or change the saved configuration
  Config {
    #[command(subcommand)]
    action: ConfigAction,
  },
  /// Sign in with Google to reach the spreadsheet
  Login,
  /// Forget the cached Google sign-in
  Logout,
  /// Extract advice from a coaching video
  Analyze {
    /// Video URL
    url: String,
    /// Extra context for the model, e.g. what to focus on
    #[arg(short, long)]
    notes: Option<String>,
    /// Title recorded as the advice source
    #[arg(short, long)]
    title: Option<String>,
    /// Add the advice without asking
    #[arg(short, long)]
    yes: bool,
  },
  /// Work with extracted and stored advice
  Advice {
    #[command(subcommand)]
    action: AdviceAction,
  },
  /// Review a match against its checklist
  Review {
    #[command(subcommand)]
    action: ReviewAction,
  },
  /// Win rate and adherence statistics
  Dashboard {
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
  },
}

#[derive(Subcommand)]
enum ConfigAction {
  /// Print the configuration, secrets masked
  Show,
  /// Save one or more settings
  Set(SetArgs),
}

#[derive(Args)]
struct SetArgs {
  #[arg(long)]
  spreadsheet_id: Option<String>,
  #[arg(long)]
  client_id: Option<String>,
  /// Client secret, for OAuth clients that were issued one
  #[arg(long)]
  client_secret: Option<String>,
  #[arg(long)]
  gemini_key: Option<String>,
  /// Gemini model name
  #[arg(long)]
  model: Option<String>,
  /// Language the extracted advice is written in
  #[arg(long)]
  language: Option<String>,
}

impl From<SetArgs> for ConfigUpdate {
  fn from(args: SetArgs) -> Self {
    ConfigUpdate {
      spreadsheet_id: args.spreadsheet_id,
      client_id: args.client_id,
      client_secret: args.client_secret,
      gemini_api_key: args.gemini_key,
      gemini_model: args.model,
      advice_language: args.language,
    }
  }
}

#[derive(Subcommand)]
enum AdviceAction {
  /// Add the pending extracted advice to the knowledge base
  Save,
  /// Drop the pending extracted advice
  Discard,
  /// Show the pending extracted advice
  Show,
  /// List the knowledge base
  List {
    /// Only advice for this role (Top, Jungle, Mid, ADC, Support)
    #[arg(short, long)]
    role: Option<Role>,
    /// Only advice for this champion as well
    #[arg(short, long, requires = "role")]
    subject: Option<String>,
  },
}

#[derive(Subcommand)]
enum ReviewAction {
  /// Set up the match and load its checklist
  Start {
    /// Role played (Top, Jungle, Mid, ADC, Support)
    #[arg(short, long)]
    role: Option<Role>,
    /// Champion played
    #[arg(short, long)]
    subject: Option<String>,
    /// Match result (Win, Loss)
    #[arg(long)]
    result: Option<GameResult>,
  },
  /// Show the match setup and checklist
  Status,
  /// Toggle checklist items by number
  Check {
    numbers: Vec<usize>,
  },
  /// Set the match note
  Note {
    text: String,
  },
  /// Drop the checklist and go back to match setup
  Back,
  /// Record the match
  Save,
}

fn init_tracing(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if verbose {
      EnvFilter::new("mindset=debug,info")
    } else {
      EnvFilter::new("mindset=info,warn")
    }
  });

  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();
}

async fn handle(command: Command, ctx: &mut AppContext) -> Result<()> {
  match command {
    Command::Config { action } => match action {
      ConfigAction::Show => commands::config::show(ctx),
      ConfigAction::Set(args) => commands::config::set(ctx, args.into()),
    },
    Command::Login => commands::login::handle(ctx).await,
    Command::Logout => commands::logout::handle(ctx),
    Command::Analyze { url, notes, title, yes } => {
      commands::analyze::handle(ctx, url, notes, title, yes).await
    }
    Command::Advice { action } => match action {
      AdviceAction::Save => commands::advice::save(ctx).await,
      AdviceAction::Discard => commands::advice::discard(ctx),
      AdviceAction::Show => commands::advice::show(ctx),
      AdviceAction::List { role, subject } => commands::advice::list(ctx, role, subject).await,
    },
    Command::Review { action } => match action {
      ReviewAction::Start { role, subject, result } => {
        commands::review::start(ctx, role, subject, result).await
      }
      ReviewAction::Status => commands::review::status(ctx),
      ReviewAction::Check { numbers } => commands::review::check(ctx, &numbers),
      ReviewAction::Note { text } => commands::review::note(ctx, &text),
      ReviewAction::Back => commands::review::back(ctx),
      ReviewAction::Save => commands::review::save(ctx).await,
    },
    Command::Dashboard { json } => commands::dashboard::handle(ctx, json).await,
  }
}

fn report(err: &anyhow::Error) {
  herald::error(&format!("{err:#}"));
  if let Some(hint) = commands::remediation(err) {
    herald::info(&hint);
  }
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();
  herald::set_verbose(cli.verbose);
  init_tracing(cli.verbose);

  let dir = cli.dir.clone().unwrap_or_else(config::mindset_dir);
  herald::debug!("using state directory {}", dir.display());
  let overrides = ConfigOverrides {
    spreadsheet_id: cli.spreadsheet_id.clone(),
    client_id: cli.client_id.clone(),
    gemini_api_key: cli.gemini_key.clone(),
  };

  let mut ctx = match AppContext::init(dir, overrides) {
    Ok(ctx) => ctx,
    Err(e) => {
      report(&anyhow::Error::from(e));
      return ExitCode::FAILURE;
    }
  };

  let outcome = handle(cli.command, &mut ctx).await;
  let teardown = ctx.teardown();

  let mut code = ExitCode::SUCCESS;
  if let Err(e) = outcome {
    report(&e);
    code = ExitCode::FAILURE;
  }
  if let Err(e) = teardown {
    report(&anyhow::Error::from(e));
    code = ExitCode::FAILURE;
  }
  code
}
