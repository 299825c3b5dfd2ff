//! # Fasal Rakshak CLI
//!
//! Terminal front end for parametric crop insurance: buy a policy, watch
//! its dashboard, follow claim payouts and learn through the quiz, in
//! Hindi, Marathi or English.
//!
//! ## Usage
//! ```bash
//! # Interactive home menu
//! fasal
//!
//! # Single screens
//! fasal login
//! fasal dashboard --watch
//! fasal buy
//!
//! # Run the policy submission gateway
//! fasal serve --port 5000
//!
//! # Run system diagnostics
//! fasal doctor
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use inquire::Select;
use std::env;
use std::io;
use std::path::PathBuf;

use fasal_core::prelude::*;
use fasal_gateway::{CreatePolicyResponse, ErrorResponse, GatewayConfig};

mod config_loader;
mod context;
mod screens;

use config_loader::CliConfig;
use context::AppContext;

/// Fasal Rakshak crop insurance
#[derive(Parser, Debug)]
#[command(name = "fasal")]
#[command(author = "Fasal Rakshak contributors")]
#[command(version)]
#[command(about = "Parametric crop insurance in Hindi, Marathi and English", long_about = None)]
struct Args {
    /// Enable file logging to logs/ directory
    #[arg(long, global = true, default_value = "false")]
    log: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database URL
    #[arg(long, global = true)]
    database: Option<String>,

    /// Submit purchases through this gateway instead of the local database
    #[arg(long, global = true)]
    gateway_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Choose the display language
    Language,
    /// Create an account
    Signup,
    /// Log in with e-mail and password
    Login,
    /// Log out of the saved session
    Logout,
    /// Active policy, weather and claim status
    Dashboard {
        /// Keep refreshing until Enter is pressed
        #[arg(long, default_value = "false")]
        watch: bool,
    },
    /// Buy a crop insurance policy
    Buy,
    /// Claim timelines
    Claims,
    /// Insurance quiz that earns coins
    Quiz,
    /// Profile and settings
    Profile,
    /// Run the policy submission gateway
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run diagnostics to check configuration, storage and connectivity
    Doctor,
    /// Print the JSON Schema of the gateway request and responses
    Schema,
}

impl Commands {
    fn is_interactive(&self) -> bool {
        !matches!(self, Commands::Serve { .. } | Commands::Doctor | Commands::Schema)
    }
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fasal=info"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = CliConfig::load(args.config.as_deref());
    if let Some(url) = &args.database {
        config.database_url = Some(url.clone());
    }
    if let Some(url) = &args.gateway_url {
        config.gateway_url = Some(url.clone());
    }

    // Interactive screens log to file only; console output would garble prompts.
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>;
    let is_interactive = args.command.as_ref().is_none_or(Commands::is_interactive);

    if args.log || config.enable_logging.unwrap_or(false) {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        std::fs::create_dir_all("logs")?;

        let file_appender = tracing_appender::rolling::daily("logs", "fasal.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        _file_guard = Some(guard);

        if is_interactive {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(env_filter())
                .with(file_layer)
                .init();
        } else {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(env_filter())
                .with(tracing_subscriber::fmt::layer())
                .with(file_layer)
                .init();
        }

        tracing::info!("--- Fasal Rakshak session started [{}] ---", chrono::Utc::now());
    } else {
        _file_guard = None;
        if !is_interactive {
            tracing_subscriber::fmt().with_env_filter(env_filter()).init();
        }
    }

    match args.command {
        Some(Commands::Schema) => return print_schema(),
        Some(Commands::Doctor) => return run_doctor(config).await,
        _ => {}
    }

    let mut ctx = AppContext::init(config).await?;

    match args.command {
        None => run_home(&mut ctx).await,
        Some(Commands::Language) => screens::language::run(&mut ctx).await,
        Some(Commands::Signup) => screens::auth::signup(&ctx).await,
        Some(Commands::Login) => screens::auth::login(&ctx).await,
        Some(Commands::Logout) => screens::auth::logout(&ctx).await,
        Some(Commands::Dashboard { watch }) => screens::dashboard::run(&ctx, watch).await,
        Some(Commands::Buy) => screens::buy_policy::run(&ctx).await,
        Some(Commands::Claims) => screens::claims::run(&ctx).await,
        Some(Commands::Quiz) => screens::education::run(&ctx).await,
        Some(Commands::Profile) => screens::profile::run(&mut ctx).await,
        Some(Commands::Serve { host, port }) => run_serve(&ctx, host, port).await,
        Some(Commands::Doctor | Commands::Schema) => Ok(()),
    }
}

/// Home menu. The first run starts with the language picker.
async fn run_home(ctx: &mut AppContext) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n{}", ctx.t("app-title").bright_green().bold());
    println!("{}", ctx.t("app-tagline").dimmed());

    if !ctx.prefs.has_stored_choice() {
        screens::language::run(ctx).await?;
    }

    loop {
        let signed_in = ctx.resume_session().await.is_some();

        let mut entries: Vec<(&str, String)> = Vec::new();
        if signed_in {
            for key in ["dashboard", "buy-policy", "claims", "education", "profile"] {
                entries.push((key, ctx.t(key)));
            }
        } else {
            for key in ["login", "signup"] {
                entries.push((key, ctx.t(key)));
            }
        }
        entries.push(("select-language", ctx.t("select-language")));
        entries.push(("close", ctx.t("close")));

        let labels: Vec<String> = entries.iter().map(|(_, label)| label.clone()).collect();
        let choice = match Select::new(&ctx.t("welcome"), labels).raw_prompt() {
            Ok(choice) => choice,
            Err(inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        let result = match entries[choice.index].0 {
            "dashboard" => screens::dashboard::run(ctx, false).await,
            "buy-policy" => screens::buy_policy::run(ctx).await,
            "claims" => screens::claims::run(ctx).await,
            "education" => screens::education::run(ctx).await,
            "profile" => screens::profile::run(ctx).await,
            "login" => screens::auth::login(ctx).await,
            "signup" => screens::auth::signup(ctx).await,
            "select-language" => screens::language::run(ctx).await,
            _ => break,
        };

        // Escape inside a screen returns to the menu.
        if let Err(e) = result {
            match e.downcast_ref::<inquire::InquireError>() {
                Some(inquire::InquireError::OperationCanceled) => continue,
                Some(inquire::InquireError::OperationInterrupted) => break,
                _ => return Err(e),
            }
        }
    }
    Ok(())
}

async fn run_serve(ctx: &AppContext, host: Option<String>, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = GatewayConfig {
        host: host.unwrap_or_else(|| ctx.config.listen_host().to_string()),
        port: port.unwrap_or_else(|| ctx.config.listen_port()),
        enable_cors: true,
    };
    println!(
        "{} http://{}:{}{}",
        "🌾 Policy gateway on".bright_green(),
        config.host,
        config.port,
        fasal_gateway::CREATE_POLICY_PATH
    );
    fasal_gateway::run_server(&config, ctx.store.clone())
        .await
        .map_err(|e| -> Box<dyn std::error::Error> { e })
}

fn print_schema() -> Result<(), Box<dyn std::error::Error>> {
    let schemas = serde_json::json!({
        "CreatePolicyRequest": schemars::schema_for!(CreatePolicyRequest),
        "CreatePolicyResponse": schemars::schema_for!(CreatePolicyResponse),
        "ErrorResponse": schemars::schema_for!(ErrorResponse),
    });
    println!("{}", serde_json::to_string_pretty(&schemas)?);
    Ok(())
}

/// Run doctor diagnostics
async fn run_doctor(config: CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write;

    println!("\n🚑 Fasal Rakshak Doctor - Diagnostics Tool");
    println!("═══════════════════════════════════════════════\n");

    // 1. Environment Info
    println!("1. System Information:");
    println!("   OS: {}", std::env::consts::OS);
    println!("   Arch: {}", std::env::consts::ARCH);
    println!("   CLI Version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "   NO_COLOR: {}",
        if env::var("NO_COLOR").is_ok() { "Set (True)" } else { "Unset" }
    );

    // 2. Configuration
    println!("\n2. Configuration:");
    match CliConfig::config_path() {
        Some(path) => println!("   Config File: {:?} (exists: {})", path, path.exists()),
        None => println!("   Config File: no config directory on this platform"),
    }
    match &config.pricing_config {
        Some(path) => match FasalConfig::try_from_json(&path.to_string_lossy()) {
            Ok(_) => println!("   Pricing Config: {:?} ✓ OK", path),
            Err(e) => println!("   Pricing Config: {:?} ✗ {}", path, e),
        },
        None => match FasalConfig::from_env() {
            Ok(c) => println!(
                "   Pricing: base premium ₹{}, base coverage ₹{}, refresh {}s",
                c.base_premium, c.base_coverage, c.poll_interval_secs
            ),
            Err(e) => println!("   Pricing: ✗ {}", e),
        },
    }

    // 3. Translations
    println!("\n3. Translations:");
    let prefs = fasal_i18n::LanguagePreferences::load_default();
    println!("   Active Language: {}", prefs.language().native_name());
    for language in [Language::Hi, Language::Mr, Language::En] {
        let ok = prefs.translator().has_message(language, "app-title");
        println!(
            "   {}: {}",
            fasal_i18n::locale_tag(language),
            if ok { "✓ OK" } else { "✗ MISSING" }
        );
    }

    // 4. Storage
    println!("\n4. Storage:");
    let url = config.database_url();
    print!("   Opening {}... ", url);
    io::stdout().flush()?;
    match fasal_sqlite::SqliteStore::connect(&url).await {
        Ok(_) => println!("✓ OK"),
        Err(e) => println!("✗ FAILED\n   Error: {}", e),
    }

    // 5. Gateway
    println!("\n5. Gateway:");
    match &config.gateway_url {
        Some(base) => {
            print!("   Connecting to {}... ", base);
            io::stdout().flush()?;
            let client = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(5))
                .build()?;
            match client.get(base).send().await {
                Ok(response) => println!("✓ Reachable (HTTP {})", response.status().as_u16()),
                Err(e) => println!("✗ FAILED\n   Error: {}", e),
            }
        }
        None => println!("   Not configured; purchases are written to the local database"),
    }

    println!("\nDiagnostics Complete.\n");
    Ok(())
}
