use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use sharelink::api::ApiClient;
use sharelink::config::Config;
use sharelink::download::Progress;
use sharelink::error::ShareError;
use sharelink::listing::{self, FileFilter};
use sharelink::session::{Session, SessionStore};
use sharelink::upload::{
    self, expiration_label, format_file_size, format_time_remaining, SelectedFile, UploadFlow,
};
use sharelink::viewer::{self, Rendering};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sharelink")]
#[command(about = "Upload files and share them with time-limited links", long_about = None)]
struct Cli {
    #[arg(long, global = true, help = "API server URL (overrides SHARELINK_API_URL)")]
    api_url: Option<String>,

    #[arg(long, global = true, help = "Web origin used in share links (overrides SHARELINK_ORIGIN)")]
    origin: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Store a session token obtained from the login page")]
    Login {
        #[arg(short, long, help = "Bearer token")]
        token: String,
    },

    #[command(about = "Forget the stored session token")]
    Logout,

    #[command(about = "Show whether a session is stored")]
    Whoami,

    #[command(about = "Upload a file and generate a shareable link")]
    Upload {
        #[arg(help = "Path to the file (max 10MB)")]
        file: PathBuf,

        #[arg(
            short = 'e',
            long,
            default_value = "24",
            value_parser = parse_hours,
            help = "Link lifetime in hours (1, 6, 12, 24, 48 or any positive number)"
        )]
        hours: u32,
    },

    #[command(about = "List your uploaded files")]
    List {
        #[arg(short, long, help = "Only files whose name contains this text")]
        search: Option<String>,

        #[arg(short = 't', long = "type", help = "Only files with this type tag (txt, pdf, jpg)")]
        file_type: Option<String>,
    },

    #[command(about = "Show a shared file")]
    View {
        #[arg(help = "File ID")]
        file_id: String,
    },

    #[command(about = "Download a shared file with progress")]
    Download {
        #[arg(help = "File ID")]
        file_id: String,

        #[arg(short, long, help = "Where to save the file (defaults to its name)")]
        output: Option<PathBuf>,
    },

    #[command(about = "Print the public share link for a file ID (no lookup is made)")]
    Link {
        #[arg(help = "File ID")]
        file_id: String,
    },

    #[command(about = "Print the presigned storage URL for one of your files")]
    Url {
        #[arg(help = "File ID")]
        file_id: String,
    },

    #[command(about = "Delete one of your files")]
    Delete {
        #[arg(help = "File ID")]
        file_id: String,
    },
}

fn parse_hours(input: &str) -> std::result::Result<u32, String> {
    upload::parse_expiration(input).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    sharelink::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ Error: {}", e);
        if matches!(
            e.downcast_ref::<ShareError>(),
            Some(ShareError::Unauthorized | ShareError::LoginRequired)
        ) {
            eprintln!("💡 Use 'sharelink login --token <token>' to log in");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?.with_overrides(cli.api_url, cli.origin)?;
    let sessions = SessionStore::new(config.session_file.clone());
    let api = ApiClient::new(&config)?;

    match cli.command {
        Commands::Login { token } => login(&sessions, token)?,
        Commands::Logout => logout(&sessions)?,
        Commands::Whoami => whoami(&sessions),
        Commands::Upload { file, hours } => {
            upload_file(&api, &sessions, &config, file, hours).await?
        }
        Commands::List { search, file_type } => {
            list_files(&api, &sessions, &config, FileFilter { search, file_type }).await?
        }
        Commands::View { file_id } => view_file(&api, &sessions, &file_id).await?,
        Commands::Download { file_id, output } => {
            download_file(&api, &sessions, &file_id, output).await?
        }
        Commands::Link { file_id } => println!("{}", config.share_url(&file_id)),
        Commands::Url { file_id } => print_presigned_url(&api, &sessions, &file_id).await?,
        Commands::Delete { .. } => {
            sessions.require()?;
            return Err(ShareError::NotImplemented("Delete").into());
        }
    }

    Ok(())
}

fn login(sessions: &SessionStore, token: String) -> Result<()> {
    let token = token.trim().to_string();
    if token.is_empty() {
        anyhow::bail!("Token cannot be empty");
    }
    sessions
        .save(&Session { token })
        .context("Failed to store session")?;
    println!("✅ Login successful!");
    Ok(())
}

fn logout(sessions: &SessionStore) -> Result<()> {
    sessions.clear()?;
    println!("✅ Logged out successfully!");
    Ok(())
}

fn whoami(sessions: &SessionStore) {
    if let Some(session) = sessions.load() {
        println!("👤 Logged in (token {})", session.masked_token());
    } else {
        println!("❌ Not logged in");
        println!("💡 Use 'sharelink login --token <token>' to log in");
    }
}

async fn upload_file(
    api: &ApiClient,
    sessions: &SessionStore,
    config: &Config,
    path: PathBuf,
    hours: u32,
) -> Result<()> {
    // checked before the file is read or anything is sent
    sessions.require()?;

    let mut flow = UploadFlow::new();
    flow.select(SelectedFile::from_path(&path)?)?;
    flow.set_expiration(hours)?;

    let request = flow.request()?;
    println!("📄 {} ({})", request.file_name, format_file_size(request.bytes.len() as u64));
    println!("⏱️  Link lifetime: {}", expiration_label(flow.expiration_hours()));
    println!("⏳ Generating link...");

    let link = flow.generate(api, sessions, config).await?;

    println!("\n✅ Your link is ready!");
    println!("🔗 {}", link.url);
    println!("🆔 File ID: {}", link.file_id);
    println!(
        "⏰ Expires: {} (in {})",
        link.expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
        format_time_remaining(link.expires_at, Utc::now())
    );

    Ok(())
}

async fn list_files(
    api: &ApiClient,
    sessions: &SessionStore,
    config: &Config,
    filter: FileFilter,
) -> Result<()> {
    let files = listing::fetch_files(api, sessions).await?;
    let shown = filter.apply(&files);

    if files.is_empty() {
        println!("📭 No files uploaded yet.");
        println!("💡 Use 'sharelink upload <file>' to share your first file");
        return Ok(());
    }

    if shown.is_empty() {
        println!("📭 No files match your search ({} total).", files.len());
        return Ok(());
    }

    println!("\n📚 All Files ({})\n", shown.len());
    listing::render_table(&shown, config).printstd();
    println!();

    Ok(())
}

async fn view_file(api: &ApiClient, sessions: &SessionStore, file_id: &str) -> Result<()> {
    let view = viewer::open(api, sessions, file_id).await?;

    println!("📄 {}", view.file.name);
    println!("   Type: {}", view.file.file_type.to_uppercase());
    println!("   Expires: {}", view.file.expiration_time.format("%Y-%m-%d %H:%M:%S UTC"));

    match &view.rendering {
        Rendering::Image { url } => println!("🖼️  Image: {}", url),
        Rendering::Document { url } => println!("📑 Document: {}", url),
        Rendering::Download { url } => println!("⬇️  Download: {}", url),
        Rendering::Unavailable => println!("⚠️  Unable to load file"),
    }

    Ok(())
}

async fn download_file(
    api: &ApiClient,
    sessions: &SessionStore,
    file_id: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let saved = viewer::download(api, sessions, file_id, output.as_deref(), print_progress).await;
    eprintln!();
    let saved = saved?;

    println!("✅ Saved to {}", saved.display());
    Ok(())
}

fn print_progress(progress: Progress) {
    let mut stderr = std::io::stderr();
    let _ = match progress.percent {
        Some(pct) => write!(stderr, "\r⬇️  Downloading... {:>3}%", pct),
        None => write!(
            stderr,
            "\r⬇️  Downloading... {}",
            format_file_size(progress.received)
        ),
    };
    let _ = stderr.flush();
}

async fn print_presigned_url(api: &ApiClient, sessions: &SessionStore, file_id: &str) -> Result<()> {
    let files = listing::fetch_files(api, sessions).await?;
    let url = match files.iter().find(|f| f.id == file_id) {
        Some(file) => listing::presigned_url(api, sessions, file).await?,
        None => {
            api.get_file(file_id)
                .await
                .map_err(|e| sessions.on_error(e))?
                .presigned_url
        }
    };

    if url.is_empty() {
        anyhow::bail!("No presigned URL found in response");
    }
    println!("{}", url);
    Ok(())
}
