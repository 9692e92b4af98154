use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use shctx::{
    decode_record, enrich, enrich_batch, rank_parallel, session_record, stripped, BuildInfo,
    Config, Record, SessionInit,
};

const MACHINE_ID_PATH: &str = "/etc/machine-id";

#[derive(Parser)]
#[command(name = "shctx")]
#[command(about = "Enrich shell command records and rank history by context")]
struct Cli {
    /// Log level (trace, debug, info, warn, error); overrides RUST_LOG and the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode and enrich records (one JSON object per line)
    Enrich {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
    },
    /// Rank history records by distance to a query record
    Rank {
        /// File whose first record is the query
        #[arg(long)]
        query: PathBuf,
        /// History records, one JSON object per line
        #[arg(long)]
        history: PathBuf,
        /// Number of records to print [default: display.max_results]
        #[arg(long)]
        limit: Option<usize>,
        /// Drop post-execution information from the query first
        #[arg(long)]
        strip: bool,
        /// Print per-dimension contributions
        #[arg(long)]
        explain: bool,
    },
    /// Build the session start record from captured shell values
    #[command(allow_negative_numbers = true)]
    SessionInit(SessionInitArgs),
}

#[derive(Args)]
struct SessionInitArgs {
    /// Show version and exit
    #[arg(long)]
    version: bool,
    /// Show git revision and exit
    #[arg(long)]
    revision: bool,
    /// Abort if version doesn't match
    #[arg(long, default_value = "")]
    require_version: String,
    /// Abort if revision doesn't match
    #[arg(long, default_value = "")]
    require_revision: String,

    #[arg(long, default_value = "")]
    shell: String,
    #[arg(long, default_value = "")]
    uname: String,
    #[arg(long, default_value = "")]
    session_id: String,

    /// $COLUMNS
    #[arg(long, default_value = "-1")]
    cols: String,
    /// $LINES
    #[arg(long, default_value = "-1")]
    lines: String,
    #[arg(long, default_value = "")]
    home: String,
    #[arg(long, default_value = "")]
    lang: String,
    #[arg(long, default_value = "")]
    lc_all: String,
    #[arg(long, default_value = "")]
    login: String,
    /// $SHELL
    #[arg(long, default_value = "")]
    shell_env: String,
    #[arg(long, default_value = "")]
    term: String,

    /// $$
    #[arg(long, default_value_t = -1)]
    pid: i64,
    /// $$ at session start
    #[arg(long, default_value_t = -1)]
    session_pid: i64,
    #[arg(long, default_value_t = -1)]
    shlvl: i64,
    #[arg(long, default_value = "")]
    host: String,
    #[arg(long, default_value = "")]
    hosttype: String,
    #[arg(long, default_value = "")]
    ostype: String,
    #[arg(long, default_value = "")]
    machtype: String,

    /// Timezone offset as +HHMM
    #[arg(long, default_value = "")]
    timezone_before: String,

    #[arg(long, default_value = "")]
    os_release_id: String,
    #[arg(long, default_value = "")]
    os_release_version_id: String,
    #[arg(long, default_value = "")]
    os_release_id_like: String,
    #[arg(long, default_value = "")]
    os_release_name: String,
    #[arg(long, default_value = "")]
    os_release_pretty_name: String,

    /// $EPOCHREALTIME before the command
    #[arg(long, default_value = "-1")]
    realtime_before: String,
    /// $EPOCHREALTIME at session start
    #[arg(long, default_value = "-1")]
    realtime_session: String,
    /// Seconds since boot at session start
    #[arg(long, default_value = "-1")]
    realtime_sess_since_boot: String,
}

impl SessionInitArgs {
    fn into_session_init(self, machine_id: String, instance_uuid: String) -> SessionInit {
        SessionInit {
            shell: self.shell,
            uname: self.uname,
            session_id: self.session_id,
            cols: self.cols,
            lines: self.lines,
            home: self.home,
            lang: self.lang,
            lc_all: self.lc_all,
            login: self.login,
            shell_env: self.shell_env,
            term: self.term,
            pid: self.pid,
            session_pid: self.session_pid,
            shlvl: self.shlvl,
            host: self.host,
            hosttype: self.hosttype,
            ostype: self.ostype,
            machtype: self.machtype,
            timezone_before: self.timezone_before,
            os_release_id: self.os_release_id,
            os_release_version_id: self.os_release_version_id,
            os_release_id_like: self.os_release_id_like,
            os_release_name: self.os_release_name,
            os_release_pretty_name: self.os_release_pretty_name,
            realtime_before: self.realtime_before,
            realtime_session: self.realtime_session,
            realtime_sess_since_boot: self.realtime_sess_since_boot,
            machine_id,
            instance_uuid,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::new().context("failed to load ~/.shctx/config.toml")?;

    let env_level = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    init_logging(log_directive(
        cli.log_level.as_deref(),
        env_level.as_deref(),
        &config.logging.level,
    ))?;

    match cli.command {
        Commands::Enrich { file } => {
            let records = match file {
                Some(path) => read_records_from(&path)?,
                None => read_records(io::stdin().lock(), "<stdin>")?,
            };
            info!("enriching {} records", records.len());

            let stdout = io::stdout();
            let mut out = stdout.lock();
            for record in enrich_batch(records) {
                writeln!(out, "{}", record.to_json_string()?)?;
            }
        }
        Commands::Rank {
            query,
            history,
            limit,
            strip,
            explain,
        } => {
            let query_record = read_records_from(&query)?
                .into_iter()
                .next()
                .with_context(|| format!("{} contains no record", query.display()))?;
            let mut query_record = enrich(query_record);
            if strip {
                query_record = stripped(&query_record);
            }

            let candidates: Vec<_> = enrich_batch(read_records_from(&history)?)
                .into_iter()
                .filter(|r| !r.invalid)
                .collect();
            debug!("ranking {} valid history records", candidates.len());

            let params = config.scoring;
            let limit = limit.unwrap_or(config.display.max_results);
            let ranked = rank_parallel(&query_record, &candidates, &params);

            if ranked.is_empty() {
                println!("{}", "No records found".yellow());
            }
            for (i, hit) in ranked.iter().take(limit).enumerate() {
                println!(
                    "{:>3}. {} {}",
                    i + 1,
                    format!("{:>8.3}", hit.distance).cyan(),
                    hit.record.base().cmd_line.bold()
                );
                if explain {
                    for (dim, term) in query_record.distance_breakdown(hit.record, &params) {
                        println!("       {:<18} {:+.3}", format!("{dim:?}").dimmed(), term);
                    }
                }
            }
        }
        Commands::SessionInit(args) => {
            let build = BuildInfo::current();
            if args.version {
                println!("{}", build.version);
                return Ok(());
            }
            if args.revision {
                println!("{}", build.revision);
                return Ok(());
            }
            if let Err(err) = build.check_required(&args.require_version, &args.require_revision) {
                println!("Please restart/reload this terminal session ({err})");
                std::process::exit(3);
            }

            let uuid_path = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".shctx")
                .join("instance-uuid");
            let init = args.into_session_init(
                read_file_content(Path::new(MACHINE_ID_PATH)),
                read_file_content(&uuid_path),
            );
            let record = session_record(&init, &build)?;
            println!("{}", serde_json::to_string(&record)?);
        }
    }

    Ok(())
}

/// `--log-level` wins over `RUST_LOG`, which wins over the config file.
fn log_directive<'a>(flag: Option<&'a str>, env: Option<&'a str>, config: &'a str) -> &'a str {
    flag.or(env.filter(|v| !v.trim().is_empty())).unwrap_or(config)
}

fn init_logging(directive: &str) -> Result<()> {
    let filter = EnvFilter::new(directive);
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn read_records_from(path: &Path) -> Result<Vec<Record>> {
    let file = fs::File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    read_records(BufReader::new(file), &path.display().to_string())
}

fn read_records(reader: impl BufRead, source: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = decode_record(line.as_bytes())
            .with_context(|| format!("{source}:{}: undecodable record", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

fn read_file_content(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content.trim().to_string(),
        Err(err) => {
            debug!("cannot read {}: {err}", path.display());
            String::new()
        }
    }
}
