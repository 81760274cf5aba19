use std::path::Path;

use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;

use hieship::SessionError;
use hieship::cli::Cli;
use hieship::outcome::RunReport;
use hieship::pipeline::{self, RunOptions};
use hieship::remote::{Ssh2Store, connect_session};
use hieship::runlog::RunLog;
use hieship::settings::{ConflictPolicy, Settings};
use hieship::transfer::EngineOptions;
use hieship::util;

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hieship=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn print_summary(cli: &Cli, report: &RunReport) {
    if !cli.quiet {
        println!(
            "{} directories, {} files shipped ({}), {} files moved to backups",
            report.dirs.len(),
            report.uploaded_files(),
            util::human_bytes(report.uploaded_bytes()),
            report.moved_files()
        );
        let colors = util::try_enable_ansi_on_windows();
        if report.errors_found() {
            if colors {
                println!("{}", "*** Unsuccessful run".red());
            } else {
                println!("*** Unsuccessful run");
            }
        } else if colors {
            println!("{}", "*** Completed successfully".green());
        } else {
            println!("*** Completed successfully");
        }
    }
    if cli.json {
        let obj = serde_json::json!({
            "directories": report.dirs.len(),
            "uploaded_files": report.uploaded_files(),
            "uploaded_bytes": report.uploaded_bytes(),
            "moved_files": report.moved_files(),
            "failures": report.failure_count(),
            "halted": report.halted,
            "errors": report.errors_found(),
        });
        if let Ok(line) = serde_json::to_string(&obj) {
            println!("{}", line);
        }
    }
}

fn execute(cli: &Cli, settings_path: &Path, log: &mut RunLog) -> Result<RunReport> {
    let mut settings = Settings::load(settings_path)?;
    if let Some(host) = &cli.host {
        settings.host = host.clone();
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }
    let policy = if cli.keep_going { ConflictPolicy::Skip } else { settings.on_conflict };

    let passphrase = util::prompt_passphrase("Please enter your key passphrase: ")?;
    let sess = connect_session(&settings, &passphrase)?;
    let sftp = sess
        .sftp()
        .map_err(|e| -> anyhow::Error { SessionError::SftpChannelFailed(settings.addr(), e.to_string()).into() })?;
    let store = Ssh2Store(sftp);

    let opts = RunOptions {
        policy,
        engine: EngineOptions {
            layout: settings.layout,
            suffix: settings.transfer_suffix.clone(),
            quiet: cli.quiet,
        },
        dry_run: cli.dry_run,
    };
    pipeline::run(&store, &settings, &opts, log)
}

fn run(cli: &Cli) -> Result<RunReport> {
    let base_dir = util::exe_dir()?;
    let settings_path = cli.settings.clone().unwrap_or_else(|| base_dir.join("settings.yaml"));
    let mut log = RunLog::open(&base_dir.join("log.txt"))?;

    let report = match execute(cli, &settings_path, &mut log) {
        Ok(report) => report,
        Err(e) => {
            // startup failures still leave a verdict and the end banner
            if e.downcast_ref::<SessionError>().is_some() {
                log.line(&format!("Problem sftp'ing to HIE-Storage. Error: {}", e));
            } else {
                log.line(&format!("{:#}", e));
            }
            log.line("*** Unsuccessful run");
            log.finish();
            return Err(e);
        }
    };

    if report.errors_found() {
        log.line("*** Unsuccessful run");
    } else {
        log.line("*** Completed successfully");
    }
    log.finish();
    print_summary(cli, &report);
    Ok(report)
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        init_tracing();
    }
    match run(&cli) {
        Ok(report) => {
            let code = if report.errors_found() { 1 } else { 0 };
            std::process::exit(code);
        }
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    }
}
