//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the signal handler,
//! validates paths, starts the watcher and runs either a one-shot relocation
//! or the console loop.

use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use sortbox::cli::Args;
use sortbox::config::{CONFIG_ENV, LoadResult, load_config_from_xml_path, load_or_init};
use sortbox::indexer;
use sortbox::output as out;
use sortbox::{
    Bookkeeper, Config, DirectoryWatcher, OperationLog, RelocationEngine, RelocationService, Repl,
    ShutdownToken, SortboxError, default_config_path,
};

use crate::logging::init_tracing;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location(&args);
        return Ok(());
    }

    // The folder index is standalone: no config, watcher or pool.
    if let Some(root) = &args.index_dirs {
        return index_gallery(root, args.index_output.as_deref());
    }

    let mut cfg = match load_config(&args)? {
        Some(cfg) => cfg,
        None => return Ok(()),
    };
    args.apply_overrides(&mut cfg);

    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {}", e));
        e
    })?;

    // Guard needs to be dropped on SIGINT to flush logs
    let token = ShutdownToken::new();
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        let token = token.clone();
        ctrlc::set_handler(move || {
            token.cancel();
            out::print_warn("Received interrupt; shutting down...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
            // The console may be parked in a blocking stdin read.
            std::process::exit(130);
        })
        .context("failed to install signal handler")?;
    }

    debug!("Starting sortbox: {:?}", args);

    let result = serve(&args, &mut cfg, &token);
    if let Err(e) = &result {
        match e.downcast_ref::<SortboxError>() {
            Some(se) => error!(code = se.code(), error = %se, "sortbox stopped"),
            None => error!(error = ?e, "sortbox stopped"),
        }
    }

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    result
}

fn serve(args: &Args, cfg: &mut Config, token: &ShutdownToken) -> Result<()> {
    cfg.validate()?;
    cfg.normalize();

    let oplog = Arc::new(OperationLog::new(&cfg.operation_log));
    let bookkeeper = Bookkeeper::new(&cfg.unclassified_dir, oplog);
    let engine = RelocationEngine::new(cfg.pool_size, bookkeeper.clone())?;
    let service = RelocationService::new(&cfg.mapping_file, engine);

    let watcher = if args.no_watch {
        None
    } else {
        Some(DirectoryWatcher::start(
            &cfg.watch_dir,
            bookkeeper,
            token.clone(),
        )?)
    };

    info!(
        watch_dir = %cfg.watch_dir.display(),
        unclassified_dir = %cfg.unclassified_dir.display(),
        mapping = %cfg.mapping_file.display(),
        pool_size = cfg.pool_size,
        "sortbox ready"
    );

    let outcome = match &args.code {
        Some(code) => run_once(&service, code),
        None => {
            let repl = Repl::new(&service, token.clone());
            let repl = if atty::is(atty::Stream::Stdin) {
                repl
            } else {
                repl.quiet_prompt()
            };
            repl.run(io::stdin().lock())
        }
    };

    if let Some(w) = watcher {
        w.stop();
    }
    outcome
}

fn run_once(service: &RelocationService, code: &str) -> Result<()> {
    match service.run(code) {
        Ok(report) => {
            out::print_user(&format!(
                "{}: moved {} file(s), {} failed",
                report.outcome, report.moved, report.failed
            ));
            out::print_success_separator();
            Ok(())
        }
        Err(e) => {
            out::print_error(&e.to_string());
            out::print_exception_separator();
            Err(e.into())
        }
    }
}

fn index_gallery(root: &Path, output: Option<&Path>) -> Result<()> {
    let dirs = indexer::collect_subdirectories(root)?;
    match output {
        Some(file) => {
            indexer::write_index(&dirs, file)?;
            out::print_success(&format!(
                "Wrote {} folder(s) under {} to {}",
                dirs.len(),
                root.display(),
                file.display()
            ));
        }
        None => dirs.iter().for_each(|d| out::print_user(&d.display().to_string())),
    }
    Ok(())
}

/// Resolve and load the XML config. Returns None after writing a template.
fn load_config(args: &Args) -> Result<Option<Config>> {
    if let Some(path) = &args.config_path {
        let cfg = load_config_from_xml_path(path)?;
        return Ok(Some(cfg));
    }
    match load_or_init()? {
        LoadResult::Loaded(cfg) => Ok(Some(*cfg)),
        LoadResult::CreatedTemplate(path) => {
            out::print_success(&format!(
                "A template sortbox config was written to: {}",
                path.display()
            ));
            out::print_info("Edit the file to set `watch_dir`, `unclassified_dir` and `mapping_file`, then re-run.");
            out::print_info(&format!("To use a different location set {CONFIG_ENV} or pass --config-path."));
            Ok(None)
        }
    }
}

fn print_config_location(args: &Args) {
    if let Some(p) = &args.config_path {
        out::print_info(&format!("Using --config-path (explicit):\n  {}\n", p.display()));
        return;
    }
    if let Ok(cfg_env) = std::env::var(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {}\n", cfg_env));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or set it to another file."));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default sortbox config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run without --print-config to create a template.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}
