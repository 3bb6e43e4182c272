//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskdeck_core` linkage (`ping`).
//! - Drive the request channel and a single scheduler scan against the
//!   database named by `TASKDECK_*` environment variables.
//!
//! Usage:
//! - `taskdeck_cli [ping]`
//! - `taskdeck_cli call <method> [args-json]`
//! - `taskdeck_cli scan`

use std::process::ExitCode;
use taskdeck_core::repo::notification_repo::SqliteNotificationRepository;
use taskdeck_core::{invoke_json, run_tick, AppConfig, AppContext, LogNotificationSink};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        None | Some("ping") => {
            println!("taskdeck_core ping={}", taskdeck_core::ping());
            println!("taskdeck_core version={}", taskdeck_core::core_version());
            Ok(())
        }
        Some("call") => call(&args[1..]),
        Some("scan") => scan(),
        Some(other) => Err(format!("unknown command `{other}`; expected ping|call|scan")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn open_context() -> Result<AppContext, String> {
    let config = AppConfig::from_env().map_err(|err| err.to_string())?;
    if let Err(err) = taskdeck_core::init_logging_from_config(&config) {
        eprintln!("warning: logging disabled: {err}");
    }
    AppContext::open(config).map_err(|err| err.to_string())
}

fn call(args: &[String]) -> Result<(), String> {
    let method = args
        .first()
        .ok_or_else(|| "usage: call <method> [args-json]".to_string())?;
    let args_json = args.get(1).map(String::as_str).unwrap_or("");
    let ctx = open_context()?;
    let response = invoke_json(&ctx, method, args_json);
    println!("{response}");

    let parsed: serde_json::Value =
        serde_json::from_str(&response).map_err(|err| err.to_string())?;
    if parsed["ok"] == true {
        Ok(())
    } else {
        Err(format!("{method} failed"))
    }
}

fn scan() -> Result<(), String> {
    let ctx = open_context()?;
    let repo =
        SqliteNotificationRepository::try_new(ctx.connection()).map_err(|err| err.to_string())?;
    let delivered = run_tick(&repo, ctx.clock().now_ms(), &LogNotificationSink)
        .map_err(|err| err.to_string())?;
    println!("delivered={delivered}");
    Ok(())
}
