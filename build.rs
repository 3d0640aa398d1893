//! Build script for the dxoidc crate.
//!
//! Loads OpenID Connect provider settings at compile time so that
//! `ProviderConfig::from_env()` can read them through `option_env!()`.
//!
//! Priority order:
//! 1. Environment variables already set (e.g., from CI/CD, system env)
//! 2. Variables from `.env` file (if it exists)
//! 3. Variables from `.env.example` file (fallback for CI builds)

use std::env;
use std::fs;
use std::path::PathBuf;

const REQUIRED_VARS: [&str; 5] = [
    "OIDC_AUTHORITY",
    "OIDC_CLIENT_ID",
    "OIDC_CLIENT_ORIGIN",
    "OIDC_RESPONSE_TYPE",
    "OIDC_SCOPE",
];

const LOG_LEVELS: [&str; 5] = ["none", "error", "warn", "info", "debug"];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };
    let env_file = manifest_dir.join(".env");
    let env_example_file = manifest_dir.join(".env.example");

    for key in ["OIDC_TOKEN_EXPIRY_WARNING_SECONDS", "OIDC_CLIENT_LOG_LEVEL"] {
        if let Ok(value) = env::var(key) {
            check_optional_value(key, &value);
        }
    }

    let env_vars_set = REQUIRED_VARS
        .iter()
        .filter(|&var| env::var(var).is_ok())
        .count();

    let (file_to_load, file_description) = if env_file.exists() {
        (Some(env_file), ".env")
    } else if env_vars_set == 0 && env_example_file.exists() {
        (Some(env_example_file), ".env.example (fallback)")
    } else {
        (None, "")
    };

    let Some(file_path) = file_to_load else {
        if env_vars_set > 0 {
            println!(
                "cargo:warning=Using OIDC configuration from environment variables ({}/{} set)",
                env_vars_set,
                REQUIRED_VARS.len()
            );
        } else {
            println!("cargo:warning=No .env file found and no OIDC_* environment variables set");
        }
        return;
    };

    let contents = match fs::read_to_string(&file_path) {
        Ok(contents) => contents,
        Err(err) => {
            println!("cargo:warning=Failed to read {}: {}", file_description, err);
            return;
        }
    };

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // KEY=VALUE, values may contain spaces (e.g. OIDC_SCOPE)
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if env::var(key).is_err() {
                let value = value.trim();
                check_optional_value(key, value);
                println!("cargo:rustc-env={}={}", key, value);
            }
        }
    }
}

/// Warns about optional values `ProviderConfig::from_env()` would replace with defaults.
fn check_optional_value(key: &str, value: &str) {
    match key {
        "OIDC_TOKEN_EXPIRY_WARNING_SECONDS" if value.trim().parse::<u32>().is_err() => {
            println!(
                "cargo:warning={} = {:?} is not a number of seconds, the default of 60 will be used",
                key, value
            );
        }
        "OIDC_CLIENT_LOG_LEVEL"
            if !LOG_LEVELS.contains(&value.trim().to_ascii_lowercase().as_str()) =>
        {
            println!(
                "cargo:warning={} = {:?} is not one of {}, the default will be used",
                key,
                value,
                LOG_LEVELS.join(", ")
            );
        }
        _ => {}
    }
}
