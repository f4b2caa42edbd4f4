//! Init command implementation
//!
//! Scaffolds a Warden deployment directory: `warden.toml`, `.env.example`,
//! `.gitignore` and the `data/` directory for the local database.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (warden.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Warden");

    let base_path = &config.path;

    let config_path = base_path.join("warden.toml");
    if config_path.exists() && !config.force {
        output.warning("warden.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    let data_dir = base_path.join("data");
    if !data_dir.exists() {
        if let Err(e) = fs::create_dir_all(&data_dir) {
            output.error(&format!("Failed to create data/: {}", e));
            return InitResult::Error(e.to_string());
        }
        output.created("directory", "data");
    }

    let files = [
        ("config", "warden.toml", generate_warden_toml(&config), config.force),
        ("env", ".env.example", generate_env_example(), config.force),
        // Never clobber an existing .gitignore
        ("file", ".gitignore", generate_gitignore(), false),
    ];

    for (kind, name, content, force) in files {
        match write_file(&base_path.join(name), &content, force) {
            Ok(true) => output.created(kind, name),
            Ok(false) => output.skipped(name, "already exists"),
            Err(e) => {
                output.error(&format!("Failed to create {}: {}", name, e));
                return InitResult::Error(e.to_string());
            }
        }
    }

    output.complete("Warden initialized successfully!");

    output.header("Next Steps");
    output.newline();
    output.info("1. Set the signing secret:");
    output.command("cp .env.example .env");
    output.command("# Edit .env and set JWT_SECRET (min 32 chars)");
    output.newline();
    output.info("2. Start the server:");
    output.command("warden-server");

    output.hint(&format!(
        "Server will be available at http://{}:{}",
        config.host, config.port
    ));

    InitResult::Success
}

/// Writes `content` unless the file exists and `force` is off.
/// Returns whether the file was written.
fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    fs::write(path, content)?;
    Ok(true)
}

fn generate_warden_toml(config: &InitConfig) -> String {
    format!(
        r#"# Warden Configuration
# ====================
# Generated by: warden-server init
#
# REQUIRED: Set this environment variable before starting:
#   - JWT_SECRET: the token signing secret (min 32 characters)

[server]
host = "{host}"
port = {port}
log_level = "info"

[auth]
jwt_secret_env = "JWT_SECRET"
# Token lifetime in seconds
token_ttl_secs = 3600
# Status for rejected sign-ins: 401 or 400
signin_failure_status = 401

[database]
# Use ":memory:" for a throwaway database
url = "./data/warden.db"
# Remote Turso database (requires the `turso` feature)
# turso_url_env = "TURSO_URL"
# turso_token_env = "TURSO_AUTH_TOKEN"
"#,
        host = config.host,
        port = config.port,
    )
}

fn generate_env_example() -> String {
    r#"# Warden Environment Variables
# ============================
# Copy this file to .env and fill in the values.

# REQUIRED: token signing secret (minimum 32 characters)
# Generate with: openssl rand -base64 32
JWT_SECRET=change-me-in-production-use-at-least-32-characters

# Optional: Logging level (trace, debug, info, warn, error)
RUST_LOG=info,warden=debug

# Optional: Turso cloud database (if using remote database)
# TURSO_URL=libsql://your-db.turso.io
# TURSO_AUTH_TOKEN=your-token
"#
    .to_string()
}

fn generate_gitignore() -> String {
    r#"# Warden Generated Files
/data/
*.db
*.db-journal

# Environment
.env
.env.local

# Rust
/target/
"#
    .to_string()
}
