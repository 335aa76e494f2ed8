use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "konfigctl")]
#[command(version)]
#[command(about = "Operator CLI for the konfig control plane", long_about = None)]
pub struct Args {
    /// Control-plane API endpoint
    #[arg(long, default_value = "http://127.0.0.1:8081")]
    pub server: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload a configuration file as a new version
    Upload {
        /// Service the config belongs to
        service: String,

        /// Path to the document; format inferred from the extension
        file: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        created_by: String,
    },

    /// Fetch one config by id and print its content
    Get {
        /// Config id, e.g. payments-v3
        config_id: String,
    },

    /// List stored config versions
    List {
        /// Restrict to one service; lists everything when omitted
        #[arg(long, default_value = "")]
        service: String,

        #[arg(long, default_value_t = 50)]
        limit: i32,

        #[arg(long, default_value_t = 0)]
        offset: i32,
    },

    /// Delete one config version
    Delete {
        config_id: String,
    },

    /// Create a new version carrying an older version's content
    Rollback {
        service: String,

        /// Version to restore; 0 means the one before the current latest
        #[arg(long, default_value_t = 0)]
        to_version: i64,
    },

    /// Show rollout state and subscribed instances for a config
    Status {
        config_id: String,
    },
}
