mod command_line;

use std::process::ExitCode;

use bytes::Bytes;
use clap::Parser;
use tonic::transport::Channel;

use command_line::Args;
use command_line::Command;
use konfig_core::constants::MAX_MESSAGE_SIZE_BYTES;
use konfig_proto::api::config_api_service_client::ConfigApiServiceClient;
use konfig_proto::api::DeleteConfigRequest;
use konfig_proto::api::GetConfigRequest;
use konfig_proto::api::GetRolloutStatusRequest;
use konfig_proto::api::ListConfigsRequest;
use konfig_proto::api::RollbackRequest;
use konfig_proto::api::UploadConfigRequest;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn connect(server: &str) -> Result<ConfigApiServiceClient<Channel>, Box<dyn std::error::Error>> {
    let client = ConfigApiServiceClient::connect(server.to_string())
        .await?
        .max_decoding_message_size(MAX_MESSAGE_SIZE_BYTES)
        .max_encoding_message_size(MAX_MESSAGE_SIZE_BYTES);
    Ok(client)
}

fn format_from_path(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".yaml") {
        "yaml"
    } else if lower.ends_with(".yml") {
        "yml"
    } else {
        "json"
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = connect(&args.server).await?;

    match args.command {
        Command::Upload {
            service,
            file,
            description,
            created_by,
        } => {
            let content = std::fs::read(&file)?;
            let format = format_from_path(&file);

            let response = client
                .upload_config(UploadConfigRequest {
                    service_name: service,
                    content: Bytes::from(content),
                    format: format.to_string(),
                    description,
                    created_by,
                    validate: true,
                })
                .await?
                .into_inner();

            if !response.success {
                eprintln!("upload rejected: {}", response.message);
                for issue in &response.validation_errors {
                    eprintln!("  - {issue}");
                }
                return Err(response.message.into());
            }
            println!("uploaded {} (v{})", response.config_id, response.version);
        }

        Command::Get { config_id } => {
            let response = client
                .get_config(GetConfigRequest { config_id })
                .await?
                .into_inner();

            if !response.success {
                return Err(response.message.into());
            }
            let config = response.config.unwrap_or_default();
            println!(
                "# {} v{} ({}, by {}, at {})",
                config.config_id,
                config.version,
                config.format,
                config.created_by,
                config.created_at
            );
            println!("{}", String::from_utf8_lossy(&config.content));
        }

        Command::List {
            service,
            limit,
            offset,
        } => {
            let response = client
                .list_configs(ListConfigsRequest {
                    service_name: service,
                    limit,
                    offset,
                })
                .await?
                .into_inner();

            if !response.success {
                return Err(response.message.into());
            }
            println!(
                "{:<28} {:>8} {:<8} {:<12} {}",
                "CONFIG", "VERSION", "FORMAT", "CREATED BY", "DESCRIPTION"
            );
            for meta in &response.configs {
                println!(
                    "{:<28} {:>8} {:<8} {:<12} {}",
                    meta.config_id, meta.version, meta.format, meta.created_by, meta.description
                );
            }
            println!("total: {}", response.total_count);
        }

        Command::Delete { config_id } => {
            let response = client
                .delete_config(DeleteConfigRequest {
                    config_id: config_id.clone(),
                })
                .await?
                .into_inner();

            if !response.success {
                return Err(response.message.into());
            }
            println!("deleted {config_id}");
        }

        Command::Rollback {
            service,
            to_version,
        } => {
            let response = client
                .rollback(RollbackRequest {
                    service_name: service,
                    target_version: to_version,
                })
                .await?
                .into_inner();

            if !response.success {
                return Err(response.message.into());
            }
            println!("{} -> {}", response.message, response.config_id);
        }

        Command::Status { config_id } => {
            let response = client
                .get_rollout_status(GetRolloutStatusRequest { config_id })
                .await?
                .into_inner();

            if !response.success {
                return Err(response.message.into());
            }
            if let Some(state) = response.rollout_state {
                println!(
                    "rollout: {} [{}] {}% of {}% (started {})",
                    state.config_id,
                    state.status().as_str_name(),
                    state.current_percentage,
                    state.target_percentage,
                    state.started_at
                );
            }
            println!("instances:");
            for instance in &response.instances {
                println!(
                    "  {:<24} v{:<6} {:<12} last heartbeat {}",
                    instance.instance_id,
                    instance.current_config_version,
                    instance.status,
                    instance.last_heartbeat
                );
            }
        }
    }

    Ok(())
}
