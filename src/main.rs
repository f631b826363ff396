//! Binary entry point for the achim CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use achim::{
    DescriptorError, GroupActionSummary, GroupError, GroupLifecycle, HttpProber, PreviewError,
    ProbeResult, ProvisionError, ProvisionOptions, ScalewayBackend, ScalewayBackendError,
    ScalewayConfig, ScenarioOrchestrator, load_group, load_scenario, preview,
};

mod cli;

use cli::{
    Cli, Descriptors, DestroyGroupCommand, DestroyInstanceCommand, ProvisionCommand,
    ResolveCommand,
};

const LOG_ENV: &str = "ACHIM_LOG";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("backend error: {0}")]
    Backend(#[from] ScalewayBackendError),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error(transparent)]
    Preview(#[from] PreviewError),
    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError<ScalewayBackendError>),
    #[error("group operation failed: {0}")]
    Group(#[from] GroupError<ScalewayBackendError>),
    #[error("refusing to destroy {0} without --sure")]
    NotConfirmed(String),
    #[error("failed to write output: {0}")]
    Output(String),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli {
        Cli::Provision(command) => provision(command).await,
        Cli::Resolve(command) => resolve(&command),
        Cli::StartGroup(command) => {
            let summary = lifecycle()?.start(&command.group).await?;
            write_summary(io::stdout(), "started", &summary)
        }
        Cli::StopGroup(command) => {
            let summary = lifecycle()?.stop(&command.group).await?;
            write_summary(io::stdout(), "stopped", &summary)
        }
        Cli::DestroyGroup(command) => destroy(command).await,
        Cli::StartInstance(command) => {
            let summary = lifecycle()?.start_instance(&command.name).await?;
            write_summary(io::stdout(), "started", &summary)
        }
        Cli::StopInstance(command) => {
            let summary = lifecycle()?.stop_instance(&command.name).await?;
            write_summary(io::stdout(), "stopped", &summary)
        }
        Cli::DestroyInstance(command) => destroy_instance(command).await,
        Cli::Probe(command) => {
            let results = lifecycle()?
                .probe(&command.group, &command.suffix, &HttpProber::default())
                .await?;
            write_probe(io::stdout(), &results)
        }
    }
}

fn backend() -> Result<ScalewayBackend, CliError> {
    let config =
        ScalewayConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    Ok(ScalewayBackend::new(config)?)
}

fn lifecycle() -> Result<GroupLifecycle<ScalewayBackend>, CliError> {
    backend().map(GroupLifecycle::new)
}

fn load_descriptors(
    descriptors: &Descriptors,
) -> Result<(achim::Scenario, achim::Group), CliError> {
    let scenario = load_scenario(&descriptors.scenario)?;
    let group = load_group(&descriptors.group)?;
    Ok((scenario, group))
}

async fn provision(command: ProvisionCommand) -> Result<(), CliError> {
    let (scenario, group) = load_descriptors(&command.descriptors)?;
    let options = ProvisionOptions {
        context: command.context,
        autostart: command.autostart,
        ignore_existing: command.ignore_existing,
        strict_connections: command.descriptors.strict_connections,
    };
    let orchestrator = ScenarioOrchestrator::new(backend()?);
    let report = orchestrator.provision(&scenario, &group, &options).await?;
    write_json(io::stdout(), &report)
}

fn resolve(command: &ResolveCommand) -> Result<(), CliError> {
    let (scenario, group) = load_descriptors(&command.descriptors)?;
    let resolved = preview(&scenario, &group, command.descriptors.strict_connections)?;
    write_json(io::stdout(), &resolved)
}

async fn destroy(command: DestroyGroupCommand) -> Result<(), CliError> {
    if !command.sure {
        return Err(CliError::NotConfirmed(format!("group {}", command.group)));
    }
    let summary = lifecycle()?
        .destroy(&command.group, command.destroy_permanent)
        .await?;
    write_summary(io::stdout(), "destroyed", &summary)
}

async fn destroy_instance(command: DestroyInstanceCommand) -> Result<(), CliError> {
    if !command.sure {
        return Err(CliError::NotConfirmed(format!("instance {}", command.name)));
    }
    let summary = lifecycle()?
        .destroy_instance(&command.name, command.destroy_permanent)
        .await?;
    write_summary(io::stdout(), "destroyed", &summary)
}

fn write_json(mut target: impl Write, value: &impl Serialize) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|err| CliError::Output(err.to_string()))?;
    writeln!(target, "{rendered}").map_err(|err| CliError::Output(err.to_string()))
}

fn write_summary(
    mut target: impl Write,
    verb: &str,
    summary: &GroupActionSummary,
) -> Result<(), CliError> {
    let mut write = |line: String| {
        writeln!(target, "{line}").map_err(|err| CliError::Output(err.to_string()))
    };
    for name in summary.instances.iter().chain(&summary.networks) {
        write(format!("{verb} {name}"))?;
    }
    for name in &summary.skipped {
        write(format!("kept {name} (permanent)"))?;
    }
    Ok(())
}

fn write_probe(mut target: impl Write, results: &[ProbeResult]) -> Result<(), CliError> {
    for result in results {
        writeln!(target, "{}\t{}\t{}", result.ip, result.status, result.owner)
            .map_err(|err| CliError::Output(err.to_string()))?;
    }
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(buf: Vec<u8>) -> String {
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn write_summary_lists_resources_and_kept_items() {
        let summary = GroupActionSummary {
            instances: vec![String::from("db-alice")],
            networks: vec![String::from("net-alice")],
            skipped: vec![String::from("db-bob")],
        };
        let mut buf = Vec::new();

        write_summary(&mut buf, "destroyed", &summary).expect("write");

        assert_eq!(
            rendered(buf),
            "destroyed db-alice\ndestroyed net-alice\nkept db-bob (permanent)\n"
        );
    }

    #[test]
    fn write_json_pretty_prints() {
        let mut buf = Vec::new();
        write_json(&mut buf, &serde_json::json!({"group": "g1"})).expect("write");
        assert_eq!(rendered(buf), "{\n  \"group\": \"g1\"\n}\n");
    }

    #[tokio::test]
    async fn destroy_requires_confirmation() {
        let err = destroy(DestroyGroupCommand {
            group: String::from("g1"),
            sure: false,
            destroy_permanent: false,
        })
        .await
        .expect_err("confirmation required");

        assert!(matches!(err, CliError::NotConfirmed(ref target) if target == "group g1"));
    }

    #[tokio::test]
    async fn destroy_instance_requires_confirmation() {
        let err = destroy_instance(DestroyInstanceCommand {
            name: String::from("db-alice"),
            sure: false,
            destroy_permanent: true,
        })
        .await
        .expect_err("confirmation required");

        assert_eq!(
            err.to_string(),
            "refusing to destroy instance db-alice without --sure"
        );
    }

    #[test]
    fn write_probe_prints_tab_separated_rows() {
        let results = [
            ProbeResult {
                ip: String::from("51.15.0.10"),
                status: achim::ProbeStatus::Code(200),
                owner: String::from("alice"),
            },
            ProbeResult {
                ip: String::from("51.15.0.11"),
                status: achim::ProbeStatus::Unreachable,
                owner: String::from("bob"),
            },
        ];
        let mut buf = Vec::new();

        write_probe(&mut buf, &results).expect("write");

        assert_eq!(
            rendered(buf),
            "51.15.0.10\t200\talice\n51.15.0.11\tERR\tbob\n"
        );
    }

    #[test]
    fn write_error_writes_cli_error() {
        let mut buf = Vec::new();
        write_error(&mut buf, &CliError::NotConfirmed(String::from("g1")));
        assert!(rendered(buf).contains("without --sure"));
    }
}
