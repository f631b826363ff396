//! Command-line interface definitions for the `achim` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use camino::Utf8PathBuf;
use clap::{Args, Parser};

/// Top-level CLI for the `achim` binary.
#[derive(Debug, Parser)]
#[command(
    name = "achim",
    about = "Provision per-user lab scenarios on Scaleway",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Create every instance and network of a scenario for each group member.
    #[command(
        name = "provision",
        about = "Create a scenario's instances and networks for every group member"
    )]
    Provision(ProvisionCommand),
    /// Print the resolved topology without contacting the provider.
    #[command(
        name = "resolve",
        about = "Print the resolved topology as JSON without provisioning"
    )]
    Resolve(ResolveCommand),
    /// Power on every instance of a group.
    #[command(name = "start-group", about = "Power on every instance of a group")]
    StartGroup(GroupCommand),
    /// Power off every instance of a group.
    #[command(name = "stop-group", about = "Power off every instance of a group")]
    StopGroup(GroupCommand),
    /// Delete every instance and network of a group.
    #[command(
        name = "destroy-group",
        about = "Delete every instance and network of a group"
    )]
    DestroyGroup(DestroyGroupCommand),
    /// Power on a single instance.
    #[command(name = "start-instance", about = "Power on a single instance")]
    StartInstance(InstanceCommand),
    /// Power off a single instance.
    #[command(name = "stop-instance", about = "Power off a single instance")]
    StopInstance(InstanceCommand),
    /// Delete a single instance.
    #[command(name = "destroy-instance", about = "Delete a single instance")]
    DestroyInstance(DestroyInstanceCommand),
    /// Send an HTTP GET to every instance of a group.
    #[command(
        name = "probe",
        about = "Check an HTTP service on every instance of a group"
    )]
    Probe(ProbeCommand),
}

/// Scenario and group descriptor paths.
#[derive(Debug, Args)]
pub(crate) struct Descriptors {
    /// Scenario descriptor (YAML).
    #[arg(long, short = 's', value_name = "PATH")]
    pub(crate) scenario: Utf8PathBuf,
    /// Group descriptor (YAML).
    #[arg(long, short = 'g', value_name = "PATH")]
    pub(crate) group: Utf8PathBuf,
    /// Reject `connects` hosts that name no instance template.
    #[arg(long)]
    pub(crate) strict_connections: bool,
}

/// Arguments for the `achim provision` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ProvisionCommand {
    #[command(flatten)]
    pub(crate) descriptors: Descriptors,
    /// Value of the `context` label applied to every resource.
    #[arg(long, value_name = "CONTEXT", default_value = "")]
    pub(crate) context: String,
    /// Power instances on once created.
    #[arg(long)]
    pub(crate) autostart: bool,
    /// Skip resources whose names already exist instead of aborting.
    #[arg(long)]
    pub(crate) ignore_existing: bool,
}

/// Arguments for the `achim resolve` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ResolveCommand {
    #[command(flatten)]
    pub(crate) descriptors: Descriptors,
}

/// Arguments naming a group.
#[derive(Debug, Parser)]
pub(crate) struct GroupCommand {
    /// Group name as found in the `group` label.
    #[arg(value_name = "GROUP")]
    pub(crate) group: String,
}

/// Arguments for the `achim destroy-group` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct DestroyGroupCommand {
    /// Group name as found in the `group` label.
    #[arg(value_name = "GROUP")]
    pub(crate) group: String,
    /// Confirm the deletion.
    #[arg(long)]
    pub(crate) sure: bool,
    /// Also delete resources labelled `permanent`.
    #[arg(long)]
    pub(crate) destroy_permanent: bool,
}

/// Arguments naming a single instance.
#[derive(Debug, Parser)]
pub(crate) struct InstanceCommand {
    /// Canonical instance name, e.g. `db-alice`.
    #[arg(value_name = "NAME")]
    pub(crate) name: String,
}

/// Arguments for the `achim destroy-instance` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct DestroyInstanceCommand {
    /// Canonical instance name, e.g. `db-alice`.
    #[arg(value_name = "NAME")]
    pub(crate) name: String,
    /// Confirm the deletion.
    #[arg(long)]
    pub(crate) sure: bool,
    /// Allow deleting an instance labelled `permanent`.
    #[arg(long)]
    pub(crate) destroy_permanent: bool,
}

/// Arguments for the `achim probe` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ProbeCommand {
    /// Group name as found in the `group` label.
    #[arg(value_name = "GROUP")]
    pub(crate) group: String,
    /// Path appended to `http://<ip>/`.
    #[arg(long, value_name = "PATH", default_value = "")]
    pub(crate) suffix: String,
}
