use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Subcommand};
use soapwire_envelope::{unwrap, Element, EnvelopeConfig};
use soapwire_service::operations::{
    ConflictResolution, DeleteType, MessageDisposition, Shape, Traversal, NAMES,
};
use soapwire_service::{Account, ServerVersion, Service};
use soapwire_transport::Transport;

use crate::exit::{envelope_error, io_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod codes;
pub mod parse;
pub mod payload;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the request envelope(s) for an operation.
    Payload(PayloadArgs),
    /// Run saved response bodies through the dispatcher and print the outcomes.
    Parse(ParseArgs),
    /// List known response codes and how they propagate.
    Codes(CodesArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Payload(args) => payload::run(args, format),
        Command::Parse(args) => parse::run(args, format),
        Command::Codes(args) => codes::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Server API version written into the request header (e.g. Exchange2010_SP2).
    #[arg(
        long,
        value_name = "VERSION",
        default_value = "Exchange2013",
        env = "SOAPWIRE_SERVER_VERSION"
    )]
    pub server_version: String,
    /// Act on behalf of this primary SMTP address.
    #[arg(long, value_name = "SMTP")]
    pub impersonate: Option<String>,
}

#[derive(Args, Debug)]
pub struct PayloadArgs {
    /// Operation name (e.g. GetItem, FindFolder).
    pub operation: String,
    #[command(flatten)]
    pub server: ServerArgs,
    /// Result element type of item operations.
    #[arg(long, value_name = "TYPE", default_value = "Message")]
    pub item_type: String,
    /// Item id, optionally `id:changekey`. Repeatable.
    #[arg(long = "id", value_name = "ID[:CK]")]
    pub ids: Vec<String>,
    /// Distinguished folder name (inbox, calendar, ...). Repeatable.
    #[arg(long = "folder", value_name = "NAME")]
    pub folders: Vec<String>,
    /// Folder id, optionally `id:changekey`. Repeatable.
    #[arg(long = "folder-id", value_name = "ID[:CK]")]
    pub folder_ids: Vec<String>,
    /// Name to resolve. Repeatable.
    #[arg(long = "entry", value_name = "NAME")]
    pub entries: Vec<String>,
    /// XML file whose root element's children are item bodies or item changes.
    #[arg(long, value_name = "FILE")]
    pub items_file: Option<PathBuf>,
    /// XML file holding an m:Restriction element for FindItem.
    #[arg(long, value_name = "FILE")]
    pub restriction_file: Option<PathBuf>,
    /// Base shape of returned items or folders.
    #[arg(long)]
    pub shape: Option<Shape>,
    /// Extra field URI to return. Repeatable.
    #[arg(long = "field", value_name = "URI")]
    pub fields: Vec<String>,
    /// Traversal depth of find operations.
    #[arg(long)]
    pub traversal: Option<Traversal>,
    /// Paging offset of find operations.
    #[arg(long, default_value = "0")]
    pub offset: usize,
    /// Maximum entries per page of find operations.
    #[arg(long)]
    pub page_size: Option<usize>,
    #[arg(long, default_value = "MoveToDeletedItems")]
    pub delete_type: DeleteType,
    #[arg(long, default_value = "AutoResolve")]
    pub conflict_resolution: ConflictResolution,
    #[arg(long)]
    pub message_disposition: Option<MessageDisposition>,
    /// Request full time zone or contact data.
    #[arg(long)]
    pub full: bool,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Operation name the responses belong to.
    pub operation: String,
    /// Saved response bodies, one per request (one per page for paged operations).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    #[command(flatten)]
    pub server: ServerArgs,
    /// Result element type of item operations.
    #[arg(long, value_name = "TYPE", default_value = "Message")]
    pub item_type: String,
    /// Charset label to report for every response body.
    #[arg(long)]
    pub encoding: Option<String>,
}

#[derive(Args, Debug)]
pub struct CodesArgs {
    /// Show only this code.
    pub code: Option<String>,
    /// List only codes that propagate as expected remote conditions.
    #[arg(long)]
    pub expected: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Canonical name of the operation `name` (case-insensitive).
pub fn resolve_operation(name: &str) -> CliResult<&'static str> {
    NAMES
        .into_iter()
        .find(|known| known.eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            CliError::usage(format!(
                "unknown operation '{name}' (expected one of: {})",
                NAMES.join(", ")
            ))
        })
}

pub fn server_version(args: &ServerArgs) -> CliResult<ServerVersion> {
    ServerVersion::from_api_version(&args.server_version).ok_or_else(|| {
        let known: Vec<_> = ServerVersion::ALL
            .iter()
            .map(|v| v.api_version.to_string())
            .collect();
        CliError::usage(format!(
            "unknown server version '{}' (expected one of: {})",
            args.server_version,
            known.join(", ")
        ))
    })
}

pub fn build_service(args: &ServerArgs, transport: Arc<dyn Transport>) -> CliResult<Service> {
    let service = Service::new(transport, server_version(args)?);
    Ok(match &args.impersonate {
        Some(address) => service.with_account(Account::new(address.clone())),
        None => service,
    })
}

/// Parse an XML file into its root element.
pub fn read_element(path: &Path) -> CliResult<Element> {
    let context = format!("read {}", path.display());
    let raw = std::fs::read(path).map_err(|err| io_error(&context, err))?;
    unwrap(&raw, None, &EnvelopeConfig::default()).map_err(|err| envelope_error(&context, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names_resolve_case_insensitively() {
        assert_eq!(resolve_operation("getitem").unwrap(), "GetItem");
        assert_eq!(resolve_operation("FindFolder").unwrap(), "FindFolder");
        let err = resolve_operation("Subscribe").unwrap_err();
        assert_eq!(err.code, crate::exit::USAGE);
        assert!(err.message.contains("ResolveNames"));
    }

    #[test]
    fn unknown_server_version_is_usage_error() {
        let args = ServerArgs {
            server_version: "Exchange1999".into(),
            impersonate: None,
        };
        assert_eq!(server_version(&args).unwrap_err().code, crate::exit::USAGE);
    }
}
