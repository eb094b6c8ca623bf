use std::sync::Arc;

use soapwire_envelope::{wrap, Element};
use soapwire_service::operations::{
    self, CreateItem, DeleteItem, FindFolder, FindItem, FolderId, GetFolder, GetItem,
    GetServerTimeZones, ItemId, ResolveNames, Shape, UpdateItem,
};
use soapwire_service::{chunkify, Service};
use soapwire_transport::ReplayTransport;

use crate::cmd::{build_service, read_element, resolve_operation, PayloadArgs};
use crate::exit::{envelope_error, service_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_envelopes, OutputFormat};

pub fn run(args: PayloadArgs, format: OutputFormat) -> CliResult<i32> {
    let name = resolve_operation(&args.operation)?;
    let service = build_service(&args.server, Arc::new(ReplayTransport::new("offline://")))?;

    let envelopes = build_payloads(name, &args, &service)?
        .iter()
        .map(|payload| {
            let bytes = wrap(
                payload,
                &service.version().api_version,
                service.account().map(|a| a.primary_smtp_address.as_str()),
            )
            .map_err(|err| envelope_error("wrap request", err))?;
            String::from_utf8(bytes.to_vec())
                .map_err(|err| CliError::new(INTERNAL, format!("wrap request: {err}")))
        })
        .collect::<CliResult<Vec<_>>>()?;

    print_envelopes(name, &envelopes, format);
    Ok(SUCCESS)
}

/// One payload per request the operation would send.
fn build_payloads(name: &str, args: &PayloadArgs, service: &Service) -> CliResult<Vec<Element>> {
    let context = format!("build {name}");
    let fail = |err| service_error(&context, err);

    if let Some((operation, _)) = operations::describe(name, &args.item_type) {
        if let Some(major) = operation.min_major_version {
            service.require_version(major, operation.name).map_err(fail)?;
        }
    }

    let payloads = match name {
        GetServerTimeZones::NAME => vec![GetServerTimeZones {
            return_full_timezone_data: args.full,
        }
        .payload()],
        GetFolder::NAME => vec![GetFolder::new(folders(args))
            .with_shape(args.shape.unwrap_or(Shape::IdOnly))
            .with_additional_fields(args.fields.clone())
            .payload()
            .map_err(fail)?],
        ResolveNames::NAME => vec![ResolveNames::new(args.entries.clone())
            .with_full_contact_data(args.full)
            .payload()
            .map_err(fail)?],
        FindFolder::NAME => {
            let mut find = FindFolder::new(parent_folder(args)?)
                .with_shape(args.shape.unwrap_or(Shape::IdOnly))
                .with_additional_fields(args.fields.clone());
            if let Some(traversal) = args.traversal {
                find = find.with_traversal(traversal);
            }
            if let Some(size) = args.page_size {
                find = find.with_page_size(size);
            }
            vec![find.payload(service.version(), args.offset).map_err(fail)?]
        }
        FindItem::NAME => {
            let mut find = FindItem::new(parent_folder(args)?, args.item_type.clone())
                .with_shape(args.shape.unwrap_or(Shape::IdOnly))
                .with_additional_fields(args.fields.clone());
            if let Some(traversal) = args.traversal {
                find = find.with_traversal(traversal);
            }
            if let Some(size) = args.page_size {
                find = find.with_page_size(size);
            }
            if let Some(path) = &args.restriction_file {
                find = find.with_restriction(read_element(path)?);
            }
            vec![find.payload(args.offset)]
        }
        GetItem::NAME => {
            let get = GetItem::new(args.item_type.clone())
                .with_shape(args.shape.unwrap_or(Shape::AllProperties))
                .with_additional_fields(args.fields.clone());
            let ids = item_ids(args)?;
            chunkify(&ids, chunk_size(name, args))
                .map(|chunk| get.payload(chunk))
                .collect()
        }
        DeleteItem::NAME => {
            let delete = DeleteItem::new(args.delete_type);
            let ids = item_ids(args)?;
            chunkify(&ids, chunk_size(name, args))
                .map(|chunk| delete.payload(chunk))
                .collect()
        }
        CreateItem::NAME => {
            let mut create = CreateItem::new(args.item_type.clone());
            if let Some(folder) = folders(args).into_iter().next() {
                create = create.in_folder(folder);
            }
            if let Some(disposition) = args.message_disposition {
                create = create.with_message_disposition(disposition);
            }
            let items = item_bodies(args)?;
            chunkify(&items, chunk_size(name, args))
                .map(|chunk| create.payload(chunk))
                .collect()
        }
        UpdateItem::NAME => {
            let mut update = UpdateItem::new(args.item_type.clone())
                .with_conflict_resolution(args.conflict_resolution);
            if let Some(disposition) = args.message_disposition {
                update = update.with_message_disposition(disposition);
            }
            let changes = item_bodies(args)?;
            chunkify(&changes, chunk_size(name, args))
                .map(|chunk| update.payload(chunk))
                .collect::<soapwire_service::Result<Vec<_>>>()
                .map_err(fail)?
        }
        other => return Err(CliError::usage(format!("no payload builder for {other}"))),
    };
    Ok(payloads)
}

fn chunk_size(name: &str, args: &PayloadArgs) -> usize {
    operations::describe(name, &args.item_type)
        .and_then(|(operation, _)| operation.chunk_size)
        .unwrap_or(usize::MAX)
}

fn folders(args: &PayloadArgs) -> Vec<FolderId> {
    args.folders
        .iter()
        .map(|name| FolderId::distinguished(name.clone()))
        .chain(args.folder_ids.iter().map(|raw| {
            let id = ItemId::parse(raw);
            FolderId::id(id.id, id.changekey)
        }))
        .collect()
}

fn parent_folder(args: &PayloadArgs) -> CliResult<FolderId> {
    let mut folders = folders(args);
    match folders.len() {
        0 => Ok(FolderId::distinguished("msgfolderroot")),
        1 => Ok(folders.remove(0)),
        n => Err(CliError::usage(format!(
            "find operations take one parent folder, got {n}"
        ))),
    }
}

fn item_ids(args: &PayloadArgs) -> CliResult<Vec<ItemId>> {
    if args.ids.is_empty() {
        return Err(CliError::usage("at least one --id is required"));
    }
    Ok(args.ids.iter().map(|raw| ItemId::parse(raw)).collect())
}

fn item_bodies(args: &PayloadArgs) -> CliResult<Vec<Element>> {
    let path = args
        .items_file
        .as_ref()
        .ok_or_else(|| CliError::usage("--items-file is required"))?;
    let root = read_element(path)?;
    if root.children.is_empty() {
        return Err(CliError::usage(format!(
            "{} has no item elements",
            path.display()
        )));
    }
    Ok(root.children)
}
