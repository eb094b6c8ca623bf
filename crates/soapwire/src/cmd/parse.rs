use std::sync::Arc;

use soapwire_envelope::Element;
use soapwire_service::operations::{self, Mode};
use soapwire_service::{Dispatcher, Outcome, Pager, Result as ServiceResult};
use soapwire_transport::{RawResponse, ReplayTransport, Transport};
use tracing::{debug, warn};

use crate::cmd::{build_service, resolve_operation, ParseArgs};
use crate::exit::{io_error, service_error, CliError, CliResult, SUCCESS};
use crate::output::{print_outcomes, OutputFormat};

pub fn run(args: ParseArgs, format: OutputFormat) -> CliResult<i32> {
    let name = resolve_operation(&args.operation)?;
    let (operation, mode) = operations::describe(name, &args.item_type)
        .ok_or_else(|| CliError::usage(format!("unknown operation '{name}'")))?;

    let transport = Arc::new(ReplayTransport::new("file://replay"));
    for path in &args.files {
        let body = std::fs::read(path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err))?;
        let response = RawResponse::new(body);
        transport.push_raw(match &args.encoding {
            Some(label) => response.with_encoding(label.clone()),
            None => response,
        });
    }
    let shared: Arc<dyn Transport> = transport.clone();
    let service = build_service(&args.server, shared)?;
    debug!(operation = name, %mode, files = args.files.len(), "replaying saved responses");

    let request = Element::new(operation.request_name());
    let result: ServiceResult<Vec<Outcome>> = match mode {
        Mode::Paged => Pager::new(&service, &operation, |_| Ok(request.clone()))
            .fetch_all()
            .map(|elements| elements.into_iter().map(Outcome::Item).collect()),
        Mode::Plain | Mode::Chunked => {
            replay_each(&Dispatcher::new(&service, &operation), &request, args.files.len())
        }
    };
    let outcomes = result.map_err(|err| service_error(name, err))?;

    if transport.pending() > 0 {
        warn!(
            operation = name,
            unused = transport.pending(),
            "response files left over after the last page"
        );
    }

    print_outcomes(name, &outcomes, format);
    Ok(SUCCESS)
}

/// Dispatch `request` once per saved response.
fn replay_each(
    dispatcher: &Dispatcher<'_>,
    request: &Element,
    responses: usize,
) -> ServiceResult<Vec<Outcome>> {
    let mut outcomes = Vec::new();
    for _ in 0..responses {
        outcomes.extend(dispatcher.dispatch(request)?);
    }
    Ok(outcomes)
}
