use soapwire_service::{CodeRegistry, Disposition};

use crate::cmd::CodesArgs;
use crate::exit::{CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_codes, OutputFormat};

pub fn run(args: CodesArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = CodeRegistry::builtin();

    if let Some(code) = &args.code {
        let disposition = registry
            .disposition(code)
            .ok_or_else(|| CliError::new(FAILURE, format!("unknown response code '{code}'")))?;
        print_codes(&[(code.as_str(), disposition)], format);
        return Ok(SUCCESS);
    }

    let entries: Vec<_> = registry
        .entries()
        .into_iter()
        .filter(|(_, disposition)| !args.expected || *disposition == Disposition::Expected)
        .collect();
    print_codes(&entries, format);
    Ok(SUCCESS)
}
