use soapwire_service::operations::NAMES;
use soapwire_service::ServerVersion;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("soapwire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: soapwire");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("SOAPWIRE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "rustc: {}",
        option_env!("RUSTC_VERSION").unwrap_or("unknown")
    );
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    let versions: Vec<_> = ServerVersion::ALL
        .iter()
        .map(|v| v.api_version.to_string())
        .collect();
    println!("server_versions: {}", versions.join(", "));
    println!("operations: {}", NAMES.join(", "));
    println!("features: cli=true");

    Ok(SUCCESS)
}
