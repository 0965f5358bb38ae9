use kkbridge_frame::{FRAME_SIZE, REPORT_ID};
use kkbridge_link::{DEFAULT_DEBUG_ADDR, DEFAULT_DEVICE_ADDR};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("kkbridge {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: kkbridge");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("KKBRIDGE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("KKBRIDGE_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("frame: {FRAME_SIZE} bytes, report id {REPORT_ID:#04x}");
    println!("emulator: device={DEFAULT_DEVICE_ADDR} debug={DEFAULT_DEBUG_ADDR}");

    Ok(SUCCESS)
}
