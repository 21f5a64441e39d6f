#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = toml::from_str::<benchsweep_config::ConfigFile>(s);
        let _ = benchsweep_config::parse_config_file(Path::new("benchsweep.toml"), s);
    }
});
