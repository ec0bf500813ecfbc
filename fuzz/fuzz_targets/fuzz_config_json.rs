//! Fuzz target: `SystemConfig::from_json`
//!
//! Provisioning files come from outside the device.  Whatever the input,
//! parsing must not panic, and a config it accepts must pass validation
//! and survive the NVS round trip.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use safex::adapters::nvs::NvsAdapter;
use safex::app::ports::ConfigPort;
use safex::config::SystemConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(cfg) = SystemConfig::from_json(text) else {
        return;
    };
    assert!(cfg.validate().is_ok(), "accepted config must validate");

    let nvs = NvsAdapter::new().expect("host NVS");
    nvs.save(&cfg).expect("valid config saves");
    assert_eq!(nvs.load().expect("reload"), cfg);
});
