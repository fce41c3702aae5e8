#![no_main]

use echonet_core::services::identification::{manufacturer_of, IdentificationNumber};
use echonet_core::services::instance_list::InstanceList;
use echonet_core::types::PropertyMap;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = InstanceList::decode(data);
    let _ = PropertyMap::decode(data);
    let _ = IdentificationNumber::decode(data);
    let _ = manufacturer_of(data);
});
