#![no_main]

use libfuzzer_sys::fuzz_target;
use turnroom_client::protocol::ServerMessage;

fuzz_target!(|data: &[u8]| {
    let _ = serde_json::from_slice::<ServerMessage>(data);

    if let Ok(s) = std::str::from_utf8(data) {
        let _ = serde_json::from_str::<ServerMessage>(s);
    }
});
