#![no_main]

use libfuzzer_sys::fuzz_target;
use turnroom_client::protocol::ServerMessage;
use turnroom_client::Session;

// Newline-separated frames, applied in order to one session. Whatever
// arrives, the gate must stay closed outside Playing.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut session = Session::new("FUZZ", 5);
    for line in text.lines() {
        if let Ok(msg) = serde_json::from_str::<ServerMessage>(line) {
            let _ = session.apply(msg);
        }
        let _ = session.snapshot();
        if session.phase() != turnroom_client::Phase::Playing {
            assert!(!session.local_can_act());
        }
    }
});
