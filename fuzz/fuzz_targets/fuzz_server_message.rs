#![no_main]

use libfuzzer_sys::fuzz_target;
use pivot_stream::{Instant, ReplayTransport, StreamSession, decode_server};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Decoding must never panic, whatever the payload.
    let _ = decode_server(text);

    // Treat each line as one frame of a request.
    let mut session = StreamSession::new(ReplayTransport::default());
    session.connect().expect("replay transport opens");
    session.submit("fuzz", 3).expect("submit");
    let now = Instant::now();
    for line in text.lines().take(64) {
        session.handle_message(line, now);
    }
    let _ = session.drain();

    // Post-conditions: the render model mirrors the working tree.
    let expected = session.tree().map_or(0, |tree| tree.node_count());
    assert_eq!(session.nodes().len(), expected, "node count drifted from tree");
    assert_eq!(
        session.edges().len(),
        expected.saturating_sub(1),
        "edge count must be nodes - 1"
    );
    assert!(
        session.nodes().iter().filter(|n| n.is_newest()).count() <= 1,
        "more than one newest node"
    );
    assert!(session.is_connected(), "decode failures must not disconnect");
});
