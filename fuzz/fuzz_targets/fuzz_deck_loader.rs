#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml) = std::str::from_utf8(data) {
        // Any deck that loads must be playable from start to finish.
        if let Ok(loaded) = cybersim::deck::load_deck_str(yaml, Path::new("<fuzz>")) {
            let mut session = cybersim::session::Session::new(loaded.deck);
            let _ = session.start();
            let _ = session.finish_early();
            let outcome = session.take_outcome().expect("finished session has an outcome");
            assert!(outcome.score_percent <= 100);
        }
    }
});
