#![no_main]

use libfuzzer_sys::fuzz_target;
use cybersim::scoring::sql::LoginAttempt;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let attempt = LoginAttempt::from_input(input);
        let _ = attempt.vulnerable_query();
        let _ = attempt.exploit_succeeded();
    }
});
