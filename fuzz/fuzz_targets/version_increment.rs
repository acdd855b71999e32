#![no_main]

use bumper::version::{BumpKind, increment};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(current) = std::str::from_utf8(data) else {
        return;
    };

    for kind in [
        BumpKind::Major,
        BumpKind::Minor,
        BumpKind::Patch,
        BumpKind::Prerelease,
    ] {
        if let Ok(next) = increment(current, kind) {
            assert!(semver::Version::parse(&next).is_ok(), "{current} -> {next}");
        }
    }
});
