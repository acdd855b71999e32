#![no_main]

use bumper::classify::Classifier;
use bumper::registry::CommitTypeRegistry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(records) = bumper_git::parse_log(raw) else {
        return;
    };

    let registry = CommitTypeRegistry::builtin();
    let Ok(classifier) = Classifier::new(&registry) else {
        return;
    };
    let count = records.len();
    let commits = classifier.classify_all(records);
    assert!(commits.len() <= count);
});
