#![no_main]

use bumper::changelog::{CHANGELOG_TITLE, render_markdown};
use bumper::types::ChangelogStore;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(store) = serde_json::from_slice::<ChangelogStore>(data) else {
        return;
    };

    let md = render_markdown(&store, "https://example.com/repo/");
    assert!(md.starts_with(CHANGELOG_TITLE));
    assert!(md.ends_with('\n'));
});
