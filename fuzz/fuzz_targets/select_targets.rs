//! Query output of any shape must tokenize and filter without panicking, and
//! every selected label must carry the suffix with a non-empty package part.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct SelectInput<'a> {
    output: &'a [u8],
    suffix: String,
}

fuzz_target!(|input: SelectInput<'_>| {
    let tokens = benchsweep_domain::tokenize_query_output(input.output);
    let selected = benchsweep_domain::select_benchmark_targets(&tokens, &input.suffix);

    assert!(selected.len() <= tokens.len());
    for label in &selected {
        assert!(label.as_str().ends_with(&input.suffix));
        assert!(label.as_str().len() > input.suffix.len());
    }
});
