//! Truncated and inconsistent programs must fail cleanly, never panic

use rebc::{
    assembler::{assemble, Node},
    evaluate, is_match, try_match, Capture, ExecLimits, MatchError,
};

fn rejects(program: &[u8], input: &[u8]) {
    let outcome = evaluate(program, input, 0, 0, &mut [])
        .unwrap_or_else(|e| panic!("{program:?} on {input:?} errored: {e}"));
    assert!(!outcome.matched, "{program:?} matched {input:?}");
    assert!(!is_match(program, input, &mut []));
}

#[test]
fn test_empty_program() {
    rejects(&[], b"");
    rejects(&[], b"abc");
}

#[test]
fn test_truncated_operands() {
    rejects(&[8], b"a"); // sequence without length
    rejects(&[8, 5, 1], b""); // sequence longer than program
    rejects(&[4], b"a"); // class without length
    rejects(&[4, 5, b'a', b'z'], b"q"); // ranges run past the end
    rejects(&[5, 5, b'a', b'z'], b"Q");
    rejects(&[6], b"x"); // quantifier without bounds
    rejects(&[6, 1], b"x");
    rejects(&[6, 0, 255], b"x"); // quantifier without body
    rejects(&[11], b"a"); // group without index
    rejects(&[11, 0], b"a"); // group without body
    rejects(&[10], b"a"); // lookahead without body
}

#[test]
fn test_alternation_missing_skip_byte() {
    rejects(&[7, b'a'], b"a"); // left matches, skip byte missing
    rejects(&[7, b'a'], b"b"); // right branch missing
    rejects(&[7, b'a', 2], b"b");
    rejects(&[7, b'a', 9, b'b'], b"a"); // skip points past the end
}

#[test]
fn test_truncation_inside_nested_structures() {
    rejects(&[11, 0, 6, 1, 255, 4, 3, b'0'], b"42");
    rejects(&[10, 10, 10, 8, 4, b'a'], b"a");
    rejects(&[7, 8, 9, b'a'], b"a");
}

#[test]
fn test_every_prefix_of_a_valid_program_fails_cleanly() {
    let program = assemble(&Node::Sequence(vec![
        Node::AnchorStart,
        Node::group(0, Node::plus(Node::class(&[(b'0', b'9')]))),
        Node::alt(Node::Literal(b'a'), Node::Literal(b'b')),
        Node::lookahead(Node::Dot),
        Node::optional(Node::inverted_class(&[(b' ', b' ')])),
    ]))
    .unwrap();
    let bytes = program.as_bytes();
    let input = b"12b!x";

    assert!(is_match(bytes, input, &mut [Capture::default()]));

    for len in 0..bytes.len() {
        rejects(&bytes[..len], input);
    }
}

#[test]
fn test_prefixes_of_unwrapped_programs_never_error() {
    let nodes = [
        Node::group(2, Node::star(Node::alt(Node::literals(b"ab"), Node::Dot))),
        Node::repeat(Node::lookahead(Node::class(&[(b'a', b'c')])), 2, Some(5)),
        Node::alt(Node::AnchorWord, Node::group(0, Node::literals(b"xyz"))),
    ];

    for node in &nodes {
        let program = assemble(node).unwrap();
        let bytes = program.as_bytes();
        for len in 0..=bytes.len() {
            for input in [&b""[..], &b"ab"[..], &b"xyz"[..], &b"abcabc"[..]] {
                let mut captures = [Capture::default(); 3];
                let result = evaluate(&bytes[..len], input, 0, 0, &mut captures);
                assert!(result.is_ok(), "{:?} on {input:?}: {result:?}", &bytes[..len]);
            }
        }
    }
}

#[test]
fn test_dangling_class_byte_is_ignored() {
    // Length 2 covers the length byte and one lone byte, which forms no range
    assert!(!is_match(&[4, 2, b'a'], b"a", &mut []));
    assert!(is_match(&[5, 2, b'a'], b"a", &mut []));
}

#[test]
fn test_start_past_program_end() {
    let outcome = evaluate(&[b'a'], b"a", 5, 0, &mut []).unwrap();
    assert!(!outcome.matched);
    assert_eq!(outcome.pc, 1);
}

#[test]
fn test_inconsistent_skip_byte_under_quantifier() {
    // Skip byte says the right branch is two bytes long, it is one
    let program = [6, 1, 1, 7, b'a', 3, b'b', b'c'];

    assert_eq!(
        try_match(&program, b"b", &mut [], ExecLimits::default()),
        Err(MatchError::InconsistentExtent {
            pc: 0,
            expected: 8,
            found: 7,
        })
    );
    assert!(!is_match(&program, b"b", &mut []));

    // The left branch path agrees with the skip byte
    assert_eq!(try_match(&program, b"a", &mut [], ExecLimits::default()), Ok(true));
}
